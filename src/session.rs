//! Per-session state: chat readiness and the transcript.
//!
//! One `Session` is created when the app starts and dropped when it exits.
//! Nothing here is persisted.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// The assistant greeting the transcript is seeded and reset with.
pub const GREETING: &str = "How can I help you?";

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// A single chat transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub content: String,
}

impl TranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered chat history shown to the user.
///
/// Append-only apart from [`Transcript::clear`], which resets it to the
/// single seeded greeting. Once constructed it always holds at least one
/// entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Creates a transcript seeded with the assistant greeting.
    pub fn new() -> Self {
        Self {
            entries: vec![TranscriptEntry::assistant(GREETING)],
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Resets the transcript to the single greeting entry.
    pub fn clear(&mut self) {
        self.entries = vec![TranscriptEntry::assistant(GREETING)];
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// Session context: readiness latch plus the transcript.
#[derive(Debug, Clone, Default)]
pub struct Session {
    transcript: Transcript,
    ready: bool,
}

impl Session {
    /// Creates a fresh session with a seeded transcript and readiness off.
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            ready: false,
        }
    }

    /// Whether chat has been started for this session.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Marks the session ready to chat, gated on a non-empty API key.
    ///
    /// Idempotent: once ready, further calls succeed and readiness never
    /// reverts for the lifetime of the session.
    pub fn start(&mut self, api_key: &str) -> Result<()> {
        if api_key.trim().is_empty() {
            return Err(AppError::config("Please add your Groq API key."));
        }
        self.ready = true;
        Ok(())
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Resets the transcript to the greeting. Readiness is untouched.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Records the user's question. Called before the agent is invoked, so
    /// the question is visible in the transcript even if the turn fails.
    pub fn begin_turn(&mut self, question: impl Into<String>) {
        self.transcript.push(TranscriptEntry::user(question));
    }

    /// Records the turn outcome: the assistant's answer on success, nothing
    /// on failure (the error is shown inline, outside the transcript).
    pub fn complete_turn(&mut self, outcome: &Result<String>) {
        if let Ok(answer) = outcome {
            self.transcript.push(TranscriptEntry::assistant(answer));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transcript_seeded_with_greeting() {
        let session = Session::new();
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(
            session.transcript().entries()[0],
            TranscriptEntry::assistant(GREETING)
        );
    }

    #[test]
    fn test_start_requires_api_key() {
        let mut session = Session::new();
        let err = session.start("").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(!session.is_ready());

        session.start("gsk_test").unwrap();
        assert!(session.is_ready());
    }

    #[test]
    fn test_readiness_is_sticky() {
        let mut session = Session::new();
        session.start("gsk_test").unwrap();
        session.start("gsk_test").unwrap();
        assert!(session.is_ready());
    }

    #[test]
    fn test_successful_turn_appends_both_entries() {
        let mut session = Session::new();
        session.begin_turn("How many users are there?");
        session.complete_turn(&Ok("There are 42 users.".to_string()));

        let entries = session.transcript().entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], TranscriptEntry::user("How many users are there?"));
        assert_eq!(
            entries[2],
            TranscriptEntry::assistant("There are 42 users.")
        );
    }

    #[test]
    fn test_failed_turn_appends_user_only() {
        let mut session = Session::new();
        session.begin_turn("How many users are there?");
        session.complete_turn(&Err(AppError::query("no such table: users")));

        let entries = session.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].speaker, Speaker::User);
    }

    #[test]
    fn test_clear_resets_to_single_greeting() {
        let mut session = Session::new();
        session.begin_turn("first question");
        session.complete_turn(&Ok("first answer".to_string()));
        session.begin_turn("second question");

        session.clear();

        assert_eq!(session.transcript().len(), 1);
        assert_eq!(
            session.transcript().entries()[0],
            TranscriptEntry::assistant(GREETING)
        );
    }

    #[test]
    fn test_clear_preserves_readiness() {
        let mut session = Session::new();
        session.start("gsk_test").unwrap();
        session.clear();
        assert!(session.is_ready());
    }
}
