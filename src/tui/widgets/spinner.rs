//! Spinner widget for the TUI.
//!
//! Animated indicator shown while the agent is working.

use std::time::Instant;

/// Braille spinner frames.
const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Animation speed in milliseconds per frame.
const FRAME_DURATION_MS: u128 = 100;

/// Spinner state for the working indicator.
#[derive(Debug, Clone)]
pub struct Spinner {
    /// When the spinner started.
    start_time: Instant,
    /// Label to display with the spinner.
    label: String,
}

impl Spinner {
    /// Creates a new spinner with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            label: label.into(),
        }
    }

    /// Spinner shown while the agent answers a question.
    pub fn thinking() -> Self {
        Self::new("Thinking")
    }

    /// Spinner shown while connecting to the database.
    pub fn connecting() -> Self {
        Self::new("Connecting")
    }

    /// Returns the current frame of the animation.
    pub fn frame(&self) -> &'static str {
        let elapsed_ms = self.start_time.elapsed().as_millis();
        let frame_index = (elapsed_ms / FRAME_DURATION_MS) as usize;
        BRAILLE_FRAMES[frame_index % BRAILLE_FRAMES.len()]
    }

    /// Returns the display string for the spinner.
    pub fn display(&self) -> String {
        format!("{} {}", self.frame(), self.label)
    }

    /// Returns the label.
    pub fn label(&self) -> &str {
        &self.label
    }
}
