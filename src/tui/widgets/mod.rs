//! Reusable TUI widgets.

pub mod chat;
pub mod header;
pub mod input;
pub mod setup;
pub mod spinner;

pub use chat::ChatPanel;
pub use header::Header;
pub use input::{calculate_scroll_offset, column_at, InputBar};
pub use setup::SetupPanel;
pub use spinner::Spinner;
