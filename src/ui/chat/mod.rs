//! Chat screen components: transcript, composer, pending row, coordinator

pub mod commands;
pub mod composer;
pub mod manager;
pub mod pending;
pub mod transcript;

pub use commands::{SlashCommand, get_help_text};
pub use composer::Composer;
pub use manager::{ChatAction, ChatView};
pub use pending::PendingIndicator;
pub use transcript::TranscriptView;
