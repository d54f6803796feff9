use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
/// Commands act on the client only; none of them issues a request or appends
/// a user message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Expand or collapse the chunk panels under bot answers
    Chunks,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.keyword(),
            description: command.description(),
        })
        .collect()
}

impl SlashCommand {
    /// User-visible description shown in help and the palette.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Chunks => "expand or collapse the supporting chunk panels",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn keyword(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    if !input.starts_with('/') {
        return None;
    }

    let head = input[1..].split_whitespace().next()?;

    SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "c" => Some(SlashCommand::Chunks),
            "h" => Some(SlashCommand::Help),
            _ => None,
        })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for entry in command_entries() {
        help.push_str(&format!("- `/{}` {}\n", entry.keyword, entry.description));
    }

    help.push_str("\nAliases: `/q` for `/bye`, `/c` for `/chunks`, `/h` for `/help`.\n");
    help.push_str("Ctrl+E also toggles the chunk panels.\n");

    help
}
