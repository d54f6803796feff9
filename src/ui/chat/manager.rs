use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};
use tokio::sync::mpsc;

use super::commands::{SlashCommand, get_help_text};
use super::composer::{Composer, ComposerResult};
use super::pending::PendingIndicator;
use super::transcript::TranscriptView;
use crate::api::{BackendClient, BotReply};
use crate::events::Message;

/// Actions the chat view asks the event loop to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    None,
    Exit,
}

/// Coordinates the transcript, composer, and pending row, and owns the
/// conversation state for the lifetime of the session.
pub struct ChatView {
    messages: Vec<Message>,
    composer: Composer,
    transcript: TranscriptView,
    indicator: PendingIndicator,
    pending: bool,
    client: BackendClient,
    reply_tx: mpsc::UnboundedSender<BotReply>,
    reply_rx: mpsc::UnboundedReceiver<BotReply>,
}

impl ChatView {
    pub fn new(client: BackendClient, expand_chunks: bool) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            messages: Vec::new(),
            composer: Composer::new(),
            transcript: TranscriptView::new(expand_chunks),
            indicator: PendingIndicator::new(),
            pending: false,
            client,
            reply_tx,
            reply_rx,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ChatAction {
        if key.kind != KeyEventKind::Press {
            return ChatAction::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return ChatAction::Exit,
                KeyCode::Char('e') => {
                    self.transcript.toggle_chunks();
                    return ChatAction::None;
                }
                _ => {}
            }
        }

        // While the palette is open the composer owns Up/Down/Esc.
        if !self.composer.palette_open() {
            match key.code {
                KeyCode::Up => {
                    self.transcript.scroll_up(1);
                    return ChatAction::None;
                }
                KeyCode::Down => {
                    self.transcript.scroll_down(1);
                    return ChatAction::None;
                }
                KeyCode::PageUp => {
                    self.transcript.scroll_up(10);
                    return ChatAction::None;
                }
                KeyCode::PageDown => {
                    self.transcript.scroll_down(10);
                    return ChatAction::None;
                }
                KeyCode::End => {
                    self.transcript.scroll_to_bottom();
                    return ChatAction::None;
                }
                KeyCode::Esc => return ChatAction::Exit,
                _ => {}
            }
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(prompt) => {
                self.submit(prompt);
                ChatAction::None
            }
            ComposerResult::Command(command) => self.run_command(command),
            ComposerResult::None => ChatAction::None,
        }
    }

    /// One turn: append the user message, mark pending, fire one request.
    /// A blank prompt appends nothing and issues nothing.
    ///
    /// The composer stays usable while pending; a second submit overlaps a
    /// second request, and replies append in resolution order.
    pub fn submit(&mut self, prompt: String) {
        if prompt.trim().is_empty() {
            return;
        }

        self.messages.push(Message::user(prompt.clone()));
        self.transcript.scroll_to_bottom();
        self.pending = true;

        let client = self.client.clone();
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let outcome = client.ask(&prompt).await;
            // Success and failure both become exactly one reply.
            let _ = reply_tx.send(BotReply::from_outcome(outcome));
        });
    }

    /// Drain finished exchanges into the transcript; called from the main
    /// loop on every pass.
    pub fn poll_replies(&mut self) {
        while let Ok(reply) = self.reply_rx.try_recv() {
            self.messages.push(reply.into_message());
            self.pending = false;
            self.transcript.scroll_to_bottom();
        }
    }

    /// Advance animation state; driven by the UI tick.
    pub fn tick(&mut self) {
        if self.pending {
            self.indicator.tick();
        }
    }

    fn run_command(&mut self, command: SlashCommand) -> ChatAction {
        match command {
            SlashCommand::Chunks => {
                self.transcript.toggle_chunks();
                ChatAction::None
            }
            SlashCommand::Help => {
                self.messages
                    .push(Message::bot(get_help_text(), String::new(), None));
                self.transcript.scroll_to_bottom();
                ChatAction::None
            }
            SlashCommand::Bye => ChatAction::Exit,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Min(1),    // Transcript
                    Constraint::Length(1), // Pending row
                    Constraint::Length(3), // Composer
                ]
                .as_ref(),
            )
            .split(area);

        self.transcript.render(f, chunks[0], &self.messages);
        self.indicator.render(f, chunks[1], self.pending);
        self.composer.render(f, chunks[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::Sender;

    fn chat() -> ChatView {
        ChatView::new(BackendClient::new(&Config::default()), false)
    }

    fn press(view: &mut ChatView, code: KeyCode) -> ChatAction {
        view.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn blank_submit_appends_nothing() {
        let mut view = chat();
        view.submit("   ".to_string());
        assert!(view.messages().is_empty());
        assert!(!view.is_pending());
    }

    #[tokio::test]
    async fn submit_appends_the_user_message_before_resolution() {
        let mut view = chat();
        view.submit("X".to_string());
        assert_eq!(view.messages().len(), 1);
        assert_eq!(view.messages()[0].sender, Sender::User);
        assert_eq!(view.messages()[0].text, "X");
        assert!(view.is_pending());
    }

    #[tokio::test]
    async fn typed_input_flows_through_the_composer() {
        let mut view = chat();
        press(&mut view, KeyCode::Char('h'));
        press(&mut view, KeyCode::Char('i'));
        press(&mut view, KeyCode::Enter);
        assert_eq!(view.messages().len(), 1);
        assert_eq!(view.messages()[0].text, "hi");
        assert!(view.is_pending());
    }

    #[tokio::test]
    async fn escape_and_bye_exit() {
        let mut view = chat();
        assert_eq!(press(&mut view, KeyCode::Esc), ChatAction::Exit);
        assert_eq!(view.run_command(SlashCommand::Bye), ChatAction::Exit);
    }

    #[tokio::test]
    async fn help_appends_a_bot_message_without_a_request() {
        let mut view = chat();
        let action = view.run_command(SlashCommand::Help);
        assert_eq!(action, ChatAction::None);
        assert_eq!(view.messages().len(), 1);
        assert_eq!(view.messages()[0].sender, Sender::Bot);
        assert!(!view.is_pending());
    }
}
