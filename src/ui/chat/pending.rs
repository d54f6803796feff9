use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Text shown while a request is outstanding; carried from the web client.
const THINKING: &str = "⏳ em đang nghĩ... đợi chút ạ";

const SPINNER_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// One-row spinner shown between the transcript and the composer while a
/// request is outstanding.
#[derive(Debug, Default)]
pub struct PendingIndicator {
    frame: usize,
}

impl PendingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the spinner one frame; driven by the UI tick.
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn render(&self, f: &mut Frame, area: Rect, pending: bool) {
        if !pending {
            return;
        }

        let spinner = SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()];
        let line = Line::from(vec![
            Span::styled(spinner, Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::styled(THINKING, Style::default().fg(Color::DarkGray)),
        ]);

        f.render_widget(Paragraph::new(line), area);
    }
}
