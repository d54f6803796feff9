use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::events::{Message, Sender};
use crate::markdown;

/// Scrollable, bottom-anchored view over the conversation. Messages live in
/// the chat view; this component only owns presentation state.
pub struct TranscriptView {
    /// Display rows between the bottom edge and the viewport; 0 means stuck
    /// to the newest message.
    offset_from_bottom: usize,
    chunks_expanded: bool,
}

impl TranscriptView {
    pub fn new(chunks_expanded: bool) -> Self {
        Self {
            offset_from_bottom: 0,
            chunks_expanded,
        }
    }

    pub fn toggle_chunks(&mut self) {
        self.chunks_expanded = !self.chunks_expanded;
    }

    pub fn scroll_up(&mut self, rows: usize) {
        // Clamped against the line count at render time.
        self.offset_from_bottom = self.offset_from_bottom.saturating_add(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.offset_from_bottom = self.offset_from_bottom.saturating_sub(rows);
    }

    /// Snap back to the newest message. Called for every transcript change.
    pub fn scroll_to_bottom(&mut self) {
        self.offset_from_bottom = 0;
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, messages: &[Message]) {
        let block = Block::default().borders(Borders::ALL).title("StudyBuddy");
        let inner = block.inner(area);
        f.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if messages.is_empty() {
            f.render_widget(Paragraph::new(welcome_lines()), inner);
            return;
        }

        let lines = self.build_lines(messages, inner.width as usize);
        let height = inner.height as usize;
        let max_offset = lines.len().saturating_sub(height);
        self.offset_from_bottom = self.offset_from_bottom.min(max_offset);

        let end = lines.len() - self.offset_from_bottom;
        let start = end.saturating_sub(height);
        let visible: Vec<Line> = lines[start..end].to_vec();
        f.render_widget(Paragraph::new(visible), inner);
    }

    /// Flatten messages into display rows, pre-wrapped to `width` so the
    /// bottom-anchored slice is exact.
    fn build_lines(&self, messages: &[Message], width: usize) -> Vec<Line<'static>> {
        let body_width = width.saturating_sub(2).max(8);
        let mut lines: Vec<Line<'static>> = Vec::new();

        for message in messages {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(header_line(message));

            match message.sender {
                Sender::User => {
                    for wrapped in textwrap::wrap(&message.text, body_width) {
                        lines.push(Line::from(vec![
                            Span::raw("  "),
                            Span::styled(wrapped.into_owned(), user_style()),
                        ]));
                    }
                }
                Sender::Bot => {
                    for line in markdown::render(&message.text, bot_style()) {
                        for wrapped in wrap_spans(&line, body_width) {
                            lines.push(indent(wrapped, "  "));
                        }
                    }
                    if message.has_chunks() {
                        lines.push(Line::default());
                        lines.push(self.chunk_title_line(message));
                        if self.chunks_expanded {
                            for line in markdown::render(&message.chunks, chunk_style()) {
                                for wrapped in wrap_spans(&line, body_width.saturating_sub(2)) {
                                    lines.push(indent(wrapped, "    "));
                                }
                            }
                        }
                    }
                }
            }
        }

        lines
    }

    fn chunk_title_line(&self, message: &Message) -> Line<'static> {
        let marker = if self.chunks_expanded { "▾" } else { "▸" };
        let title = match message.total_chunks {
            Some(count) => format!("{marker} 📚 Relevant Chunks ({count})"),
            None => format!("{marker} 📚 Relevant Chunks"),
        };
        Line::from(vec![
            Span::raw("  "),
            Span::styled(title, Style::default().fg(Color::Yellow)),
        ])
    }
}

fn user_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn bot_style() -> Style {
    Style::default().fg(Color::Green)
}

fn chunk_style() -> Style {
    Style::default().fg(Color::Gray)
}

fn header_line(message: &Message) -> Line<'static> {
    let icon = match message.sender {
        Sender::User => "👤",
        Sender::Bot => "🤖",
    };
    let header = format!(
        "{} {} {}",
        icon,
        message.timestamp.format("%H:%M"),
        "─".repeat(16)
    );
    Line::from(Span::styled(header, Style::default().fg(Color::DarkGray)))
}

fn welcome_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            "A Vietnamese-friendly RAG-based teaching assistant 🤖",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(Span::styled(
            "💡 Tip: Ask me to explain, summarize, or calculate!",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Press Enter to send. Type / for commands.",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn indent(line: Line<'static>, pad: &str) -> Line<'static> {
    let mut spans = vec![Span::raw(pad.to_string())];
    spans.extend(line.spans);
    Line::from(spans)
}

/// Greedy, style-preserving word wrap for a pre-styled line. Tokens wider
/// than the viewport are hard-split at character boundaries.
fn wrap_spans(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line.clone()];
    }
    let total: usize = line
        .spans
        .iter()
        .map(|s| UnicodeWidthStr::width(s.content.as_ref()))
        .sum();
    if total <= width {
        return vec![line.clone()];
    }

    let mut out: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;

    for span in &line.spans {
        for token in split_tokens(span.content.as_ref()) {
            let mut token = token.to_string();
            let mut token_width = UnicodeWidthStr::width(token.as_str());

            if current_width + token_width > width && current_width > 0 {
                out.push(flush_trimmed(&mut current));
                current_width = 0;
                if token.trim().is_empty() {
                    // The separator that forced the break is dropped.
                    continue;
                }
            }

            while token_width > width {
                let (head, tail) = split_at_width(&token, width);
                out.push(Line::from(Span::styled(head, span.style)));
                token = tail;
                token_width = UnicodeWidthStr::width(token.as_str());
            }

            if !token.is_empty() {
                current_width += token_width;
                current.push(Span::styled(token, span.style));
            }
        }
    }

    if !current.is_empty() {
        out.push(Line::from(current));
    }
    if out.is_empty() {
        out.push(Line::default());
    }
    out
}

/// Take the pending spans as a line, dropping trailing whitespace spans left
/// over from the separator before a break.
fn flush_trimmed(current: &mut Vec<Span<'static>>) -> Line<'static> {
    while current
        .last()
        .map_or(false, |span| span.content.trim().is_empty())
    {
        current.pop();
    }
    Line::from(std::mem::take(current))
}

/// Split into alternating runs of spaces and non-spaces, keeping both.
fn split_tokens(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let is_space = c == ' ';
        match in_space {
            None => in_space = Some(is_space),
            Some(prev) if prev != is_space => {
                parts.push(&text[start..i]);
                start = i;
                in_space = Some(is_space);
            }
            _ => {}
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

fn split_at_width(text: &str, width: usize) -> (String, String) {
    let mut used = 0;
    for (i, c) in text.char_indices() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + char_width > width {
            return (text[..i].to_string(), text[i..].to_string());
        }
        used += char_width;
    }
    (text.to_string(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Modifier;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn wrap_keeps_short_lines_intact() {
        let line = Line::from(Span::raw("short"));
        let wrapped = wrap_spans(&line, 20);
        assert_eq!(wrapped.len(), 1);
        assert_eq!(text_of(&wrapped[0]), "short");
    }

    #[test]
    fn wrap_breaks_at_word_boundaries() {
        let line = Line::from(Span::raw("one two three four"));
        let wrapped = wrap_spans(&line, 9);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["one two", "three", "four"]);
    }

    #[test]
    fn wrap_preserves_span_styles() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::raw("plain words "),
            Span::styled("bold words here", bold),
        ]);
        for out in wrap_spans(&line, 12) {
            for span in &out.spans {
                if span.content.contains("bold") || span.content.contains("here") {
                    assert!(span.style.add_modifier.contains(Modifier::BOLD));
                }
            }
        }
    }

    #[test]
    fn wrap_hard_splits_oversized_tokens() {
        let line = Line::from(Span::raw("abcdefghij"));
        let wrapped = wrap_spans(&line, 4);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn transcript_lines_follow_message_order() {
        let view = TranscriptView::new(false);
        let messages = vec![
            Message::user("câu hỏi".to_string()),
            Message::bot("trả lời".to_string(), String::new(), None),
        ];
        let lines = view.build_lines(&messages, 40);
        let joined: Vec<String> = lines.iter().map(text_of).collect();

        let question = joined.iter().position(|l| l.contains("câu hỏi")).unwrap();
        let answer = joined.iter().position(|l| l.contains("trả lời")).unwrap();
        assert!(question < answer);
    }

    #[test]
    fn collapsed_chunks_show_only_the_title() {
        let view = TranscriptView::new(false);
        let messages = vec![Message::bot(
            "answer".to_string(),
            "chunk body text".to_string(),
            Some(4),
        )];
        let lines = view.build_lines(&messages, 40);
        let joined: Vec<String> = lines.iter().map(text_of).collect();

        assert!(joined.iter().any(|l| l.contains("Relevant Chunks (4)")));
        assert!(!joined.iter().any(|l| l.contains("chunk body text")));
    }

    #[test]
    fn expanded_chunks_show_the_body() {
        let view = TranscriptView::new(true);
        let messages = vec![Message::bot(
            "answer".to_string(),
            "chunk body text".to_string(),
            None,
        )];
        let lines = view.build_lines(&messages, 40);
        let joined: Vec<String> = lines.iter().map(text_of).collect();

        assert!(joined.iter().any(|l| l.contains("chunk body text")));
    }
}
