use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::commands::{CommandEntry, SlashCommand, command_entries, parse_slash_command};

/// Prompt shown while the input is empty; carried from the web client.
const PLACEHOLDER: &str = "Hỏi tớ i :>";

/// Result returned when the user interacts with the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// Single-line input with cursor editing and a slash-command palette.
pub struct Composer {
    content: String,
    /// Byte offset of the cursor within `content`.
    cursor: usize,
    entries: Vec<CommandEntry>,
    filtered: Vec<CommandEntry>,
    palette_open: bool,
    selected: usize,
}

impl Composer {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            entries: command_entries(),
            filtered: Vec::new(),
            palette_open: false,
            selected: 0,
        }
    }

    pub fn palette_open(&self) -> bool {
        self.palette_open
    }

    #[cfg(test)]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if self.palette_open {
                    self.apply_selected();
                    return ComposerResult::None;
                }
                if self.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                let content = std::mem::take(&mut self.content);
                self.cursor = 0;
                self.close_palette();
                if let Some(command) = parse_slash_command(&content) {
                    return ComposerResult::Command(command);
                }
                return ComposerResult::Submitted(content);
            }
            KeyCode::Up if self.palette_open => self.move_selection(-1),
            KeyCode::Down if self.palette_open => self.move_selection(1),
            KeyCode::Esc if self.palette_open => self.close_palette(),
            KeyCode::Tab if self.palette_open => self.apply_selected(),
            KeyCode::Char(c) => {
                self.content.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                self.sync_palette();
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.content.remove(prev);
                    self.cursor = prev;
                    self.sync_palette();
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.content.len() {
                    self.content.remove(self.cursor);
                    self.sync_palette();
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.next_boundary() {
                    self.cursor = next;
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.len(),
            _ => {}
        }

        ComposerResult::None
    }

    /// Byte offset of the character before the cursor, if any.
    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(idx, _)| idx)
    }

    /// Byte offset just past the character under the cursor, if any.
    fn next_boundary(&self) -> Option<usize> {
        self.content[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }

    /// Open, refresh, or close the palette to match the current content.
    fn sync_palette(&mut self) {
        if self.content.starts_with('/') && !self.content.contains(char::is_whitespace) {
            let query = self.content[1..].to_lowercase();
            self.filtered = self
                .entries
                .iter()
                .copied()
                .filter(|entry| entry.keyword.starts_with(&query))
                .collect();
            self.palette_open = !self.filtered.is_empty();
            self.selected = self.selected.min(self.filtered.len().saturating_sub(1));
        } else {
            self.close_palette();
        }
    }

    fn close_palette(&mut self) {
        self.palette_open = false;
        self.filtered.clear();
        self.selected = 0;
    }

    fn move_selection(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let len = self.filtered.len() as isize;
        let next = (self.selected as isize + delta).rem_euclid(len);
        self.selected = next as usize;
    }

    /// Replace the input with the selected palette entry.
    fn apply_selected(&mut self) {
        if let Some(entry) = self.filtered.get(self.selected) {
            self.content = format!("/{} ", entry.keyword);
            self.cursor = self.content.len();
        }
        self.close_palette();
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        f.render_widget(block, area);

        if self.content.is_empty() {
            let placeholder = Paragraph::new(Line::from(Span::styled(
                PLACEHOLDER,
                Style::default().fg(Color::DarkGray),
            )));
            f.render_widget(placeholder, inner);
            f.set_cursor(inner.x, inner.y);
        } else {
            let before_cursor = UnicodeWidthStr::width(&self.content[..self.cursor]) as u16;
            let visible = inner.width.saturating_sub(1);
            let scroll = before_cursor.saturating_sub(visible);
            let input = Paragraph::new(self.content.as_str()).scroll((0, scroll));
            f.render_widget(input, inner);
            f.set_cursor(inner.x + before_cursor - scroll, inner.y);
        }

        if self.palette_open && !self.filtered.is_empty() {
            self.render_palette(f, area);
        }
    }

    fn render_palette(&self, f: &mut Frame, composer_area: Rect) {
        let height = (self.filtered.len() as u16).min(5) + 2;
        let palette_area = Rect {
            x: composer_area.x,
            y: composer_area.y.saturating_sub(height),
            width: composer_area.width,
            height,
        };

        f.render_widget(Clear, palette_area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().fg(Color::Blue));
        let inner = block.inner(palette_area);
        f.render_widget(block, palette_area);

        let lines: Vec<Line> = self
            .filtered
            .iter()
            .enumerate()
            .take(inner.height as usize)
            .map(|(index, entry)| {
                let style = if index == self.selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" — ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ])
            })
            .collect();

        f.render_widget(Paragraph::new(lines), inner);
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}
