//! Markdown-to-terminal rendering for bot answers and chunk excerpts.
//!
//! Answers come back as markdown with TeX math (`$...$`, `$$...$$`). This
//! module flattens that into styled [`Line`]s; wrapping to the viewport
//! width happens later, in the transcript.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Render markdown into styled terminal lines. `base` is the style for
/// ordinary prose; block constructs layer their own styles on top.
pub fn render(source: &str, base: Style) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_MATH);

    let mut renderer = Renderer::new(base);
    for event in Parser::new_ext(source, options) {
        renderer.event(event);
    }
    renderer.finish()
}

fn code_style() -> Style {
    Style::default()
        .fg(Color::Rgb(209, 154, 102))
        .add_modifier(Modifier::BOLD)
}

fn math_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::ITALIC)
}

fn marker_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

struct Renderer {
    base: Style,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    list_stack: Vec<Option<u64>>,
    link_dest: Vec<String>,
    quote_depth: usize,
    in_code_block: bool,
    pending_blank: bool,
}

impl Renderer {
    fn new(base: Style) -> Self {
        Self {
            base,
            lines: Vec::new(),
            spans: Vec::new(),
            styles: Vec::new(),
            list_stack: Vec::new(),
            link_dest: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            pending_blank: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.push_code_text(&text);
                } else {
                    self.push_text(&text);
                }
            }
            Event::Code(text) => {
                self.spans.push(Span::styled(text.to_string(), code_style()));
            }
            Event::InlineMath(math) => {
                self.spans.push(Span::styled(math.to_string(), math_style()));
            }
            Event::DisplayMath(math) => {
                self.flush_line();
                self.open_block();
                for part in math.trim().split('\n') {
                    self.lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::styled(part.trim_end().to_string(), math_style()),
                    ]));
                }
                self.pending_blank = true;
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.open_block();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(24), marker_style())));
                self.pending_blank = true;
            }
            Event::Html(text) | Event::InlineHtml(text) => {
                // Raw HTML is passed through untouched, like the answer text
                // it came embedded in.
                self.push_text(&text);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => self.open_block(),
            Tag::Heading { level, .. } => {
                self.open_block();
                self.styles.push(heading_style(self.base, level));
            }
            Tag::BlockQuote(_) => {
                self.open_block();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.open_block();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    self.open_block();
                }
                self.list_stack.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
                let marker = match self.list_stack.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{}. ", number);
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.spans
                    .push(Span::styled(format!("{indent}{marker}"), self.base));
            }
            Tag::Emphasis => {
                let style = self.style().add_modifier(Modifier::ITALIC);
                self.styles.push(style);
            }
            Tag::Strong => {
                let style = self.style().add_modifier(Modifier::BOLD);
                self.styles.push(style);
            }
            Tag::Strikethrough => {
                let style = self.style().add_modifier(Modifier::CROSSED_OUT);
                self.styles.push(style);
            }
            Tag::Link { dest_url, .. } => {
                self.link_dest.push(dest_url.to_string());
                let style = self
                    .style()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED);
                self.styles.push(style);
            }
            Tag::Image { dest_url, .. } => {
                self.link_dest.push(dest_url.to_string());
                self.styles.push(self.style().add_modifier(Modifier::DIM));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_line();
                self.pending_blank = true;
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.styles.pop();
                self.pending_blank = true;
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pending_blank = true;
            }
            TagEnd::CodeBlock => {
                if !self.spans.is_empty() {
                    self.flush_code_line();
                }
                self.in_code_block = false;
                self.pending_blank = true;
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.pending_blank = true;
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(dest) = self.link_dest.pop() {
                    if !dest.is_empty() {
                        self.spans
                            .push(Span::styled(format!(" ({dest})"), marker_style()));
                    }
                }
            }
            TagEnd::Image => {
                self.styles.pop();
                self.link_dest.pop();
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let style = self.style();
        self.spans.push(Span::styled(text.to_string(), style));
    }

    /// Code block text arrives with embedded newlines; split it into one
    /// rendered line per source line, keeping interior blank lines.
    fn push_code_text(&mut self, text: &str) {
        let mut first = true;
        for part in text.split('\n') {
            if !first {
                self.flush_code_line();
            }
            first = false;
            if !part.is_empty() {
                self.spans.push(Span::styled(part.to_string(), code_style()));
            }
        }
    }

    fn flush_line(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let mut all = Vec::new();
        if self.quote_depth > 0 {
            all.push(Span::styled(
                "▌ ".repeat(self.quote_depth),
                marker_style(),
            ));
        }
        all.append(&mut self.spans);
        self.lines.push(Line::from(all));
    }

    fn flush_code_line(&mut self) {
        let mut all = vec![Span::styled("▎ ".to_string(), marker_style())];
        all.append(&mut self.spans);
        self.lines.push(Line::from(all));
    }

    fn open_block(&mut self) {
        if self.pending_blank && !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.pending_blank = false;
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        self.lines
    }
}

fn heading_style(base: Style, level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 | HeadingLevel::H2 => base
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::UNDERLINED),
        _ => base.add_modifier(Modifier::BOLD),
    }
}
