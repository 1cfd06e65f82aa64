//! Presentation of advice markdown
//!
//! Converts the advisor's markdown into UI-ready segments and into HTML.
//! Raw HTML in the model output is escaped, and script links are neutralized.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;

/// One renderable block of advice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdviceSegment {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    ListItem {
        /// Number for ordered lists
        number: Option<u64>,
        /// Nesting, zero for top level
        depth: usize,
        text: String,
    },
    Code {
        language: Option<String>,
        text: String,
    },
    Quote {
        text: String,
    },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Rule,
}

/// Advice ready for any client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedAdvice {
    pub markdown: String,
    pub html: String,
    pub segments: Vec<AdviceSegment>,
}

impl RenderedAdvice {
    pub fn from_markdown(markdown: &str) -> Self {
        Self {
            markdown: markdown.to_string(),
            html: render_html(markdown),
            segments: to_segments(markdown),
        }
    }
}

fn parser(markdown: &str) -> Parser<'_> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    Parser::new_ext(markdown, options)
}

fn is_unsafe_url(url: &str) -> bool {
    let url = url.trim().to_ascii_lowercase();
    ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Markdown to HTML, with raw HTML turned into escaped text
pub fn render_html(markdown: &str) -> String {
    let events = parser(markdown).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if is_unsafe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if is_unsafe_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        other => other,
    });

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, events);
    output
}

/// Markdown to segments
pub fn to_segments(markdown: &str) -> Vec<AdviceSegment> {
    let mut builder = SegmentBuilder::default();
    for event in parser(markdown) {
        builder.handle(event);
    }
    builder.finish()
}

#[derive(Debug, Clone, Copy)]
struct PendingItem {
    number: Option<u64>,
    depth: usize,
}

#[derive(Default)]
struct PendingTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
}

#[derive(Default)]
struct SegmentBuilder {
    segments: Vec<AdviceSegment>,
    text: String,
    heading: Option<u8>,
    code_language: Option<Option<String>>,
    /// Next number of each open list, `None` for bullet lists
    lists: Vec<Option<u64>>,
    item: Option<PendingItem>,
    quote_depth: usize,
    table: Option<PendingTable>,
}

impl SegmentBuilder {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::Code(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.text.push_str(&text)
            }
            Event::SoftBreak => self.text.push(' '),
            Event::HardBreak => self.text.push('\n'),
            Event::Rule => {
                self.flush_loose();
                self.segments.push(AdviceSegment::Rule);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_loose();
                self.heading = Some(level as u8);
            }
            Tag::Paragraph => {
                if self.item.is_none() {
                    self.flush_loose();
                } else if !self.text.is_empty() {
                    self.text.push(' ');
                }
            }
            Tag::CodeBlock(kind) => {
                self.flush_loose();
                self.code_language = Some(match kind {
                    CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                        Some(lang.trim().to_string())
                    }
                    _ => None,
                });
            }
            Tag::List(start) => {
                // A nested list ends the text of its parent item
                if let Some(item) = self.item.take() {
                    self.push_item(item);
                }
                self.flush_loose();
                self.lists.push(start);
            }
            Tag::Item => {
                let number = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let current = *next;
                        *next += 1;
                        Some(current)
                    }
                    _ => None,
                };
                self.text.clear();
                self.item = Some(PendingItem {
                    number,
                    depth: self.lists.len().saturating_sub(1),
                });
            }
            Tag::BlockQuote => {
                self.flush_loose();
                self.quote_depth += 1;
            }
            Tag::Table(_) => {
                self.flush_loose();
                self.table = Some(PendingTable::default());
            }
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            Tag::TableCell => self.text.clear(),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                let level = self.heading.take().unwrap_or(1);
                let text = self.take_text();
                if !text.is_empty() {
                    self.segments.push(AdviceSegment::Heading { level, text });
                }
            }
            TagEnd::Paragraph => {
                if self.item.is_none() {
                    self.flush_loose();
                }
            }
            TagEnd::CodeBlock => {
                let language = self.code_language.take().flatten();
                let text = std::mem::take(&mut self.text);
                self.segments.push(AdviceSegment::Code {
                    language,
                    text: text.trim_end_matches('\n').to_string(),
                });
            }
            TagEnd::Item => {
                if let Some(item) = self.item.take() {
                    self.push_item(item);
                }
                self.text.clear();
            }
            TagEnd::List(_) => {
                self.lists.pop();
            }
            TagEnd::BlockQuote => {
                self.flush_loose();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::TableCell => {
                let cell = self.take_text();
                if let Some(table) = self.table.as_mut() {
                    table.row.push(cell);
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.header = std::mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.segments.push(AdviceSegment::Table {
                        header: table.header,
                        rows: table.rows,
                    });
                }
            }
            _ => {}
        }
    }

    fn take_text(&mut self) -> String {
        std::mem::take(&mut self.text).trim().to_string()
    }

    fn push_item(&mut self, item: PendingItem) {
        let text = self.take_text();
        if !text.is_empty() {
            self.segments.push(AdviceSegment::ListItem {
                number: item.number,
                depth: item.depth,
                text,
            });
        }
    }

    /// Emit text that is not part of a heading, item or code block
    fn flush_loose(&mut self) {
        let text = self.take_text();
        if text.is_empty() {
            return;
        }
        if self.quote_depth > 0 {
            self.segments.push(AdviceSegment::Quote { text });
        } else {
            self.segments.push(AdviceSegment::Paragraph { text });
        }
    }

    fn finish(mut self) -> Vec<AdviceSegment> {
        if let Some(item) = self.item.take() {
            self.push_item(item);
        }
        self.flush_loose();
        self.segments
    }
}
