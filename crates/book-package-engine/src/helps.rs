//! Help article rendering.
//!
//! Notes and articles are Markdown. The reader shows them as plain text
//! lines and lets the user follow the links they contain.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Render Markdown as plain text: one line per heading, paragraph line and
/// list item, with a blank line between blocks. Link text is kept.
pub fn to_plain_text(markdown: &str) -> String {
    let mut out = PlainText::default();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { .. }) => out.blank(),
            Event::End(TagEnd::Heading(_)) => out.blank(),
            Event::Start(Tag::Paragraph) => {
                if out.lists.is_empty() {
                    out.blank();
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if out.lists.is_empty() {
                    out.blank();
                } else {
                    out.flush();
                }
            }
            Event::Start(Tag::List(start)) => {
                out.flush();
                out.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                out.lists.pop();
                if out.lists.is_empty() {
                    out.blank();
                }
            }
            Event::Start(Tag::Item) => out.start_item(),
            Event::End(TagEnd::Item) => out.flush(),
            Event::Start(Tag::CodeBlock(_)) | Event::End(TagEnd::CodeBlock) => out.blank(),
            Event::Text(text) | Event::Code(text) => out.text(&text),
            Event::SoftBreak => out.current.push(' '),
            Event::HardBreak => out.flush(),
            Event::Rule => out.blank(),
            _ => {}
        }
    }

    out.finish()
}

/// Link destinations in document order.
pub fn links(markdown: &str) -> Vec<String> {
    Parser::new(markdown)
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect()
}

#[derive(Default)]
struct PlainText {
    lines: Vec<String>,
    current: String,
    /// Open lists; `Some(n)` is the next number of an ordered list.
    lists: Vec<Option<u64>>,
}

impl PlainText {
    fn text(&mut self, text: &str) {
        let mut segments = text.split('\n');
        if let Some(first) = segments.next() {
            self.current.push_str(first);
        }
        for segment in segments {
            self.flush();
            self.current.push_str(segment);
        }
    }

    fn start_item(&mut self) {
        self.flush();
        let indent = "  ".repeat(self.lists.len().saturating_sub(1));
        let bullet = match self.lists.last_mut() {
            Some(Some(number)) => {
                let bullet = format!("{number}. ");
                *number += 1;
                bullet
            }
            _ => "- ".to_string(),
        };
        self.current = format!("{indent}{bullet}");
    }

    fn flush(&mut self) {
        let line = std::mem::take(&mut self.current);
        if !line.trim().is_empty() {
            self.lines.push(line.trim_end().to_string());
        }
    }

    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(String::new());
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        while self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn headings_paragraphs_and_lists() {
        let markdown = "# God\n\n## Definition:\n\nThe term [God](../kt/god.md) refers to\nthe eternal being.\n\n* one\n* two\n";

        assert_eq!(
            to_plain_text(markdown),
            "God\n\nDefinition:\n\nThe term God refers to the eternal being.\n\n- one\n- two"
        );
    }

    #[test]
    fn ordered_and_nested_lists() {
        let markdown = "1. first\n2. second\n    * inner\n";

        assert_eq!(to_plain_text(markdown), "1. first\n2. second\n  - inner");
    }

    #[test]
    fn unescaped_note_line_breaks() {
        assert_eq!(to_plain_text("First line  \nSecond line"), "First line\nSecond line");
        assert_eq!(to_plain_text("One.\n\nTwo."), "One.\n\nTwo.");
    }

    #[test]
    fn empty_markdown() {
        assert_eq!(to_plain_text(""), "");
    }

    #[test]
    fn link_destinations_in_order() {
        let markdown = "See [John 3:16](../03/16.md) and [Metaphor](rc://*/ta/man/translate/figs-metaphor).";

        assert_eq!(
            links(markdown),
            vec!["../03/16.md", "rc://*/ta/man/translate/figs-metaphor"]
        );
    }
}
