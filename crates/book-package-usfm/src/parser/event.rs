//! # Parser Events
//!
//! The grammar does not build verse trees directly. It emits a flat
//! sequence of events and the [`Sink`](super::sink::Sink) assembles them:
//!
//! ```text
//! Chapter("1")
//! Verse("1")
//! MilestoneStart(zaln, {content: "בָּרָא"})   ← Sink pushes a frame
//!   Word("created")                          ← goes into the open frame
//! MilestoneEnd(zaln)                         ← Sink pops the frame
//! Text(", ")
//! ```
//!
//! Keeping balance checks in the Sink means grammar rules stay small: they
//! only classify what is in front of them, and every unbalanced or unclosed
//! construct is reported from one place.

use crate::attributes::Attributes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A book-level marker with the rest of its line.
    Header { tag: String, content: String },

    Chapter { number: String, line: u32 },

    Verse { number: String, line: u32 },

    Word { text: String, attributes: Attributes },

    Text(String),

    MilestoneStart {
        tag: String,
        attributes: Attributes,
        line: u32,
    },

    MilestoneEnd { tag: String, line: u32 },

    /// Opening character marker whose closer appears later in the verse.
    MarkerStart { tag: String, line: u32 },

    MarkerEnd { tag: String, line: u32 },

    /// A marker without children: paragraph breaks, poetry levels, headings.
    Paragraph { tag: String, content: Option<String> },

    Note { tag: String, content: String },
}

impl Event {
    pub fn text(text: impl Into<String>) -> Self {
        Event::Text(text.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_event_creation() {
        assert_eq!(Event::text(", "), Event::Text(", ".to_string()));
    }
}
