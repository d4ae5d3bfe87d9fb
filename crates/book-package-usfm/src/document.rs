//! The parsed shape of a USFM book: headers, then chapters holding verses,
//! each verse holding a tree of [`VerseObject`]s in document order.

use crate::attributes::Attributes;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsfmDocument {
    pub headers: Vec<Header>,
    /// Chapters in the order they appear in the source.
    pub chapters: Vec<ChapterObjects>,
}

impl UsfmDocument {
    /// Content of the first header with the given tag.
    pub fn header(&self, tag: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.tag == tag)
            .map(|h| h.content.as_str())
    }
}

/// A book-level marker before the first chapter, e.g. `\id GEN` or `\h Genesis`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub tag: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterObjects {
    pub number: String,
    /// Objects between `\c` and the first `\v` (section headings, paragraph breaks).
    pub front: Vec<VerseObject>,
    /// Verses in source order; each number appears once.
    pub verses: Vec<VerseObjects>,
}

impl ChapterObjects {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            front: Vec::new(),
            verses: Vec::new(),
        }
    }

    pub fn verse(&self, number: &str) -> Option<&VerseObjects> {
        self.verses.iter().find(|v| v.number == number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseObjects {
    pub number: String,
    pub objects: Vec<VerseObject>,
}

/// One node of a verse's content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerseObject {
    /// `\w text|attributes\w*`
    Word { text: String, attributes: Attributes },
    /// Plain text, punctuation and (collapsed) whitespace.
    Text { text: String },
    /// `\tag-s |attributes\*` ... `\tag-e\*`
    Milestone {
        tag: String,
        attributes: Attributes,
        children: Vec<VerseObject>,
    },
    /// Character markers (`\add ...\add*`) carry children; paragraph and
    /// heading markers (`\p`, `\s1 Heading`) do not.
    Marker {
        tag: String,
        content: Option<String>,
        children: Vec<VerseObject>,
    },
    /// Footnotes and cross references with their raw body.
    Note { tag: String, content: String },
}

impl VerseObject {
    pub fn text(text: impl Into<String>) -> Self {
        VerseObject::Text { text: text.into() }
    }

    pub fn children(&self) -> &[VerseObject] {
        match self {
            VerseObject::Milestone { children, .. } | VerseObject::Marker { children, .. } => {
                children
            }
            _ => &[],
        }
    }
}
