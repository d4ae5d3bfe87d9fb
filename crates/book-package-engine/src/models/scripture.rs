//! Decoded scripture: books, chapters, verses and aligned words.

use book_package_usfm::Attributes;
use std::sync::Arc;

/// Original-language data attached to the receptor words it covers.
///
/// Every word inside one alignment milestone holds the same `Arc`, so
/// comparing with [`Arc::ptr_eq`] tells whether two words came from the
/// same milestone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentInfo {
    pub strong: Option<String>,
    pub lemma: Option<String>,
    pub morph: Option<String>,
    pub occurrence: Option<String>,
    pub occurrences: Option<String>,
    /// Original-language surface form.
    pub content: Option<String>,
}

impl AlignmentInfo {
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let get = |key: &str| attributes.get(key).map(str::to_string);
        Self {
            strong: get("strong"),
            lemma: get("lemma"),
            morph: get("morph"),
            occurrence: get("occurrence"),
            occurrences: get("occurrences"),
            content: get("content"),
        }
    }
}

/// A surface token of the receptor text: a word, punctuation or whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub alignment: Option<Arc<AlignmentInfo>>,
}

impl Word {
    pub fn new(text: impl Into<String>, alignment: Option<Arc<AlignmentInfo>>) -> Self {
        Self {
            text: text.into(),
            alignment,
        }
    }

    /// Aligned original-language content, if any.
    pub fn content(&self) -> Option<&str> {
        self.alignment.as_deref().and_then(|a| a.content.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    pub chapter: String,
    pub verse: String,
    pub words: Vec<Word>,
    /// Concatenation of every word's text.
    pub text: String,
}

impl Verse {
    pub fn new(chapter: impl Into<String>, verse: impl Into<String>, words: Vec<Word>) -> Self {
        let text = words.iter().map(|w| w.text.as_str()).collect();
        Self {
            chapter: chapter.into(),
            verse: verse.into(),
            words,
            text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub chapter: String,
    pub verses: Vec<Verse>,
}

impl Chapter {
    pub fn verse(&self, verse: &str) -> Option<&Verse> {
        self.verses.iter().find(|v| v.verse == verse)
    }
}

/// A decoded book with its identifying headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Upper-cased book code from `\id`, e.g. `JHN`.
    pub id: String,
    pub title: String,
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn chapter(&self, chapter: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.chapter == chapter)
    }

    /// Position of `chapter` in the sorted chapter list.
    pub fn chapter_index(&self, chapter: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.chapter == chapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verse_text_concatenates_words() {
        let verse = Verse::new(
            "1",
            "1",
            vec![Word::new("In", None), Word::new(" ", None), Word::new("the", None)],
        );
        assert_eq!(verse.text, "In the");
    }

    #[test]
    fn alignment_from_attributes() {
        let attributes: Attributes = [("content", "בָּרָא"), ("occurrence", "1"), ("strong", "H1254")]
            .into_iter()
            .collect();
        let info = AlignmentInfo::from_attributes(&attributes);
        assert_eq!(info.content.as_deref(), Some("בָּרָא"));
        assert_eq!(info.occurrence.as_deref(), Some("1"));
        assert_eq!(info.strong.as_deref(), Some("H1254"));
        assert_eq!(info.morph, None);
    }

    #[test]
    fn word_content_reads_through_alignment() {
        let info = Arc::new(AlignmentInfo {
            content: Some("λόγος".to_string()),
            ..Default::default()
        });
        assert_eq!(Word::new("Word", Some(info)).content(), Some("λόγος"));
        assert_eq!(Word::new(",", None).content(), None);
    }
}
