//! # Markup Decoder
//!
//! Turns a USFM book into sorted chapters of verses, each a flat list of
//! [`Word`]s carrying the alignment of the nearest enclosing `\zaln` (or
//! `\k`) milestone.
//!
//! ```
//! use book_package_engine::decode::decode;
//!
//! let chapters = decode(concat!(
//!     "\\c 1\n",
//!     "\\v 1 \\zaln-s |x-content=\"בָּרָא\" x-occurrence=\"1\"\\*\\w created\\w*\\zaln-e\\*\n",
//! ))
//! .unwrap();
//!
//! let word = &chapters[0].verses[0].words[0];
//! assert_eq!(word.text, "created");
//! assert_eq!(word.content(), Some("בָּרָא"));
//! ```

use crate::models::{AlignmentInfo, Book, Chapter, Verse, Word};
use book_package_usfm::{UsfmDocument, UsfmError, VerseObject};
use std::cmp::Ordering;
use std::sync::Arc;

/// Milestone tags that open a new alignment context.
const ALIGNMENT_TAGS: &[&str] = &["zaln", "k"];

/// Header markers tried in order for a book title.
const TITLE_HEADERS: &[&str] = &["h", "toc2", "toc1", "mt", "mt1"];

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed USFM: {0}")]
    Usfm(#[from] UsfmError),
}

/// Decode a whole book into chapters sorted by chapter number.
pub fn decode(raw: &str) -> Result<Vec<Chapter>, DecodeError> {
    let document = book_package_usfm::parse(raw)?;
    Ok(chapters(&document))
}

/// Decode a book together with its id and title headers.
pub fn decode_book(raw: &str) -> Result<Book, DecodeError> {
    let document = book_package_usfm::parse(raw)?;

    let id = document
        .header("id")
        .and_then(|id| id.split_whitespace().next())
        .map(str::to_uppercase)
        .unwrap_or_default();
    let title = TITLE_HEADERS
        .iter()
        .find_map(|tag| document.header(tag).filter(|t| !t.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());

    Ok(Book {
        id,
        title,
        chapters: chapters(&document),
    })
}

fn chapters(document: &UsfmDocument) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = Vec::new();

    for objects in &document.chapters {
        let verses = objects
            .verses
            .iter()
            .map(|v| Verse::new(objects.number.as_str(), v.number.as_str(), flatten(&v.objects)));

        match chapters.iter_mut().find(|c| c.chapter == objects.number) {
            Some(existing) => {
                for verse in verses {
                    merge_verse(&mut existing.verses, verse);
                }
            }
            None => chapters.push(Chapter {
                chapter: objects.number.clone(),
                verses: verses.collect(),
            }),
        }
    }

    for chapter in &mut chapters {
        chapter
            .verses
            .sort_by(|a, b| compare_numbers(&a.verse, &b.verse));
    }
    chapters.sort_by(|a, b| compare_numbers(&a.chapter, &b.chapter));
    chapters
}

fn merge_verse(verses: &mut Vec<Verse>, verse: Verse) {
    match verses.iter_mut().find(|v| v.verse == verse.verse) {
        Some(existing) => {
            existing.text.push_str(&verse.text);
            existing.words.extend(verse.words);
        }
        None => verses.push(verse),
    }
}

/// Flatten a verse's object tree into words, depth first.
pub fn flatten(objects: &[VerseObject]) -> Vec<Word> {
    let mut words = Vec::new();
    walk(objects, None, &mut words);
    words
}

fn walk(objects: &[VerseObject], alignment: Option<&Arc<AlignmentInfo>>, words: &mut Vec<Word>) {
    for object in objects {
        match object {
            VerseObject::Word { text, .. } | VerseObject::Text { text } => {
                words.push(Word::new(text.as_str(), alignment.cloned()));
            }
            VerseObject::Milestone {
                tag,
                attributes,
                children,
            } if ALIGNMENT_TAGS.contains(&tag.as_str()) => {
                let info = Arc::new(AlignmentInfo::from_attributes(attributes));
                walk(children, Some(&info), words);
            }
            other => walk(other.children(), alignment, words),
        }
    }
}

/// Leading decimal digits of a chapter or verse number (`"4-5"` gives 4).
pub fn numeric_value(number: &str) -> Option<u64> {
    let end = number
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(number.len());
    number[..end].parse().ok()
}

/// Numeric order; numbers without leading digits sort last.
pub fn compare_numbers(a: &str, b: &str) -> Ordering {
    match (numeric_value(a), numeric_value(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
