//! # Annotation tables
//!
//! Translation notes (`tn_*.tsv`), word links (`twl_*.tsv`) and
//! translation questions (`tq_*.tsv`) are tab-separated tables keyed by a
//! `chapter:verse` reference and an original-language quote.
//!
//! The tables are not CSV-quoted: a `"` is an ordinary character, so
//! quoting is turned off. Rows may be ragged and columns may be missing;
//! neither is an error. Rows without a usable reference are dropped.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    #[error("Unreadable annotation table: {0}")]
    Tsv(#[from] csv::Error),
}

/// The seam the matcher works over: a row keyed by verse and quote.
pub trait Annotation {
    fn chapter(&self) -> &str;
    fn verse(&self) -> &str;
    fn id(&self) -> &str;
    /// Original-language quote compared against aligned content.
    fn orig_quote(&self) -> &str;
    /// Occurrence of the quote within the verse, when the table gives one.
    fn occurrence(&self) -> Option<&str>;
    /// What to show when no receptor word can be matched.
    fn stored_quote(&self) -> &str;
}

impl<T: Annotation + ?Sized> Annotation for &T {
    fn chapter(&self) -> &str {
        (**self).chapter()
    }
    fn verse(&self) -> &str {
        (**self).verse()
    }
    fn id(&self) -> &str {
        (**self).id()
    }
    fn orig_quote(&self) -> &str {
        (**self).orig_quote()
    }
    fn occurrence(&self) -> Option<&str> {
        (**self).occurrence()
    }
    fn stored_quote(&self) -> &str {
        (**self).stored_quote()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationNote {
    pub chapter: String,
    pub verse: String,
    pub id: String,
    pub tags: String,
    /// `rc://*/ta/man/...` link to a Translation Academy article.
    pub support_reference: String,
    pub quote: String,
    pub occurrence: String,
    pub note: String,
    pub gl_quote: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordLink {
    pub chapter: String,
    pub verse: String,
    pub id: String,
    pub tags: String,
    pub orig_words: String,
    pub occurrence: String,
    /// `rc://*/tw/dict/...` link to a Translation Words article.
    pub tw_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationQuestion {
    pub chapter: String,
    pub verse: String,
    pub id: String,
    pub tags: String,
    pub quote: String,
    pub occurrence: String,
    pub question: String,
    pub response: String,
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

impl Annotation for TranslationNote {
    fn chapter(&self) -> &str {
        &self.chapter
    }
    fn verse(&self) -> &str {
        &self.verse
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn orig_quote(&self) -> &str {
        &self.quote
    }
    fn occurrence(&self) -> Option<&str> {
        non_empty(&self.occurrence)
    }
    fn stored_quote(&self) -> &str {
        if self.gl_quote.trim().is_empty() {
            &self.quote
        } else {
            &self.gl_quote
        }
    }
}

impl Annotation for WordLink {
    fn chapter(&self) -> &str {
        &self.chapter
    }
    fn verse(&self) -> &str {
        &self.verse
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn orig_quote(&self) -> &str {
        &self.orig_words
    }
    fn occurrence(&self) -> Option<&str> {
        non_empty(&self.occurrence)
    }
    fn stored_quote(&self) -> &str {
        &self.orig_words
    }
}

impl Annotation for TranslationQuestion {
    fn chapter(&self) -> &str {
        &self.chapter
    }
    fn verse(&self) -> &str {
        &self.verse
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn orig_quote(&self) -> &str {
        &self.quote
    }
    fn occurrence(&self) -> Option<&str> {
        non_empty(&self.occurrence)
    }
    fn stored_quote(&self) -> &str {
        &self.quote
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NoteRow {
    #[serde(rename = "Reference")]
    reference: Option<String>,
    #[serde(rename = "ID")]
    id: Option<String>,
    #[serde(rename = "Tags")]
    tags: Option<String>,
    #[serde(rename = "SupportReference")]
    support_reference: Option<String>,
    #[serde(rename = "Quote")]
    quote: Option<String>,
    #[serde(rename = "Occurrence")]
    occurrence: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "GLQuote")]
    gl_quote: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WordLinkRow {
    #[serde(rename = "Reference")]
    reference: Option<String>,
    #[serde(rename = "ID")]
    id: Option<String>,
    #[serde(rename = "Tags")]
    tags: Option<String>,
    #[serde(rename = "OrigWords")]
    orig_words: Option<String>,
    #[serde(rename = "Occurrence")]
    occurrence: Option<String>,
    #[serde(rename = "TWLink")]
    tw_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuestionRow {
    #[serde(rename = "Reference")]
    reference: Option<String>,
    #[serde(rename = "ID")]
    id: Option<String>,
    #[serde(rename = "Tags")]
    tags: Option<String>,
    #[serde(rename = "Quote")]
    quote: Option<String>,
    #[serde(rename = "Occurrence")]
    occurrence: Option<String>,
    #[serde(rename = "Question")]
    question: Option<String>,
    #[serde(rename = "Response")]
    response: Option<String>,
}

/// Parse a `tn_<BOOK>.tsv` table.
pub fn parse_translation_notes(tsv: &str) -> Result<Vec<TranslationNote>, AnnotationError> {
    let rows: Vec<NoteRow> = read_rows(tsv)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let (chapter, verse) = reference(row.reference.as_deref(), row.id.as_deref())?;
            Some(TranslationNote {
                chapter,
                verse,
                id: row.id.unwrap_or_default(),
                tags: row.tags.unwrap_or_default(),
                support_reference: row.support_reference.unwrap_or_default(),
                quote: row.quote.unwrap_or_default(),
                occurrence: row.occurrence.unwrap_or_default(),
                note: unescape_body(row.note.as_deref().unwrap_or_default()),
                gl_quote: row.gl_quote.unwrap_or_default(),
            })
        })
        .collect())
}

/// Parse a `twl_<BOOK>.tsv` table.
pub fn parse_word_links(tsv: &str) -> Result<Vec<WordLink>, AnnotationError> {
    let rows: Vec<WordLinkRow> = read_rows(tsv)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let (chapter, verse) = reference(row.reference.as_deref(), row.id.as_deref())?;
            Some(WordLink {
                chapter,
                verse,
                id: row.id.unwrap_or_default(),
                tags: row.tags.unwrap_or_default(),
                orig_words: row.orig_words.unwrap_or_default(),
                occurrence: row.occurrence.unwrap_or_default(),
                tw_link: row.tw_link.unwrap_or_default(),
            })
        })
        .collect())
}

/// Parse a `tq_<BOOK>.tsv` table.
pub fn parse_translation_questions(tsv: &str) -> Result<Vec<TranslationQuestion>, AnnotationError> {
    let rows: Vec<QuestionRow> = read_rows(tsv)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let (chapter, verse) = reference(row.reference.as_deref(), row.id.as_deref())?;
            Some(TranslationQuestion {
                chapter,
                verse,
                id: row.id.unwrap_or_default(),
                tags: row.tags.unwrap_or_default(),
                quote: row.quote.unwrap_or_default(),
                occurrence: row.occurrence.unwrap_or_default(),
                question: unescape_body(row.question.as_deref().unwrap_or_default()),
                response: unescape_body(row.response.as_deref().unwrap_or_default()),
            })
        })
        .collect())
}

fn read_rows<T: DeserializeOwned>(tsv: &str) -> Result<Vec<T>, AnnotationError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(tsv.as_bytes());

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Split `chapter:verse`; rows without one are dropped.
fn reference(reference: Option<&str>, id: Option<&str>) -> Option<(String, String)> {
    let reference = reference.unwrap_or_default();
    let Some((chapter, verse)) = reference.trim().split_once(':') else {
        let id = id.unwrap_or_default();
        log::debug!("Dropping annotation row {id:?}: malformed reference {reference:?}");
        return None;
    };
    let verse = verse.split(':').next().unwrap_or(verse);
    Some((chapter.trim().to_string(), verse.trim().to_string()))
}

fn line_break_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"(?i)<br\s*/?>").expect("Invalid line break regex"))
}

/// Turn literal `\n` sequences and `<br>` tags into line breaks.
pub fn unescape_body(body: &str) -> String {
    let body = body.replace("\\n", "\n");
    line_break_regex().replace_all(&body, "\n").into_owned()
}

/// Rows referring to `chapter`, in table order.
pub fn in_chapter<'a, A: Annotation>(rows: &'a [A], chapter: &str) -> Vec<&'a A> {
    rows.iter().filter(|row| row.chapter() == chapter).collect()
}

/// Rows referring to `chapter:verse`, in table order.
pub fn in_verse<'a, A: Annotation>(rows: &'a [A], chapter: &str, verse: &str) -> Vec<&'a A> {
    rows.iter()
        .filter(|row| row.chapter() == chapter && row.verse() == verse)
        .collect()
}
