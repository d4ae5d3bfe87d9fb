//! # Annotation Matcher
//!
//! Decides which receptor words an annotation row is about by comparing
//! the row's original-language quote with each word's aligned content.
//!
//! A quote equal to the content is an exact match; when both the row and
//! the alignment carry an occurrence, those must be equal too. Otherwise a
//! quote that contains the content matches as part of a phrase, without
//! any occurrence check. This over-highlights when a short word recurs
//! elsewhere in the verse; missing a highlight is the worse outcome here.
//!
//! Annotations are only ever compared with words of their own verse.
//! Callers pass the rows of the chapter being shown.

use crate::annotations::Annotation;
use crate::models::{AlignmentInfo, Chapter, Verse, Word};

/// Zero-width characters and the byte order mark.
const INVISIBLE: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Per-word flags for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordMarks {
    /// Some annotation of the verse covers this word.
    pub has_annotation: bool,
    /// The currently selected annotation covers this word.
    pub matches_selected: bool,
}

/// Strip invisible characters and surrounding whitespace.
pub fn normalize_quote(quote: &str) -> String {
    let stripped: String = quote.chars().filter(|c| !INVISIBLE.contains(c)).collect();
    stripped.trim().to_string()
}

/// Compare an annotation's quote with one alignment.
pub fn quote_matches<A: Annotation + ?Sized>(annotation: &A, alignment: &AlignmentInfo) -> bool {
    let quote = normalize_quote(annotation.orig_quote());
    let content = normalize_quote(alignment.content.as_deref().unwrap_or_default());
    if quote.is_empty() || content.is_empty() {
        return false;
    }

    if quote == content {
        let actual = alignment
            .occurrence
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty());
        return match (annotation.occurrence(), actual) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => true,
        };
    }

    quote.contains(&content)
}

/// Whether `word` in verse `verse` belongs to `annotation`.
pub fn does_word_match_annotation<A: Annotation + ?Sized>(
    word: &Word,
    annotation: &A,
    verse: &str,
) -> bool {
    if annotation.verse() != verse {
        return false;
    }
    word.alignment
        .as_deref()
        .is_some_and(|alignment| quote_matches(annotation, alignment))
}

/// First annotation, in table order, covering `word`.
pub fn find_annotation_for_word<'a, A: Annotation>(
    word: &Word,
    verse: &str,
    annotations: &'a [A],
) -> Option<&'a A> {
    word.alignment.as_ref()?;
    annotations
        .iter()
        .find(|annotation| does_word_match_annotation(word, *annotation, verse))
}

/// Receptor-language words the annotation covers, joined by spaces.
///
/// Falls back to the annotation's stored quote when no word matches.
pub fn reconstruct_receptor_phrase<A: Annotation + ?Sized>(annotation: &A, verse: &Verse) -> String {
    let matched: Vec<&str> = verse
        .words
        .iter()
        .filter(|word| !word.text.is_empty())
        .filter(|word| does_word_match_annotation(*word, annotation, &verse.verse))
        .map(|word| word.text.as_str())
        .collect();

    if matched.is_empty() {
        return annotation.stored_quote().to_string();
    }
    collapse_whitespace(&matched.join(" "))
}

/// Like [`reconstruct_receptor_phrase`], looking the annotation's verse up
/// in `chapter`.
pub fn reconstruct_in_chapter<A: Annotation + ?Sized>(annotation: &A, chapter: Option<&Chapter>) -> String {
    match chapter.and_then(|c| c.verse(annotation.verse())) {
        Some(verse) => reconstruct_receptor_phrase(annotation, verse),
        None => annotation.stored_quote().to_string(),
    }
}

/// Flags for every word of `verse`, in word order.
pub fn mark_words<A: Annotation>(verse: &Verse, annotations: &[A], selected: Option<&A>) -> Vec<WordMarks> {
    verse
        .words
        .iter()
        .map(|word| WordMarks {
            has_annotation: find_annotation_for_word(word, &verse.verse, annotations).is_some(),
            matches_selected: selected
                .is_some_and(|annotation| does_word_match_annotation(word, annotation, &verse.verse)),
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{TranslationNote, WordLink};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;

    fn alignment(content: &str, occurrence: Option<&str>) -> Arc<AlignmentInfo> {
        Arc::new(AlignmentInfo {
            content: Some(content.to_string()),
            occurrence: occurrence.map(str::to_string),
            ..Default::default()
        })
    }

    fn aligned(text: &str, content: &str, occurrence: Option<&str>) -> Word {
        Word::new(text, Some(alignment(content, occurrence)))
    }

    fn note(verse: &str, quote: &str, occurrence: &str) -> TranslationNote {
        TranslationNote {
            chapter: "1".to_string(),
            verse: verse.to_string(),
            id: format!("{quote}-{occurrence}"),
            quote: quote.to_string(),
            occurrence: occurrence.to_string(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("\u{200B}בָּרָא\u{FEFF}", "בָּרָא")]
    #[case("  λόγος ", "λόγος")]
    #[case("a\u{200D}b", "ab")]
    #[case("\u{200C}", "")]
    fn normalization(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_quote(input), expected);
    }

    #[test]
    fn exact_match_with_occurrence() {
        let word = aligned("created", "X", Some("1"));

        assert!(does_word_match_annotation(&word, &note("1", "X", "1"), "1"));
        assert!(!does_word_match_annotation(&word, &note("1", "X", "2"), "1"));
    }

    #[test]
    fn exact_match_ignores_occurrence_missing_on_either_side() {
        assert!(does_word_match_annotation(&aligned("a", "X", None), &note("1", "X", "2"), "1"));
        assert!(does_word_match_annotation(&aligned("a", "X", Some("3")), &note("1", "X", ""), "1"));
    }

    #[test]
    fn empty_alignment_occurrence_is_no_occurrence() {
        assert!(does_word_match_annotation(&aligned("a", "X", Some("")), &note("1", "X", "1"), "1"));
        assert!(does_word_match_annotation(&aligned("a", "X", Some(" 1 ")), &note("1", "X", "1"), "1"));
        assert!(!does_word_match_annotation(&aligned("a", "X", Some(" 2")), &note("1", "X", "1"), "1"));
    }

    #[test]
    fn substring_fallback_ignores_occurrence() {
        let word = aligned("beginning", "beginning", Some("2"));
        assert!(does_word_match_annotation(&word, &note("1", "in the beginning", "1"), "1"));
    }

    #[test]
    fn content_longer_than_quote_does_not_match() {
        let word = aligned("the beginning", "in the beginning", None);
        assert!(!does_word_match_annotation(&word, &note("1", "beginning", ""), "1"));
    }

    #[test]
    fn empty_quote_or_content_never_matches() {
        assert!(!does_word_match_annotation(&aligned("a", "", None), &note("1", "X", ""), "1"));
        assert!(!does_word_match_annotation(&aligned("a", "X", None), &note("1", "\u{200B} ", ""), "1"));
    }

    #[test]
    fn unaligned_words_never_match() {
        let word = Word::new("the", None);
        let notes = vec![note("1", "X", "")];

        assert!(!does_word_match_annotation(&word, &notes[0], "1"));
        assert!(find_annotation_for_word(&word, "1", &notes).is_none());
    }

    #[test]
    fn verse_must_match() {
        let word = aligned("a", "X", None);
        assert!(!does_word_match_annotation(&word, &note("2", "X", ""), "1"));
    }

    #[test]
    fn first_matching_annotation_in_table_order() {
        let notes = vec![note("2", "X", ""), note("1", "X Y", "1"), note("1", "X", "1")];
        let word = aligned("a", "X", Some("1"));

        let found = find_annotation_for_word(&word, "1", &notes).unwrap();
        assert_eq!(found.id, "X Y-1");
    }

    #[test]
    fn occurrences_match_their_own_word() {
        let first = aligned("land", "land", Some("1"));
        let second = aligned("land", "land", Some("2"));
        let notes = vec![note("1", "land", "1"), note("1", "land", "2")];

        assert_eq!(find_annotation_for_word(&first, "1", &notes).unwrap().id, "land-1");
        assert_eq!(find_annotation_for_word(&second, "1", &notes).unwrap().id, "land-2");
        assert!(!does_word_match_annotation(&first, &notes[1], "1"));
        assert!(!does_word_match_annotation(&second, &notes[0], "1"));
    }

    fn verse(words: Vec<Word>) -> Verse {
        Verse::new("1", "1", words)
    }

    #[test]
    fn phrase_joins_matching_word_texts() {
        let shared = alignment("בְּרֵאשִׁית", Some("1"));
        let verse = verse(vec![
            Word::new("In", Some(shared.clone())),
            Word::new(" ", Some(shared.clone())),
            Word::new("the", Some(shared.clone())),
            Word::new(" ", Some(shared.clone())),
            Word::new("beginning", Some(shared)),
            Word::new(", ", None),
            aligned("God", "אֱלֹהִים", Some("1")),
        ]);

        assert_eq!(
            reconstruct_receptor_phrase(&note("1", "בְּרֵאשִׁית", "1"), &verse),
            "In the beginning"
        );
        assert_eq!(
            reconstruct_receptor_phrase(&note("1", "בְּרֵאשִׁית אֱלֹהִים", "1"), &verse),
            "In the beginning God"
        );
    }

    #[test]
    fn phrase_falls_back_to_stored_quote() {
        let verse = verse(vec![aligned("God", "אֱלֹהִים", None)]);
        let mut unmatched = note("1", "בָּרָא", "1");
        assert_eq!(reconstruct_receptor_phrase(&unmatched, &verse), "בָּרָא");

        unmatched.gl_quote = "created".to_string();
        assert_eq!(reconstruct_receptor_phrase(&unmatched, &verse), "created");
    }

    #[test]
    fn word_link_phrase_falls_back_to_orig_words() {
        let link = WordLink {
            chapter: "1".to_string(),
            verse: "1".to_string(),
            orig_words: "Θεὸς".to_string(),
            ..Default::default()
        };
        let verse = verse(vec![Word::new("God", None)]);
        assert_eq!(reconstruct_receptor_phrase(&link, &verse), "Θεὸς");
    }

    #[test]
    fn reconstruct_in_missing_verse_falls_back() {
        let chapter = Chapter {
            chapter: "1".to_string(),
            verses: vec![verse(vec![aligned("God", "X", None)])],
        };

        assert_eq!(reconstruct_in_chapter(&note("1", "X", ""), Some(&chapter)), "God");
        assert_eq!(reconstruct_in_chapter(&note("7", "X", ""), Some(&chapter)), "X");
        assert_eq!(reconstruct_in_chapter(&note("1", "X", ""), None), "X");
    }

    #[test]
    fn marks_for_each_word() {
        let verse = verse(vec![
            aligned("land", "land", Some("1")),
            Word::new(" ", None),
            aligned("land", "land", Some("2")),
        ]);
        let notes = vec![note("1", "land", "1"), note("1", "land", "2")];

        let marks = mark_words(&verse, &notes, Some(&notes[1]));
        assert_eq!(
            marks,
            vec![
                WordMarks {
                    has_annotation: true,
                    matches_selected: false
                },
                WordMarks::default(),
                WordMarks {
                    has_annotation: true,
                    matches_selected: true
                },
            ]
        );
    }

    #[test]
    fn marks_without_selection() {
        let verse = verse(vec![aligned("a", "X", None)]);
        let notes: Vec<TranslationNote> = Vec::new();

        let marks = mark_words(&verse, &notes, None);
        assert_eq!(marks, vec![WordMarks::default()]);
    }
}
