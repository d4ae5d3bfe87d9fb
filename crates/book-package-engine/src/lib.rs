pub mod annotations;
pub mod decode;
pub mod helps;
pub mod matching;
pub mod models;
pub mod resources;
pub mod sync;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use annotations::{Annotation, AnnotationError, TranslationNote, TranslationQuestion, WordLink};
pub use decode::{DecodeError, decode, decode_book};
pub use matching::{
    WordMarks, does_word_match_annotation, find_annotation_for_word, mark_words, normalize_quote,
    quote_matches, reconstruct_in_chapter, reconstruct_receptor_phrase,
};
pub use models::*;
pub use resources::{Article, ResourceError, ResourceId, ResourceStore};
pub use sync::{Door43Client, ReleaseSource, SyncError, SyncEvent, SyncOutcome, SyncReport, sync_resources};
