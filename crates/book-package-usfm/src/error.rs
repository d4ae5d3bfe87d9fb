use thiserror::Error;

/// A book that cannot be turned into chapters and verses.
///
/// Parsing stops at the first error; there is no partial document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsfmError {
    #[error("line {line}: `\\{tag}-e\\*` closes a milestone that was never opened")]
    UnbalancedMilestone { tag: String, line: u32 },

    #[error("line {line}: `\\{tag}-s` milestone is never closed")]
    UnclosedMilestone { tag: String, line: u32 },

    #[error("line {line}: `\\{marker}` has no closing `\\{marker}*`")]
    UnclosedMarker { marker: String, line: u32 },

    #[error("line {line}: unexpected closing marker `\\{marker}*`")]
    UnexpectedClosingMarker { marker: String, line: u32 },

    #[error("line {line}: verse {verse} appears before any chapter")]
    VerseOutsideChapter { verse: String, line: u32 },

    #[error("line {line}: `\\{marker}` is missing its number")]
    MissingNumber { marker: String, line: u32 },

    #[error("line {line}: malformed attribute list {text:?}")]
    MalformedAttributes { text: String, line: u32 },
}

impl UsfmError {
    pub fn line(&self) -> u32 {
        match self {
            UsfmError::UnbalancedMilestone { line, .. }
            | UsfmError::UnclosedMilestone { line, .. }
            | UsfmError::UnclosedMarker { line, .. }
            | UsfmError::UnexpectedClosingMarker { line, .. }
            | UsfmError::VerseOutsideChapter { line, .. }
            | UsfmError::MissingNumber { line, .. }
            | UsfmError::MalformedAttributes { line, .. } => *line,
        }
    }
}
