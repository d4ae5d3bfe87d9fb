//! # Lexer - Tokenizing USFM Source
//!
//! This module provides the first stage of parsing: breaking USFM source
//! into tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token. Nothing is skipped,
//! so the parser can always recover the raw text of a footnote or an
//! attribute list by concatenating token texts:
//!
//! ```
//! use book_package_usfm::lexer::lex;
//!
//! let input = "\\v 1 \\w In|x-occurrence=\"1\"\\w* the beginning\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! USFM is backslash-marker based. The lexer only classifies the *shape* of
//! a marker; whether `\w` is a word or `\p` a paragraph break is decided by
//! the grammar:
//!
//! - `\zaln-s`, `\k-s` → [`TokenKind::MilestoneStart`]
//! - `\zaln-e\*` → [`TokenKind::MilestoneEnd`]
//! - `\w*`, `\+nd*` → [`TokenKind::MarkerClose`]
//! - `\v`, `\w`, `\+nd` → [`TokenKind::Marker`]
//! - `\*` → [`TokenKind::SelfClose`] (ends a milestone's attribute list)
//! - `|` → [`TokenKind::Pipe`] (starts an attribute list)
//!
//! Everything else becomes `Text`, `Whitespace` or `Newline`. Text runs are
//! grouped, so "beginning" is one token rather than nine.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
///
/// The `#[logos(skip r"")]` attribute means "skip nothing" - all input is
/// handled explicitly rather than letting Logos drop anything.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"")]
pub enum TokenKind {
    /// Opening half of a milestone pair, e.g. `\zaln-s`
    #[regex(r"\\\+?[A-Za-z0-9]+-s")]
    MilestoneStart,

    /// Closing half of a milestone pair, e.g. `\zaln-e\*`
    #[regex(r"\\\+?[A-Za-z0-9]+-e\\\*")]
    MilestoneEnd,

    /// Closing character marker, e.g. `\w*` or `\+add*`
    #[regex(r"\\\+?[A-Za-z0-9]+\*")]
    MarkerClose,

    /// Any opening marker, e.g. `\c`, `\v`, `\w`, `\p`
    #[regex(r"\\\+?[A-Za-z0-9]+")]
    Marker,

    /// `\*` terminating a milestone
    #[token("\\*")]
    SelfClose,

    /// `|` separating content from attributes
    #[token("|")]
    Pipe,

    /// Horizontal whitespace (spaces, tabs)
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF or CRLF)
    #[regex(r"\r?\n")]
    Newline,

    /// Plain text - anything not matched by other rules
    #[regex(r"[^\\|\s]+")]
    Text,

    /// Past the last token. Never produced by the lexer itself.
    Eof,
}

/// A lexed token with its kind, text slice and 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub line: u32,
}

impl<'a> Token<'a> {
    /// The marker name without the leading backslash, the nesting `+`, and
    /// the milestone or closing suffix.
    ///
    /// `\zaln-s`, `\zaln-e\*`, `\+w*` and `\w` give `zaln`, `zaln`, `w`, `w`.
    /// Returns `None` for non-marker tokens.
    pub fn marker_name(&self) -> Option<&'a str> {
        let name = self.text.strip_prefix('\\')?;
        let name = name.strip_prefix('+').unwrap_or(name);
        match self.kind {
            TokenKind::Marker => Some(name),
            TokenKind::MarkerClose => name.strip_suffix('*'),
            TokenKind::MilestoneStart => name.strip_suffix("-s"),
            TokenKind::MilestoneEnd => name.strip_suffix("-e\\*"),
            _ => None,
        }
    }

    /// Check if this is an opening marker with the given name.
    pub fn is_marker(&self, name: &str) -> bool {
        self.kind == TokenKind::Marker && self.marker_name() == Some(name)
    }
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);
    let mut line = 1;

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        // Logos error means unrecognized input (a lone backslash) - treat as TEXT
        let kind = result.unwrap_or(TokenKind::Text);
        tokens.push(Token { kind, text, line });
        if kind == TokenKind::Newline {
            line += 1;
        }
    }

    tokens
}
