//! # Parser - Event-Based Document Construction
//!
//! The parser walks the token stream and emits [`Event`]s; the [`Sink`] turns
//! them into a [`UsfmDocument`].
//!
//! ## Why Event-Based Parsing?
//!
//! Alignment milestones nest (`\zaln-s` inside `\zaln-s` when several
//! original-language words share one English word) and close with a
//! separate marker. Grammar rules only need to recognise the shape in
//! front of them - a milestone start, a word, a footnote - and say so. The
//! Sink owns the stack of open frames and is the single place that decides
//! whether a closer matches.
//!
//! ## Module Structure
//!
//! - [`event`] - The Event enum
//! - [`sink`] - Converts events to the document tree
//! - `grammar` - Grammar rules (book/chapter/verse structure, verse content)
//!
//! ## Public API
//!
//! The main entry point is [`parse`]:
//!
//! ```
//! use book_package_usfm::parse;
//!
//! let doc = parse("\\id GEN\n\\c 1\n\\v 1 In the beginning\n").unwrap();
//! assert_eq!(doc.header("id"), Some("GEN"));
//! assert_eq!(doc.chapters[0].verses[0].number, "1");
//! ```

pub mod event;
pub mod sink;

mod grammar;

use crate::document::UsfmDocument;
use crate::error::UsfmError;
use crate::lexer::{Token, TokenKind, lex};
use event::Event;
use sink::Sink;
use std::collections::HashMap;

/// The parser state machine.
///
/// Holds the token stream, current position, and accumulated events.
/// Grammar functions receive `&mut Parser` and use its methods to:
///
/// - Inspect tokens: `current()`, `current_token()`, `at()`, `at_marker()`
/// - Consume tokens: `bump()`, `eat()`
/// - Report structure: `emit()`
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    pos: usize,
    events: Vec<Event>,
    /// For each position, the index of the next `\c` or `\v` at or after it.
    next_boundary: Vec<usize>,
    /// Positions of every `\name*` closer, ascending, keyed by name.
    closers: HashMap<&'input str, Vec<usize>>,
}

impl<'t, 'input> Parser<'t, 'input> {
    /// Create a new parser from a slice of tokens.
    pub fn new(tokens: &'t [Token<'input>]) -> Self {
        let mut next_boundary = vec![tokens.len(); tokens.len() + 1];
        for (i, token) in tokens.iter().enumerate().rev() {
            next_boundary[i] = if token.is_marker("c") || token.is_marker("v") {
                i
            } else {
                next_boundary[i + 1]
            };
        }

        let mut closers: HashMap<&'input str, Vec<usize>> = HashMap::new();
        for (i, token) in tokens.iter().enumerate() {
            if token.kind != TokenKind::MarkerClose {
                continue;
            }
            if let Some(name) = token.marker_name() {
                closers.entry(name).or_default().push(i);
            }
        }

        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            next_boundary,
            closers,
        }
    }

    /// Parse the tokens into a document.
    pub fn parse(mut self) -> Result<UsfmDocument, UsfmError> {
        grammar::root(&mut self)?;
        Sink::new(self.events).finish()
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub fn current_token(&self) -> Option<&'t Token<'input>> {
        self.tokens.get(self.pos)
    }

    /// Get the text of the current token.
    pub fn current_text(&self) -> &'input str {
        self.tokens.get(self.pos).map(|t| t.text).unwrap_or("")
    }

    /// Line of the current token, or of the last token at end of input.
    pub fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    /// Check if at end of input.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Check if current token is of given kind.
    pub fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    /// Check if current token is the opening marker `\name`.
    pub fn at_marker(&self, name: &str) -> bool {
        self.current_token().is_some_and(|t| t.is_marker(name))
    }

    /// Check if current token closes `\name`.
    pub fn at_closer(&self, name: &str) -> bool {
        self.current_token()
            .is_some_and(|t| t.kind == TokenKind::MarkerClose && t.marker_name() == Some(name))
    }

    /// Check if current token starts a new chapter or verse.
    pub fn at_verse_boundary(&self) -> bool {
        self.at_marker("c") || self.at_marker("v")
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Whether `\name*` appears before the next chapter or verse marker.
    pub fn has_closer(&self, name: &str) -> bool {
        let pos = self.pos.min(self.tokens.len());
        let Some(positions) = self.closers.get(name) else {
            return false;
        };
        let next = positions.partition_point(|&i| i < pos);
        positions
            .get(next)
            .is_some_and(|&closer| closer < self.next_boundary[pos])
    }
}

/// Parse USFM source into a document.
pub fn parse(source: &str) -> Result<UsfmDocument, UsfmError> {
    let tokens = lex(source);
    let parser = Parser::new(&tokens);
    parser.parse()
}
