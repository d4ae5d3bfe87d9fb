//! # book-package-usfm
//!
//! Parses [USFM] scripture markup into chapters, verses and a tree of verse
//! objects, keeping the word-level alignment milestones that unfoldingWord
//! translations carry.
//!
//! [USFM]: https://ubsicap.github.io/usfm/
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Grammar → Events → Sink → UsfmDocument
//!               (Logos)                            (frame stack)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! [Logos] tokenizes the input into markers, attribute separators, text and
//! whitespace. Every byte becomes part of some token.
//!
//! ### 2. Grammar ([`parser`] module)
//!
//! Grammar rules recognise headers, `\c`, `\v`, `\w` words, milestones,
//! character markers and footnotes, and emit events.
//!
//! ### 3. Sink ([`parser::sink`] module)
//!
//! The sink keeps a stack of open milestones and character markers, nests
//! objects inside them, and rejects closers that do not match.
//!
//! ## Quick Start
//!
//! ```
//! use book_package_usfm::{parse, VerseObject};
//!
//! let doc = parse(concat!(
//!     "\\c 1\n",
//!     "\\v 1 \\zaln-s |x-strong=\"H1254\" x-content=\"ברא\"\\*\\w created\\w*\\zaln-e\\*\n",
//! ))
//! .unwrap();
//!
//! let objects = &doc.chapters[0].verses[0].objects;
//! let VerseObject::Milestone { attributes, children, .. } = &objects[0] else {
//!     panic!("expected an alignment milestone");
//! };
//! assert_eq!(attributes.get("content"), Some("ברא"));
//! assert_eq!(children.len(), 1);
//! ```
//!
//! [Logos]: https://docs.rs/logos

pub mod attributes;
pub mod document;
pub mod error;
pub mod lexer;
pub mod parser;

pub use attributes::Attributes;
pub use document::{ChapterObjects, Header, UsfmDocument, VerseObject, VerseObjects};
pub use error::UsfmError;
pub use parser::parse;
