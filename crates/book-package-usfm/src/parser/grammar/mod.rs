//! # Grammar Rules
//!
//! Each function takes a `&mut Parser`, inspects the current token, consumes
//! what it recognises and emits events.
//!
//! ## Module Structure
//!
//! - this module - book headers, `\c` and `\v`
//! - [`inline`] - verse content (words, milestones, character markers, notes)
//!
//! ## Leniency
//!
//! Grammar rules only fail on input they cannot read at all: a chapter or
//! verse marker without a number, an attribute list that is not
//! `key="value"` pairs, or a word or footnote that never closes. Unknown
//! markers become paragraph markers and are carried through untouched.

mod inline;

use crate::error::UsfmError;
use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::parser::event::Event;

/// Parse the whole book.
///
/// Markers before the first `\c` are headers; after it, everything is
/// chapter or verse content.
pub fn root(p: &mut Parser<'_, '_>) -> Result<(), UsfmError> {
    let mut in_chapter = false;

    while !p.at_end() {
        if p.at_marker("c") {
            chapter(p)?;
            in_chapter = true;
        } else if p.at_marker("v") {
            verse(p)?;
        } else if in_chapter {
            inline::content(p)?;
        } else {
            header(p);
        }
    }

    Ok(())
}

/// `\id GEN EN_ULT ...`, `\h Genesis`, `\toc1 The Book of Genesis`
fn header(p: &mut Parser<'_, '_>) {
    if !p.at(TokenKind::Marker) {
        p.bump();
        return;
    }

    let tag = marker_name(p);
    p.bump();
    let content = line_text(p);
    p.emit(Event::Header { tag, content });
}

/// `\c 1`
fn chapter(p: &mut Parser<'_, '_>) -> Result<(), UsfmError> {
    let line = p.line();
    let number = number(p, "c")?;
    p.eat(TokenKind::Whitespace);
    p.eat(TokenKind::Newline);
    p.emit(Event::Chapter { number, line });
    Ok(())
}

/// `\v 1 `
fn verse(p: &mut Parser<'_, '_>) -> Result<(), UsfmError> {
    let line = p.line();
    let number = number(p, "v")?;
    if !p.eat(TokenKind::Whitespace) {
        p.eat(TokenKind::Newline);
    }
    p.emit(Event::Verse { number, line });
    Ok(())
}

fn number(p: &mut Parser<'_, '_>, marker: &str) -> Result<String, UsfmError> {
    let line = p.line();
    p.bump();
    p.eat(TokenKind::Whitespace);
    if !p.at(TokenKind::Text) {
        return Err(UsfmError::MissingNumber {
            marker: marker.to_string(),
            line,
        });
    }
    let number = p.current_text().to_string();
    p.bump();
    Ok(number)
}

fn marker_name(p: &Parser<'_, '_>) -> String {
    p.current_token()
        .and_then(|t| t.marker_name())
        .unwrap_or_default()
        .to_string()
}

/// Text up to the end of the line or the next marker, whitespace collapsed.
fn line_text(p: &mut Parser<'_, '_>) -> String {
    let mut text = String::new();
    while matches!(
        p.current(),
        TokenKind::Text | TokenKind::Whitespace | TokenKind::Pipe | TokenKind::SelfClose
    ) {
        push_collapsed(&mut text, p.current(), p.current_text());
        p.bump();
    }
    text.trim().to_string()
}

/// Append a token's text, turning whitespace and line breaks into single spaces.
fn push_collapsed(out: &mut String, kind: TokenKind, text: &str) {
    match kind {
        TokenKind::Whitespace | TokenKind::Newline => {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        }
        _ => out.push_str(text),
    }
}
