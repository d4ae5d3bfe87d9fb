//! Verse content: words, text runs, alignment milestones, character markers,
//! paragraph markers and footnotes.

use super::{line_text, marker_name, push_collapsed};
use crate::attributes::Attributes;
use crate::error::UsfmError;
use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::parser::event::Event;

/// Footnote and cross reference markers, whose bodies are kept raw.
const NOTE_MARKERS: &[&str] = &["f", "fe", "x", "ef", "ex"];

/// Markers whose text runs to the end of the line.
const HEADING_MARKERS: &[&str] = &["s", "ms", "mr", "r", "d", "sp", "cl", "qa", "mt", "mte", "sr"];

/// Parse one construct of verse (or chapter front) content.
pub(super) fn content(p: &mut Parser<'_, '_>) -> Result<(), UsfmError> {
    match p.current() {
        TokenKind::MilestoneStart => milestone_start(p),
        TokenKind::MilestoneEnd => {
            let (tag, line) = (marker_name(p), p.line());
            p.emit(Event::MilestoneEnd { tag, line });
            p.bump();
            Ok(())
        }
        TokenKind::MarkerClose => {
            let (tag, line) = (marker_name(p), p.line());
            p.emit(Event::MarkerEnd { tag, line });
            p.bump();
            Ok(())
        }
        TokenKind::Marker if p.at_marker("w") => word(p),
        TokenKind::Marker if NOTE_MARKERS.contains(&marker_name(p).as_str()) => note(p),
        TokenKind::Marker => marker(p),
        _ => {
            text_run(p);
            Ok(())
        }
    }
}

/// Consecutive text, whitespace and line breaks as one text object.
fn text_run(p: &mut Parser<'_, '_>) {
    let mut text = String::new();
    while matches!(
        p.current(),
        TokenKind::Text
            | TokenKind::Whitespace
            | TokenKind::Newline
            | TokenKind::Pipe
            | TokenKind::SelfClose
    ) {
        push_collapsed(&mut text, p.current(), p.current_text());
        p.bump();
    }
    if !text.is_empty() {
        p.emit(Event::Text(text));
    }
}

/// `\zaln-s |x-strong="H1254" x-content="בָּרָא"\*`
fn milestone_start(p: &mut Parser<'_, '_>) -> Result<(), UsfmError> {
    let line = p.line();
    let tag = marker_name(p);
    p.bump();
    p.eat(TokenKind::Whitespace);

    let mut raw = String::new();
    if p.eat(TokenKind::Pipe) {
        while matches!(
            p.current(),
            TokenKind::Text | TokenKind::Whitespace | TokenKind::Pipe
        ) {
            raw.push_str(p.current_text());
            p.bump();
        }
    }

    if !p.eat(TokenKind::SelfClose) {
        return Err(UsfmError::UnclosedMarker {
            marker: format!("{tag}-s"),
            line,
        });
    }

    let attributes = parse_attributes(&raw, line)?;
    p.emit(Event::MilestoneStart {
        tag,
        attributes,
        line,
    });
    Ok(())
}

/// `\w beginning|x-occurrence="1" x-occurrences="1"\w*`
fn word(p: &mut Parser<'_, '_>) -> Result<(), UsfmError> {
    let line = p.line();
    p.bump();
    p.eat(TokenKind::Whitespace);

    let mut text = String::new();
    while matches!(p.current(), TokenKind::Text | TokenKind::Whitespace) {
        text.push_str(p.current_text());
        p.bump();
    }

    let mut raw = String::new();
    if p.eat(TokenKind::Pipe) {
        while matches!(
            p.current(),
            TokenKind::Text | TokenKind::Whitespace | TokenKind::Pipe
        ) {
            raw.push_str(p.current_text());
            p.bump();
        }
    }

    if !p.at_closer("w") {
        return Err(UsfmError::UnclosedMarker {
            marker: "w".to_string(),
            line,
        });
    }
    p.bump();

    let attributes = parse_attributes(&raw, line)?;
    p.emit(Event::Word {
        text: text.trim().to_string(),
        attributes,
    });
    Ok(())
}

/// `\f + \fr 1:1 \ft Or "heavens"\f*`
fn note(p: &mut Parser<'_, '_>) -> Result<(), UsfmError> {
    let line = p.line();
    let tag = marker_name(p);
    p.bump();

    let mut content = String::new();
    while !p.at_closer(&tag) {
        if p.at_end() || p.at_verse_boundary() {
            return Err(UsfmError::UnclosedMarker { marker: tag, line });
        }
        push_collapsed(&mut content, p.current(), p.current_text());
        p.bump();
    }
    p.bump();

    p.emit(Event::Note {
        tag,
        content: content.trim().to_string(),
    });
    Ok(())
}

/// Character markers, paragraph markers, headings and standalone milestones.
fn marker(p: &mut Parser<'_, '_>) -> Result<(), UsfmError> {
    let line = p.line();
    let tag = marker_name(p);
    p.bump();

    if p.eat(TokenKind::SelfClose) {
        // Standalone milestone, e.g. `\ts\*`
        p.emit(Event::Paragraph { tag, content: None });
    } else if p.has_closer(&tag) {
        p.emit(Event::MarkerStart { tag, line });
        p.eat(TokenKind::Whitespace);
    } else if is_heading(&tag) {
        p.eat(TokenKind::Whitespace);
        let content = line_text(p);
        let content = (!content.is_empty()).then_some(content);
        p.emit(Event::Paragraph { tag, content });
    } else {
        p.emit(Event::Paragraph { tag, content: None });
        p.eat(TokenKind::Whitespace);
    }
    Ok(())
}

fn is_heading(tag: &str) -> bool {
    let base = tag.trim_end_matches(|c: char| c.is_ascii_digit());
    HEADING_MARKERS.contains(&base)
}

fn parse_attributes(raw: &str, line: u32) -> Result<Attributes, UsfmError> {
    Attributes::parse(raw).map_err(|e| UsfmError::MalformedAttributes { text: e.0, line })
}
