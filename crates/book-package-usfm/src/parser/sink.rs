//! Sink for converting parser events into a [`UsfmDocument`].

use crate::attributes::Attributes;
use crate::document::{ChapterObjects, Header, UsfmDocument, VerseObject, VerseObjects};
use crate::error::UsfmError;
use crate::parser::event::Event;

/// Where top-level verse objects currently go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// Before the first `\c`; content here is dropped.
    Book,
    /// Between `\c` and the first `\v`.
    Front,
    /// Index into the current chapter's verses.
    Verse(usize),
}

/// An open milestone or character marker collecting its children.
#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    line: u32,
    children: Vec<VerseObject>,
}

#[derive(Debug)]
enum FrameKind {
    Milestone { tag: String, attributes: Attributes },
    Marker { tag: String },
}

impl Frame {
    fn unclosed(self) -> UsfmError {
        match self.kind {
            FrameKind::Milestone { tag, .. } => UsfmError::UnclosedMilestone {
                tag,
                line: self.line,
            },
            FrameKind::Marker { tag } => UsfmError::UnclosedMarker {
                marker: tag,
                line: self.line,
            },
        }
    }
}

/// Builds the document from events, checking that milestones and
/// character markers are balanced within each verse.
pub struct Sink {
    events: Vec<Event>,
    headers: Vec<Header>,
    chapters: Vec<ChapterObjects>,
    target: Target,
    stack: Vec<Frame>,
}

impl Sink {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            headers: Vec::new(),
            chapters: Vec::new(),
            target: Target::Book,
            stack: Vec::new(),
        }
    }

    /// Consume the sink and build the document.
    pub fn finish(mut self) -> Result<UsfmDocument, UsfmError> {
        let events = std::mem::take(&mut self.events);
        for event in events {
            self.process(event)?;
        }
        self.close_verse()?;

        Ok(UsfmDocument {
            headers: self.headers,
            chapters: self.chapters,
        })
    }

    fn process(&mut self, event: Event) -> Result<(), UsfmError> {
        match event {
            Event::Header { tag, content } => {
                self.headers.push(Header { tag, content });
            }
            Event::Chapter { number, .. } => {
                self.close_verse()?;
                self.chapters.push(ChapterObjects::new(number));
                self.target = Target::Front;
            }
            Event::Verse { number, line } => {
                self.close_verse()?;
                let Some(chapter) = self.chapters.last_mut() else {
                    return Err(UsfmError::VerseOutsideChapter {
                        verse: number,
                        line,
                    });
                };
                let index = match chapter.verses.iter().position(|v| v.number == number) {
                    Some(index) => index,
                    None => {
                        chapter.verses.push(VerseObjects {
                            number,
                            objects: Vec::new(),
                        });
                        chapter.verses.len() - 1
                    }
                };
                self.target = Target::Verse(index);
            }
            Event::Word { text, attributes } => {
                self.push(VerseObject::Word { text, attributes });
            }
            Event::Text(text) => self.push(VerseObject::Text { text }),
            Event::MilestoneStart {
                tag,
                attributes,
                line,
            } => self.stack.push(Frame {
                kind: FrameKind::Milestone { tag, attributes },
                line,
                children: Vec::new(),
            }),
            Event::MilestoneEnd { tag, line } => {
                let matches_top = matches!(
                    self.stack.last(),
                    Some(Frame { kind: FrameKind::Milestone { tag: open, .. }, .. }) if *open == tag
                );
                if !matches_top {
                    return Err(UsfmError::UnbalancedMilestone { tag, line });
                }
                if let Some(Frame {
                    kind: FrameKind::Milestone { tag, attributes },
                    children,
                    ..
                }) = self.stack.pop()
                {
                    self.push(VerseObject::Milestone {
                        tag,
                        attributes,
                        children,
                    });
                }
            }
            Event::MarkerStart { tag, line } => self.stack.push(Frame {
                kind: FrameKind::Marker { tag },
                line,
                children: Vec::new(),
            }),
            Event::MarkerEnd { tag, line } => {
                let matches_top = matches!(
                    self.stack.last(),
                    Some(Frame { kind: FrameKind::Marker { tag: open }, .. }) if *open == tag
                );
                if !matches_top {
                    return Err(UsfmError::UnexpectedClosingMarker { marker: tag, line });
                }
                if let Some(Frame {
                    kind: FrameKind::Marker { tag },
                    children,
                    ..
                }) = self.stack.pop()
                {
                    self.push(VerseObject::Marker {
                        tag,
                        content: None,
                        children,
                    });
                }
            }
            Event::Paragraph { tag, content } => self.push(VerseObject::Marker {
                tag,
                content,
                children: Vec::new(),
            }),
            Event::Note { tag, content } => self.push(VerseObject::Note { tag, content }),
        }
        Ok(())
    }

    /// Milestones and character markers never span a verse boundary.
    fn close_verse(&mut self) -> Result<(), UsfmError> {
        match self.stack.pop() {
            // Report the outermost frame: that is the one the author forgot.
            Some(frame) => {
                let outermost = self.stack.drain(..).next().unwrap_or(frame);
                Err(outermost.unclosed())
            }
            None => Ok(()),
        }
    }

    fn push(&mut self, object: VerseObject) {
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(object);
            return;
        }
        match self.target {
            Target::Book => {}
            Target::Front => {
                if let Some(chapter) = self.chapters.last_mut() {
                    chapter.front.push(object);
                }
            }
            Target::Verse(index) => {
                if let Some(verse) = self
                    .chapters
                    .last_mut()
                    .and_then(|chapter| chapter.verses.get_mut(index))
                {
                    verse.objects.push(object);
                }
            }
        }
    }
}
