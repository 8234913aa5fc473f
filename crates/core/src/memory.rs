//! In-memory [`SlideDeck`] used to exercise the pipeline without a file.

use crate::error::{Error, Result};
use crate::ports::SlideDeck;
use crate::types::{MediaPlacement, SlidePosition};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One slide of a [`MemoryDeck`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySlide {
    /// Notes region text; `None` when the slide has no notes region.
    pub notes: Option<String>,

    /// Embedded audio clips in insertion order.
    pub audio: Vec<(PathBuf, MediaPlacement)>,
}

/// A snapshot taken on each `save_as`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedDeck {
    pub path: PathBuf,
    pub slides: Vec<MemorySlide>,
}

#[derive(Debug, Default)]
struct ProbeState {
    closes: usize,
    saves: Vec<SavedDeck>,
}

/// Observes a [`MemoryDeck`] after it has been moved into a session.
#[derive(Debug, Clone)]
pub struct DeckProbe(Rc<RefCell<ProbeState>>);

impl DeckProbe {
    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.0.borrow().closes
    }

    /// Every snapshot persisted so far.
    pub fn saves(&self) -> Vec<SavedDeck> {
        self.0.borrow().saves.clone()
    }

    /// The most recent snapshot.
    pub fn last_save(&self) -> Option<SavedDeck> {
        self.0.borrow().saves.last().cloned()
    }
}

/// A presentation held entirely in memory.
#[derive(Debug)]
pub struct MemoryDeck {
    source: PathBuf,
    slides: Vec<MemorySlide>,
    failing: HashSet<SlidePosition>,
    closed: bool,
    state: Rc<RefCell<ProbeState>>,
}

impl MemoryDeck {
    /// Create a deck from per-slide notes; `None` means no notes region.
    pub fn with_notes(notes: &[Option<&str>]) -> Self {
        Self {
            source: PathBuf::from("memory.pptx"),
            slides: notes
                .iter()
                .map(|n| MemorySlide {
                    notes: n.map(str::to_string),
                    audio: Vec::new(),
                })
                .collect(),
            failing: HashSet::new(),
            closed: false,
            state: Rc::default(),
        }
    }

    /// Path the deck pretends to have been opened from.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    /// Make every operation on the given slide fail.
    pub fn failing_on(mut self, position: SlidePosition) -> Self {
        self.failing.insert(position);
        self
    }

    /// A handle that stays valid after the deck is moved or dropped.
    pub fn probe(&self) -> DeckProbe {
        DeckProbe(Rc::clone(&self.state))
    }

    /// Current state of a slide.
    pub fn slide(&self, position: SlidePosition) -> Option<&MemorySlide> {
        self.slides.get(position.index())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::NotFound(format!(
                "{} has been closed",
                self.source.display()
            )));
        }
        Ok(())
    }

    fn slide_mut(&mut self, position: SlidePosition) -> Result<&mut MemorySlide> {
        self.ensure_open()?;
        if self.failing.contains(&position) {
            return Err(Error::automation(position.number(), "simulated editor failure"));
        }
        self.slides
            .get_mut(position.index())
            .ok_or_else(|| Error::automation(position.number(), "no such slide"))
    }
}

impl SlideDeck for MemoryDeck {
    fn slide_count(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.slides.len())
    }

    fn notes(&self, position: SlidePosition) -> Result<Option<String>> {
        self.ensure_open()?;
        if self.failing.contains(&position) {
            return Err(Error::automation(position.number(), "simulated editor failure"));
        }
        self.slides
            .get(position.index())
            .map(|s| s.notes.clone())
            .ok_or_else(|| Error::automation(position.number(), "no such slide"))
    }

    fn set_notes(&mut self, position: SlidePosition, text: &str) -> Result<bool> {
        let slide = self.slide_mut(position)?;
        match slide.notes.as_mut() {
            Some(notes) => {
                *notes = text.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn add_audio(
        &mut self,
        position: SlidePosition,
        audio: &Path,
        placement: &MediaPlacement,
    ) -> Result<()> {
        let slide = self.slide_mut(position)?;
        if !audio.is_file() {
            return Err(Error::automation(
                position.number(),
                format!("audio file {} not found", audio.display()),
            ));
        }
        slide.audio.push((audio.to_path_buf(), *placement));
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> Result<()> {
        self.ensure_open()?;
        if path == self.source {
            return Err(Error::refuse_overwrite(path));
        }
        self.state.borrow_mut().saves.push(SavedDeck {
            path: path.to_path_buf(),
            slides: self.slides.clone(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        self.state.borrow_mut().closes += 1;
        Ok(())
    }
}
