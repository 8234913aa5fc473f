//! Capability traits for the external collaborators.
//!
//! The pipeline only talks to a presentation, a refinement service and a
//! speech service through these traits, so each can be swapped for an
//! in-memory double in tests.

use crate::error::Result;
use crate::types::{MediaPlacement, NoteCollection, RefinedNote, SlidePosition};
use std::io::Write;
use std::path::Path;

/// An open, editable presentation.
pub trait SlideDeck {
    /// Number of slides, in document order.
    fn slide_count(&self) -> Result<usize>;

    /// Raw notes text of a slide, or `None` if it has no notes region.
    fn notes(&self, position: SlidePosition) -> Result<Option<String>>;

    /// Replace the notes text of a slide.
    ///
    /// Returns `false` and leaves the slide untouched when it has no notes
    /// region.
    fn set_notes(&mut self, position: SlidePosition, text: &str) -> Result<bool>;

    /// Embed an audio file on a slide.
    fn add_audio(
        &mut self,
        position: SlidePosition,
        audio: &Path,
        placement: &MediaPlacement,
    ) -> Result<()>;

    /// Persist the document to `path`, which must differ from the source.
    fn save_as(&mut self, path: &Path) -> Result<()>;

    /// Release the document. Further calls fail with `Error::NotFound`.
    fn close(&mut self) -> Result<()>;
}

/// A service that rewrites speaker notes.
pub trait NoteRefiner {
    /// Refine the whole collection in one request.
    fn refine(&self, notes: &NoteCollection) -> Result<Vec<RefinedNote>>;
}

/// A service that turns text into speech audio.
pub trait SpeechSynthesizer {
    /// Synthesize `text` and stream the encoded audio into `out`.
    ///
    /// Returns the number of bytes written.
    fn synthesize(&self, text: &str, out: &mut dyn Write) -> Result<u64>;
}
