//! Rewrite a presentation's speaker notes through a refinement service.

use anyhow::{Context, Result};
use deck_core::{
    extract_notes, refine_notes, write_refined_notes, DeckSession, NoteRefiner, SlideDeck,
    WriteReport,
};
use std::path::Path;

/// Extract, refine and write back the notes of `deck`, then save it to
/// `output`.
///
/// The deck is closed on every path. A refinement failure leaves all notes
/// unchanged; the presentation is still saved.
pub fn refine_presentation<D, R>(deck: D, output: &Path, refiner: &R) -> Result<WriteReport>
where
    D: SlideDeck,
    R: NoteRefiner + ?Sized,
{
    let mut session = DeckSession::new(deck);

    let notes = extract_notes(&*session).context("Failed to read speaker notes")?;
    println!("Extracted notes from {} slides.", notes.len());

    let refined = refine_notes(refiner, &notes);
    if refined.is_empty() && !notes.is_empty() {
        println!("No refined notes received; the notes are left unchanged.");
    }

    let report = write_refined_notes(&mut *session, &refined);
    println!("Refined notes written to {} slides.", report.written.len());

    session
        .save_as(output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    session.close().context("Failed to close the presentation")?;
    println!("Saved {}", output.display());

    Ok(report)
}
