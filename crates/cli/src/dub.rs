//! Narrate a presentation: notes to checkpoint, speech, and embedded audio.

use anyhow::{Context, Result};
use deck_core::{
    extract_notes, insert_audio, synthesize_speech, write_checkpoint, DeckSession, InsertReport,
    MediaPlacement, SlideDeck, SpeechRequest, SpeechSynthesizer, SynthesisReport,
};
use std::path::PathBuf;

/// Where a narration run reads and writes its files.
#[derive(Debug, Clone)]
pub struct DubPaths {
    /// JSON checkpoint of the extracted notes.
    pub notes_file: PathBuf,
    /// Directory the synthesized clips are written to.
    pub audio_dir: PathBuf,
    /// Directory the clips are embedded from.
    pub mp3_dir: PathBuf,
    /// Where the narrated presentation is saved.
    pub output: PathBuf,
}

/// Outcome of a narration run.
#[derive(Debug, Default)]
pub struct DubSummary {
    pub notes: usize,
    pub synthesis: SynthesisReport,
    pub insertion: InsertReport,
}

/// Run the whole narration flow over `deck`.
///
/// Speech is only requested when the deck has notes. Clips are named by
/// slide number, so a slide without notes never receives another slide's
/// narration. The deck is closed on every path.
pub fn dub_presentation<D, S>(
    deck: D,
    paths: &DubPaths,
    synthesizer: &S,
    placement: &MediaPlacement,
) -> Result<DubSummary>
where
    D: SlideDeck,
    S: SpeechSynthesizer + ?Sized,
{
    let mut session = DeckSession::new(deck);
    let mut summary = DubSummary::default();

    let notes = extract_notes(&*session).context("Failed to read speaker notes")?;
    write_checkpoint(&paths.notes_file, &notes)
        .with_context(|| format!("Failed to write {}", paths.notes_file.display()))?;
    summary.notes = notes.len();
    println!("# Notes extracted and saved to {}", paths.notes_file.display());

    if !notes.is_empty() {
        let requests = SpeechRequest::from_notes(&notes);
        summary.synthesis = synthesize_speech(synthesizer, &requests, &paths.audio_dir)
            .with_context(|| {
                format!("Failed to prepare audio directory {}", paths.audio_dir.display())
            })?;
        for (_, path) in &summary.synthesis.written {
            println!("{}", path.display());
        }
        println!("# Audio files generated from notes.");
    }

    summary.insertion = insert_audio(&mut *session, &paths.mp3_dir, placement)
        .with_context(|| format!("Failed to insert audio from {}", paths.mp3_dir.display()))?;
    println!(
        "# Audio inserted into {} slides.",
        summary.insertion.inserted.len()
    );

    session
        .save_as(&paths.output)
        .with_context(|| format!("Failed to save {}", paths.output.display()))?;
    session.close().context("Failed to close the presentation")?;
    println!("# Saved {}", paths.output.display());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{read_checkpoint, Error, MemoryDeck, SlidePosition};
    use std::io::Write;
    use std::path::Path;

    struct FakeSpeech;

    impl SpeechSynthesizer for FakeSpeech {
        fn synthesize(&self, text: &str, out: &mut dyn Write) -> deck_core::Result<u64> {
            if text == "broken" {
                return Err(Error::Transport("HTTP 500".to_string()));
            }
            out.write_all(text.as_bytes())?;
            Ok(text.len() as u64)
        }
    }

    fn paths(root: &Path) -> DubPaths {
        DubPaths {
            notes_file: root.join("notes.json"),
            audio_dir: root.join("audio"),
            mp3_dir: root.join("audio"),
            output: root.join("dubbed.pptx"),
        }
    }

    #[test]
    fn test_narrates_slides_by_number() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        let deck = MemoryDeck::with_notes(&[Some("hello"), None, Some("world")]);
        let probe = deck.probe();

        let summary =
            dub_presentation(deck, &paths, &FakeSpeech, &MediaPlacement::default()).unwrap();

        assert_eq!(summary.notes, 2);
        assert_eq!(read_checkpoint(&paths.notes_file).unwrap(), vec!["hello", "world"]);
        assert!(paths.audio_dir.join("1.mp3").is_file());
        assert!(!paths.audio_dir.join("2.mp3").exists());
        assert!(paths.audio_dir.join("3.mp3").is_file());
        assert_eq!(
            summary.insertion.inserted,
            vec![SlidePosition::new(0), SlidePosition::new(2)]
        );

        let saved = probe.last_save().unwrap();
        assert_eq!(saved.path, paths.output);
        assert_eq!(saved.slides[0].audio.len(), 1);
        assert!(saved.slides[1].audio.is_empty());
        assert_eq!(saved.slides[2].audio[0].0, paths.audio_dir.join("3.mp3"));
        assert_eq!(probe.close_count(), 1);
    }

    #[test]
    fn test_failed_clip_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        let deck = MemoryDeck::with_notes(&[Some("broken"), Some("fine")]);
        let probe = deck.probe();

        let summary =
            dub_presentation(deck, &paths, &FakeSpeech, &MediaPlacement::default()).unwrap();

        assert_eq!(summary.synthesis.failed.len(), 1);
        assert_eq!(summary.insertion.inserted, vec![SlidePosition::new(1)]);
        assert!(!paths.audio_dir.join("1.mp3").exists());
        assert_eq!(probe.saves().len(), 1);
    }

    #[test]
    fn test_deck_without_notes_still_inserts_existing_clips() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = paths(dir.path());
        paths.mp3_dir = dir.path().join("prepared");
        std::fs::create_dir(&paths.mp3_dir).unwrap();
        std::fs::write(paths.mp3_dir.join("2.mp3"), b"ID3").unwrap();

        let deck = MemoryDeck::with_notes(&[None, None]);
        let probe = deck.probe();
        let summary =
            dub_presentation(deck, &paths, &FakeSpeech, &MediaPlacement::default()).unwrap();

        assert_eq!(summary.notes, 0);
        assert!(summary.synthesis.written.is_empty());
        assert!(!paths.audio_dir.exists());
        assert_eq!(read_checkpoint(&paths.notes_file).unwrap(), Vec::<String>::new());
        assert_eq!(summary.insertion.inserted, vec![SlidePosition::new(1)]);
        assert_eq!(probe.close_count(), 1);
    }

    #[test]
    fn test_missing_mp3_directory_fails_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = paths(dir.path());
        paths.mp3_dir = dir.path().join("absent");

        let deck = MemoryDeck::with_notes(&[None]);
        let probe = deck.probe();
        let err = dub_presentation(deck, &paths, &FakeSpeech, &MediaPlacement::default())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NotFound(_))
        ));
        assert!(probe.saves().is_empty());
        assert_eq!(probe.close_count(), 1);
    }
}
