//! The extract → transform → write stages shared by both tools.

use crate::error::{Error, Result};
use crate::ports::{NoteRefiner, SlideDeck, SpeechSynthesizer};
use crate::types::{
    audio_file_name, MediaPlacement, NoteCollection, NoteRecord, RefinedNote, SlidePosition,
};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Matches narration clip names such as `12.mp3`; zero-padded names are not clips.
static AUDIO_FILE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([1-9]\d*)\.mp3$").unwrap());

/// Collect the trimmed, non-empty notes of every slide in order.
///
/// A slide whose notes cannot be read is logged and skipped.
pub fn extract_notes<D: SlideDeck + ?Sized>(deck: &D) -> Result<NoteCollection> {
    let count = deck.slide_count()?;
    let mut notes = NoteCollection::new();

    for index in 0..count {
        let position = SlidePosition::new(index);
        let text = match deck.notes(position) {
            Ok(Some(text)) => text,
            Ok(None) => continue,
            Err(e) => {
                log::error!("Error extracting notes from {}: {}", position, e);
                continue;
            }
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        notes.push(NoteRecord::new(position, trimmed))?;
    }

    log::debug!("Extracted notes from {} of {} slides", notes.len(), count);
    Ok(notes)
}

/// Ask the refiner for improved notes.
///
/// Never fails: an empty collection skips the call, and any error from the
/// service is logged and turned into an empty result, meaning "no changes
/// available". Records that point at a slide that was not extracted, or
/// that repeat a slide, are dropped.
pub fn refine_notes<R: NoteRefiner + ?Sized>(refiner: &R, notes: &NoteCollection) -> Vec<RefinedNote> {
    if notes.is_empty() {
        log::info!("No notes to refine");
        return Vec::new();
    }

    let refined = match refiner.refine(notes) {
        Ok(refined) => refined,
        Err(e) => {
            log::error!("An error occurred during the refinement request: {}", e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    refined
        .into_iter()
        .filter(|note| {
            if !notes.contains(note.position) {
                log::warn!("Ignoring refined notes for {}, which had no notes", note.position);
                return false;
            }
            if !seen.insert(note.position) {
                log::warn!("Ignoring duplicate refined notes for {}", note.position);
                return false;
            }
            true
        })
        .collect()
}

/// Outcome of writing refined notes back into a deck.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WriteReport {
    /// Slides whose notes were replaced.
    pub written: Vec<SlidePosition>,
    /// Slides skipped because they have no notes region.
    pub without_notes: Vec<SlidePosition>,
    /// Slides where the edit failed, with the error message.
    pub failed: Vec<(SlidePosition, String)>,
}

/// Replace each referenced slide's notes with the refined content.
///
/// Slides not named in `refined` are left alone.
pub fn write_refined_notes<D: SlideDeck + ?Sized>(deck: &mut D, refined: &[RefinedNote]) -> WriteReport {
    let mut report = WriteReport::default();

    for note in refined {
        match deck.set_notes(note.position, &note.content) {
            Ok(true) => report.written.push(note.position),
            Ok(false) => {
                log::debug!("{} has no notes region; left unchanged", note.position);
                report.without_notes.push(note.position);
            }
            Err(e) => {
                log::error!("Error writing notes to {}: {}", note.position, e);
                report.failed.push((note.position, e.to_string()));
            }
        }
    }

    report
}

/// One text to synthesize, tagged with the number of the file it goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    /// 1-based number; the clip is written to `{number}.mp3`.
    pub number: usize,
    pub text: String,
}

impl SpeechRequest {
    /// One request per note, numbered by the slide it came from.
    pub fn from_notes(notes: &NoteCollection) -> Vec<Self> {
        notes
            .iter()
            .map(|record| Self {
                number: record.position.number(),
                text: record.text.clone(),
            })
            .collect()
    }

    /// One request per text, numbered 1..=N in list order.
    pub fn sequence<S: AsRef<str>>(texts: &[S]) -> Vec<Self> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| Self {
                number: i + 1,
                text: text.as_ref().to_string(),
            })
            .collect()
    }

    /// Name of the clip file.
    pub fn file_name(&self) -> String {
        audio_file_name(self.number)
    }
}

/// Outcome of a synthesis run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SynthesisReport {
    /// Files written, by request number.
    pub written: Vec<(usize, PathBuf)>,
    /// Request numbers skipped because their text was empty.
    pub skipped: Vec<usize>,
    /// Request numbers whose call failed, with the error message.
    pub failed: Vec<(usize, String)>,
}

/// Synthesize every request into `{number}.mp3` under `output_dir`.
///
/// The directory is created if needed. A failing request is logged and
/// recorded; the remaining requests still run, and no partial file is left
/// behind for the failed one. An empty text removes any clip already at its
/// number.
pub fn synthesize_speech<S: SpeechSynthesizer + ?Sized>(
    synthesizer: &S,
    requests: &[SpeechRequest],
    output_dir: &Path,
) -> Result<SynthesisReport> {
    fs::create_dir_all(output_dir)?;
    let mut report = SynthesisReport::default();

    for request in requests {
        let path = output_dir.join(request.file_name());
        if request.text.trim().is_empty() {
            log::debug!("Skipping empty text for {}", request.file_name());
            remove_stale_clip(&path);
            report.skipped.push(request.number);
            continue;
        }

        match write_clip(synthesizer, &request.text, &path) {
            Ok(bytes) => {
                log::info!("{} ({} bytes)", path.display(), bytes);
                report.written.push((request.number, path));
            }
            Err(e) => {
                log::error!("Error generating audio for {}: {}", request.file_name(), e);
                remove_stale_clip(&path);
                report.failed.push((request.number, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Remove a clip that must not survive this run, such as a partial write or
/// one left by an earlier run for a now-empty text.
fn remove_stale_clip(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

fn write_clip<S: SpeechSynthesizer + ?Sized>(synthesizer: &S, text: &str, path: &Path) -> Result<u64> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    let bytes = synthesizer.synthesize(text, &mut out)?;
    out.flush()?;
    Ok(bytes)
}

/// Outcome of embedding narration clips.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InsertReport {
    /// Slides that received a clip.
    pub inserted: Vec<SlidePosition>,
    /// Slides where embedding failed, with the error message.
    pub failed: Vec<(SlidePosition, String)>,
}

/// Find the narration clips in `dir`, keyed by 1-based slide number.
pub fn find_audio_files(dir: &Path) -> Result<BTreeMap<usize, PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::from_open(dir, e))?;
    let mut files = BTreeMap::new();

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(caps) = AUDIO_FILE_REGEX.captures(name) else {
            continue;
        };
        if let Ok(number) = caps[1].parse::<usize>() {
            if entry.path().is_file() {
                files.insert(number, entry.path());
            }
        }
    }

    Ok(files)
}

/// Embed `{n}.mp3` from `dir` into slide n for every slide that has one.
///
/// Each slide is independent: a failure is logged with the slide number and
/// the remaining slides are still processed.
pub fn insert_audio<D: SlideDeck + ?Sized>(
    deck: &mut D,
    dir: &Path,
    placement: &MediaPlacement,
) -> Result<InsertReport> {
    let files = find_audio_files(dir)?;
    let count = deck.slide_count()?;
    let mut report = InsertReport::default();

    for (&number, path) in &files {
        match SlidePosition::from_number(number) {
            Some(position) if position.index() < count => {}
            _ => log::warn!(
                "Ignoring {}: the presentation has {} slides",
                path.display(),
                count
            ),
        }
    }

    for index in 0..count {
        let position = SlidePosition::new(index);
        let Some(path) = files.get(&position.number()) else {
            continue;
        };

        match deck.add_audio(position, path, placement) {
            Ok(()) => {
                log::debug!("Inserted {} into {}", path.display(), position);
                report.inserted.push(position);
            }
            Err(e) => {
                log::error!("Error inserting audio into {}: {}", position, e);
                report.failed.push((position, e.to_string()));
            }
        }
    }

    Ok(report)
}
