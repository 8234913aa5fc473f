//! Domain types carried between the pipeline stages.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based index of a slide within a presentation.
///
/// This is the only key that correlates records across stages. Audio
/// files use the 1-based [`number`](Self::number) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlidePosition(usize);

impl SlidePosition {
    /// Create a position from a 0-based slide index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Create a position from a 1-based slide number. Returns `None` for 0.
    pub fn from_number(number: usize) -> Option<Self> {
        number.checked_sub(1).map(Self)
    }

    /// 0-based slide index.
    pub const fn index(self) -> usize {
        self.0
    }

    /// 1-based slide number.
    pub const fn number(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for SlidePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slide {}", self.number())
    }
}

/// File name for the n-th (1-based) narration clip.
pub fn audio_file_name(number: usize) -> String {
    format!("{}.mp3", number)
}

/// Speaker notes extracted from one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Position of the slide the notes came from.
    pub position: SlidePosition,

    /// Trimmed, non-empty notes text.
    pub text: String,
}

impl NoteRecord {
    pub fn new(position: SlidePosition, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }
}

/// Notes of a presentation in slide order, at most one record per slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteCollection {
    records: Vec<NoteRecord>,
}

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Positions must be strictly increasing.
    pub fn push(&mut self, record: NoteRecord) -> Result<()> {
        if let Some(last) = self.records.last() {
            if record.position <= last.position {
                return Err(Error::Format(format!(
                    "{} added after {}; notes must follow slide order",
                    record.position, last.position
                )));
            }
        }
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteRecord> {
        self.records.iter()
    }

    /// Whether a record exists for the given slide.
    pub fn contains(&self, position: SlidePosition) -> bool {
        self.get(position).is_some()
    }

    /// Look up the record for a slide.
    pub fn get(&self, position: SlidePosition) -> Option<&NoteRecord> {
        self.records
            .binary_search_by_key(&position, |r| r.position)
            .ok()
            .map(|i| &self.records[i])
    }

    /// Positions of all records, ascending.
    pub fn positions(&self) -> Vec<SlidePosition> {
        self.records.iter().map(|r| r.position).collect()
    }

    /// Note texts in slide order, as written to the checkpoint file.
    pub fn texts(&self) -> Vec<String> {
        self.records.iter().map(|r| r.text.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a NoteCollection {
    type Item = &'a NoteRecord;
    type IntoIter = std::slice::Iter<'a, NoteRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Rewritten notes for one slide, as returned by a refinement service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinedNote {
    /// Slide the content belongs to. Named `index` on the wire.
    #[serde(rename = "index")]
    pub position: SlidePosition,

    /// Replacement notes text.
    pub content: String,
}

impl RefinedNote {
    pub fn new(position: SlidePosition, content: impl Into<String>) -> Self {
        Self {
            position,
            content: content.into(),
        }
    }
}

impl From<&NoteRecord> for RefinedNote {
    fn from(record: &NoteRecord) -> Self {
        Self::new(record.position, record.text.clone())
    }
}

/// Points per centimetre, as used for on-slide placement.
pub const POINTS_PER_CM: f64 = 28.35;

/// Where an embedded audio object is placed on its slide, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaPlacement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl MediaPlacement {
    /// Build a placement from centimetre measurements.
    pub fn from_cm(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left: left * POINTS_PER_CM,
            top: top * POINTS_PER_CM,
            width: width * POINTS_PER_CM,
            height: height * POINTS_PER_CM,
        }
    }
}

impl Default for MediaPlacement {
    /// A 1 cm square near the top-right corner of a widescreen slide.
    fn default() -> Self {
        Self::from_cm(26.5, 0.1, 1.0, 1.0)
    }
}

/// The container format of a presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary).
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}
