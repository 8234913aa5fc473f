//! Human-readable checkpoint of the extracted notes.
//!
//! The file is a flat JSON array of note strings in slide order, indented
//! with four spaces. It records texts only: slides without notes are left
//! out, so an entry's array index is not its slide number.

use crate::error::{Error, Result};
use crate::types::NoteCollection;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the note texts of `notes` to `path`, creating parent directories.
pub fn write_checkpoint(path: &Path, notes: &NoteCollection) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    notes.texts().serialize(&mut serializer)?;
    out.flush()?;

    log::debug!("Wrote {} notes to {}", notes.len(), path.display());
    Ok(())
}

/// Read back a checkpoint written by [`write_checkpoint`].
pub fn read_checkpoint(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| Error::from_open(path, e))?;
    let texts = serde_json::from_str(&content)?;
    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NoteRecord, SlidePosition};

    #[test]
    fn test_checkpoint_is_flat_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("notes.json");

        let mut notes = NoteCollection::new();
        notes.push(NoteRecord::new(SlidePosition::new(0), "Grüße")).unwrap();
        notes.push(NoteRecord::new(SlidePosition::new(4), "second")).unwrap();
        write_checkpoint(&path, &notes).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "[\n    \"Grüße\",\n    \"second\"\n]");
        assert_eq!(read_checkpoint(&path).unwrap(), vec!["Grüße", "second"]);
    }

    #[test]
    fn test_empty_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        write_checkpoint(&path, &NoteCollection::new()).unwrap();
        assert!(read_checkpoint(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_checkpoint(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
