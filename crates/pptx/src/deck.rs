//! [`SlideDeck`] implementation over a `.pptx` package.

use crate::media;
use crate::notes;
use crate::package::Package;
use crate::parser::{self, SlideParts};
use deck_core::{Error, MediaPlacement, PresentationFormat, Result, SlideDeck, SlidePosition};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// An open `.pptx` presentation, edited in memory until saved.
#[derive(Debug)]
pub struct PptxDeck {
    source: PathBuf,
    package: Option<Package>,
    slides: Vec<SlideParts>,
}

impl PptxDeck {
    /// Open a presentation file.
    ///
    /// Missing and unreadable files fail with [`Error::NotFound`]; legacy
    /// `.ppt` files and anything that is not a ZIP package fail with
    /// [`Error::Format`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| Error::from_open(path, e))?;

        // Read magic bytes to detect format
        let mut magic = [0u8; 8];
        let read = file.read(&mut magic).map_err(|e| Error::from_open(path, e))?;
        let format = PresentationFormat::from_magic(&magic[..read]).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(PresentationFormat::from_extension)
                .filter(|f| *f == PresentationFormat::Ppt)
        });
        match format {
            Some(PresentationFormat::Pptx) => {}
            Some(PresentationFormat::Ppt) => {
                return Err(Error::Format(format!(
                    "{} is a legacy .ppt file; save it as .pptx first",
                    path.display()
                )));
            }
            None => {
                return Err(Error::Format(format!(
                    "{} is not a PowerPoint presentation",
                    path.display()
                )));
            }
        }
        file.seek(SeekFrom::Start(0))?;

        log::debug!("Opening {}", path.display());
        Self::from_reader(BufReader::new(file), path)
    }

    /// Load a presentation from any seekable reader. `source` is the path
    /// that `save_as` refuses to overwrite.
    pub fn from_reader<R: Read + Seek>(reader: R, source: impl Into<PathBuf>) -> Result<Self> {
        let package = Package::read(reader)?;
        let slides = parser::discover_slides(&package)?;
        log::debug!("Found {} slides", slides.len());

        Ok(Self {
            source: source.into(),
            package: Some(package),
            slides,
        })
    }

    /// Path the presentation was opened from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    fn package(&self) -> Result<&Package> {
        self.package
            .as_ref()
            .ok_or_else(|| Error::NotFound(format!("{} has been closed", self.source.display())))
    }

    fn package_mut(&mut self) -> Result<&mut Package> {
        let source = &self.source;
        self.package
            .as_mut()
            .ok_or_else(|| Error::NotFound(format!("{} has been closed", source.display())))
    }

    fn slide(&self, position: SlidePosition) -> Result<&SlideParts> {
        self.slides.get(position.index()).ok_or_else(|| {
            Error::automation(
                position.number(),
                format!("no such slide; the presentation has {}", self.slides.len()),
            )
        })
    }

    fn is_source(&self, path: &Path) -> bool {
        if path == self.source {
            return true;
        }
        match (fs::canonicalize(path), fs::canonicalize(&self.source)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl SlideDeck for PptxDeck {
    fn slide_count(&self) -> Result<usize> {
        self.package()?;
        Ok(self.slides.len())
    }

    fn notes(&self, position: SlidePosition) -> Result<Option<String>> {
        let package = self.package()?;
        let Some(part) = &self.slide(position)?.notes else {
            return Ok(None);
        };

        let content = package.read_str(part)?;
        notes::read_notes_text(&content).map_err(|e| Error::automation(position.number(), e.to_string()))
    }

    fn set_notes(&mut self, position: SlidePosition, text: &str) -> Result<bool> {
        let Some(part) = self.slide(position)?.notes.clone() else {
            return Ok(false);
        };
        let package = self.package_mut()?;

        let content = package.read_str(&part)?;
        let rewritten = notes::replace_notes_text(&content, text)
            .map_err(|e| Error::automation(position.number(), e.to_string()))?;

        match rewritten {
            Some(updated) => {
                package.put(part, updated);
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
        let slide_part = self.slide(position)?.slide.clone();
        let package = self.package_mut()?;

        let bytes = fs::read(audio).map_err(|e| {
            Error::automation(
                position.number(),
                format!("failed to read {}: {}", audio.display(), e),
            )
        })?;

        media::embed_audio(package, &slide_part, bytes, placement)
            .map_err(|e| Error::automation(position.number(), e.to_string()))?;
        log::debug!("Embedded {} into {}", audio.display(), slide_part);
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> Result<()> {
        let package = self.package()?;
        if self.is_source(path) {
            return Err(Error::refuse_overwrite(path));
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        package.write(&mut writer)?;
        writer.flush()?;

        log::debug!("Saved {} parts to {}", package.len(), path.display());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.package.take() {
            Some(_) => {
                log::debug!("Closed {}", self.source.display());
                Ok(())
            }
            None => Err(Error::NotFound(format!(
                "{} has already been closed",
                self.source.display()
            ))),
        }
    }
}
