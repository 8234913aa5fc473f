//! The OOXML package held in memory as an ordered list of ZIP parts.

use deck_core::{Error, Result};
use std::io::{Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

/// All parts of a presentation, in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Load every file entry of a ZIP archive.
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::Zip(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", name, e)))?;
            parts.push(Part { name, data });
        }

        Ok(Self { parts })
    }

    /// Write every part into a new ZIP archive.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        for part in &self.parts {
            // Media is already compressed.
            let method = if is_media(&part.name) {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            let options = FileOptions::default().compression_method(method);

            zip.start_file(part.name.as_str(), options)
                .map_err(|e| Error::Zip(format!("Failed to add '{}': {}", part.name, e)))?;
            zip.write_all(&part.data)?;
        }

        zip.finish()
            .map_err(|e| Error::Zip(format!("Failed to finish archive: {}", e)))?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Read a part as UTF-8 text.
    pub fn read_str(&self, name: &str) -> Result<String> {
        let data = self
            .get(name)
            .ok_or_else(|| Error::Zip(format!("File not found in archive '{}'", name)))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| Error::Format(format!("'{}' is not valid UTF-8: {}", name, e)))
    }

    /// Read a part as UTF-8 text if it exists.
    pub fn read_str_opt(&self, name: &str) -> Result<Option<String>> {
        if self.contains(name) {
            self.read_str(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Replace a part, or append it if it does not exist yet.
    pub fn put(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        let name = name.into();
        let data = data.into();
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part { name, data }),
        }
    }

    /// First free name of the form `{stem}{n}.{ext}`, counting from 1.
    pub fn unused_name(&self, stem: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{}{}.{}", stem, n, ext))
            .find(|name| !self.contains(name))
            .unwrap_or_else(|| format!("{}.{}", stem, ext))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn is_media(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    [".mp3", ".m4a", ".wav", ".png", ".jpg", ".jpeg"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}
