//! PPTX (Office Open XML) backend for reading and rewriting speaker notes
//! and embedding narration audio.
//!
//! A .pptx file is a ZIP archive of XML parts. The whole package is loaded
//! into memory on open and written back out by `save_as`.

pub mod deck;
mod media;
mod notes;
mod package;
mod parser;
mod rels;
mod xml;

pub use deck::PptxDeck;
