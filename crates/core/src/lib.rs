//! Core domain types, capability traits and pipeline stages for rewriting
//! and narrating PowerPoint speaker notes.

pub mod checkpoint;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod ports;
pub mod session;
pub mod types;

pub use checkpoint::{read_checkpoint, write_checkpoint};
pub use error::{Error, Result};
pub use memory::MemoryDeck;
pub use pipeline::{
    extract_notes, insert_audio, refine_notes, synthesize_speech, write_refined_notes,
    InsertReport, SpeechRequest, SynthesisReport, WriteReport,
};
pub use ports::{NoteRefiner, SlideDeck, SpeechSynthesizer};
pub use session::DeckSession;
pub use types::{
    MediaPlacement, NoteCollection, NoteRecord, PresentationFormat, RefinedNote, SlidePosition,
};
