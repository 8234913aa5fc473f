//! Narrate a PowerPoint presentation: extract notes, synthesize speech and
//! embed one clip per slide.

use anyhow::Result;
use clap::Parser;
use deck_cli::dub::{dub_presentation, DubPaths};
use deck_core::MediaPlacement;
use deck_openai::speech::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_VOICE};
use deck_openai::SpeechClient;
use deck_pptx::PptxDeck;
use std::path::PathBuf;
use std::process::ExitCode;

/// PowerPoint audio automation tool.
#[derive(Parser, Debug)]
#[command(name = "deck-dub")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the PowerPoint file
    #[arg(long = "pptx_path")]
    pptx_path: PathBuf,

    /// Path to save the updated PowerPoint file
    #[arg(long = "output_pptx_path")]
    output_pptx_path: PathBuf,

    /// API key for the speech service
    #[arg(long = "api_key", env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// API base URL
    #[arg(long = "base_url", env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Path to save extracted notes (JSON)
    #[arg(long = "output_notes_file")]
    output_notes_file: PathBuf,

    /// Directory to save generated audio files
    #[arg(long = "audio_output_directory")]
    audio_output_directory: PathBuf,

    /// Directory containing audio files for insertion (default: the audio output directory)
    #[arg(long = "mp3_directory")]
    mp3_directory: Option<PathBuf>,

    /// Speech voice
    #[arg(long, default_value = DEFAULT_VOICE)]
    voice: String,

    /// Speech model
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    deck_cli::init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error processing {}: {:#}", args.pptx_path.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let paths = DubPaths {
        notes_file: args.output_notes_file.clone(),
        audio_dir: args.audio_output_directory.clone(),
        mp3_dir: args
            .mp3_directory
            .clone()
            .unwrap_or_else(|| args.audio_output_directory.clone()),
        output: args.output_pptx_path.clone(),
    };

    let deck = PptxDeck::open(&args.pptx_path)?;
    let speech = SpeechClient::new(&args.api_key, &args.base_url)
        .with_model(&args.model)
        .with_voice(&args.voice);

    let summary = dub_presentation(deck, &paths, &speech, &MediaPlacement::default())?;
    log::info!(
        "{} notes, {} clips written, {} failed, {} inserted",
        summary.notes,
        summary.synthesis.written.len(),
        summary.synthesis.failed.len(),
        summary.insertion.inserted.len()
    );
    Ok(())
}
