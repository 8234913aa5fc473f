//! Refine the speaker notes of a PowerPoint presentation with a language model.

use anyhow::Result;
use clap::Parser;
use deck_openai::chat::{DEFAULT_CHAT_URL, DEFAULT_MODEL};
use deck_openai::ChatRefiner;
use deck_pptx::PptxDeck;
use std::path::PathBuf;
use std::process::ExitCode;

/// Refine PowerPoint presentation notes using an OpenAI-compatible chat model.
#[derive(Parser, Debug)]
#[command(name = "deck-refine")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input PowerPoint file
    #[arg(long = "ppt_path")]
    ppt_path: PathBuf,

    /// Path to save the refined PowerPoint file
    #[arg(long = "output_path")]
    output_path: PathBuf,

    /// API key for authentication
    #[arg(long = "api_key", env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Chat completions endpoint, used as given
    #[arg(long = "base_url", env = "OPENAI_CHAT_URL", default_value = DEFAULT_CHAT_URL)]
    base_url: String,

    /// Chat model
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
            eprintln!("Error processing {}: {:#}", args.ppt_path.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let deck = PptxDeck::open(&args.ppt_path)?;
    let refiner = ChatRefiner::new(&args.api_key, &args.base_url).with_model(&args.model);
    deck_cli::refine::refine_presentation(deck, &args.output_path, &refiner)?;
    Ok(())
}
