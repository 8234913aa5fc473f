//! Shared plumbing for the `deck-refine` and `deck-dub` binaries.

pub mod dub;
pub mod refine;

/// Initialize logging; `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
