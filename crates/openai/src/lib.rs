//! Blocking HTTP adapters for OpenAI-compatible services.
//!
//! [`ChatRefiner`] implements [`deck_core::NoteRefiner`] over the chat
//! completions endpoint with a forced function call, and [`SpeechClient`]
//! implements [`deck_core::SpeechSynthesizer`] over the speech endpoint.

pub mod chat;
pub mod speech;

pub use chat::ChatRefiner;
pub use speech::SpeechClient;

use deck_core::Error;

/// Map a non-success HTTP response to a transport error.
fn status_error(response: reqwest::blocking::Response) -> Error {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::Transport("invalid API key (HTTP 401)".to_string());
    }

    let body = response
        .text()
        .unwrap_or_else(|_| "Unknown error".to_string());
    Error::Transport(format!("HTTP {}: {}", status, body.trim()))
}
