//! Text-to-speech adapter for the `/audio/speech` endpoint.

use crate::status_error;
use deck_core::{Error, Result, SpeechSynthesizer};
use serde::Serialize;
use std::io::Write;

/// Default speech model.
pub const DEFAULT_MODEL: &str = "tts-1";

/// Default narration voice.
pub const DEFAULT_VOICE: &str = "fable";

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

/// Synthesizes speech with a fixed model and voice.
pub struct SpeechClient {
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
    client: reqwest::blocking::Client,
}

impl SpeechClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Build the endpoint URL
    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.base_url.trim_end_matches('/'))
    }
}

impl SpeechSynthesizer for SpeechClient {
    fn synthesize(&self, text: &str, out: &mut dyn Write) -> Result<u64> {
        let body = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
        };

        let mut response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response));
        }

        let written = response
            .copy_to(out)
            .map_err(|e| Error::Transport(format!("audio stream interrupted: {}", e)))?;
        if written == 0 {
            return Err(Error::Format("speech service returned no audio".to_string()));
        }
        Ok(written)
    }
}
