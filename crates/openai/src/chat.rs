//! Chat completions adapter that rewrites notes through a forced function call.

use crate::status_error;
use deck_core::{Error, NoteCollection, NoteRefiner, RefinedNote, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default chat completions endpoint.
pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const FUNCTION_NAME: &str = "refine_notes";

const SYSTEM_PROMPT: &str = "You are a helpful assistant for improving presentation notes.";

const INSTRUCTIONS: &str = "You will be provided with a list of notes extracted from a presentation. \
Each note is intended to be presented orally and should be enhanced for better fluency, correctness, \
coherence, and suitability for academic presentations. Please make the expressions natural, clear, \
suitable for speaking, and connect the ideas from different slides smoothly. Ensure that each refined \
note still matches the intent of the original but is more eloquent and fits a formal presentation \
style. The returned result must be in the same format as the provided input, with 'index' and \
'content' keys.";

// Request types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    functions: Vec<FunctionSpec>,
    function_call: FunctionChoice,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct FunctionSpec {
    name: &'static str,
    description: &'static str,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct FunctionChoice {
    name: &'static str,
}

/// The `{"notes": [...]}` payload, sent as the last user message and
/// returned as the function call arguments.
#[derive(Debug, Serialize, Deserialize)]
struct NotesPayload {
    notes: Vec<RefinedNote>,
}

// Response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

/// Refines notes with one chat completions request per collection.
pub struct ChatRefiner {
    api_key: String,
    url: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl ChatRefiner {
    /// Create a refiner posting to `url`, which is used verbatim.
    pub fn new(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            url: url.into(),
            model: DEFAULT_MODEL.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Use a different chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn function_spec() -> FunctionSpec {
        FunctionSpec {
            name: FUNCTION_NAME,
            description: "Enhance presentation notes for better fluency and coherence.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "notes": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "index": {"type": "integer"},
                                "content": {"type": "string"}
                            },
                            "required": ["index", "content"]
                        }
                    }
                },
                "required": ["notes"]
            }),
        }
    }

    /// Build the request body
    fn build_request(&self, notes: &NoteCollection) -> Result<ChatRequest> {
        let payload = NotesPayload {
            notes: notes.iter().map(RefinedNote::from).collect(),
        };

        Ok(ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: INSTRUCTIONS.to_string(),
                },
                Message {
                    role: "user",
                    content: serde_json::to_string(&payload)?,
                },
            ],
            functions: vec![Self::function_spec()],
            function_call: FunctionChoice {
                name: FUNCTION_NAME,
            },
        })
    }

    /// Decode the refined notes from a response body.
    fn parse_response(body: &str) -> Result<Vec<RefinedNote>> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| Error::Format(format!("unexpected chat response: {}", e)))?;

        let arguments = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.function_call)
            .map(|call| call.arguments)
            .ok_or_else(|| Error::Format("response carries no function call".to_string()))?;

        let payload: NotesPayload = serde_json::from_str(&arguments)
            .map_err(|e| Error::Format(format!("malformed {} arguments: {}", FUNCTION_NAME, e)))?;
        Ok(payload.notes)
    }
}

impl NoteRefiner for ChatRefiner {
    fn refine(&self, notes: &NoteCollection) -> Result<Vec<RefinedNote>> {
        let body = self.build_request(notes)?;
        log::debug!("Posting {} notes to {}", notes.len(), self.url);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response));
        }

        let text = response
            .text()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let refined = Self::parse_response(&text)?;
        log::debug!("Received {} refined notes", refined.len());
        Ok(refined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{NoteRecord, SlidePosition};

    fn notes() -> NoteCollection {
        let mut notes = NoteCollection::new();
        notes.push(NoteRecord::new(SlidePosition::new(0), "a")).unwrap();
        notes.push(NoteRecord::new(SlidePosition::new(2), "b")).unwrap();
        notes
    }

    #[test]
    fn test_build_request_has_correct_structure() {
        let refiner = ChatRefiner::new("key", DEFAULT_CHAT_URL);
        let request = refiner.build_request(&notes()).unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"].as_array().unwrap().len(), 3);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(
            value["messages"][2]["content"],
            r#"{"notes":[{"index":0,"content":"a"},{"index":2,"content":"b"}]}"#
        );
        assert_eq!(value["functions"][0]["name"], "refine_notes");
        assert_eq!(
            value["functions"][0]["parameters"]["required"],
            json!(["notes"])
        );
        assert_eq!(value["function_call"], json!({"name": "refine_notes"}));
    }

    #[test]
    fn test_custom_model() {
        let refiner = ChatRefiner::new("key", DEFAULT_CHAT_URL).with_model("gpt-4o-mini");
        let request = refiner.build_request(&notes()).unwrap();
        assert_eq!(request.model, "gpt-4o-mini");
    }

    #[test]
    fn test_parse_function_call_arguments() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": {
                        "name": "refine_notes",
                        "arguments": "{\"notes\":[{\"index\":2,\"content\":\"Better b.\"}]}"
                    }
                }
            }]
        })
        .to_string();

        let refined = ChatRefiner::parse_response(&body).unwrap();
        assert_eq!(refined, vec![RefinedNote::new(SlidePosition::new(2), "Better b.")]);
    }

    #[test]
    fn test_parse_without_function_call_is_format_error() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Sure!"}}]}"#;
        assert!(matches!(
            ChatRefiner::parse_response(body),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_parse_malformed_arguments_is_format_error() {
        let body = json!({
            "choices": [{"message": {"function_call": {"arguments": "{\"notes\": \"oops\"}"}}}]
        })
        .to_string();
        assert!(matches!(
            ChatRefiner::parse_response(&body),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_parse_non_json_is_format_error() {
        assert!(matches!(
            ChatRefiner::parse_response("<html>"),
            Err(Error::Format(_))
        ));
    }
}
