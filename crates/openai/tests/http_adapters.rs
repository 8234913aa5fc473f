//! Adapter tests against a local mock server.
//!
//! The adapters use the blocking client, so each call runs on a blocking
//! thread while the mock server lives on the async runtime.

use deck_core::{
    refine_notes, synthesize_speech, Error, NoteCollection, NoteRecord, NoteRefiner, RefinedNote,
    SlidePosition, SpeechRequest, SpeechSynthesizer,
};
use deck_openai::{ChatRefiner, SpeechClient};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notes() -> NoteCollection {
    let mut notes = NoteCollection::new();
    notes.push(NoteRecord::new(SlidePosition::new(0), "a")).unwrap();
    notes.push(NoteRecord::new(SlidePosition::new(2), "b")).unwrap();
    notes
}

fn function_call_response(arguments: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "function_call": {
                    "name": "refine_notes",
                    "arguments": arguments.to_string()
                }
            },
            "finish_reason": "stop"
        }]
    }))
}

#[tokio::test(flavor = "multi_thread")]
async fn refine_posts_collection_and_reads_function_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "function_call": {"name": "refine_notes"}
        })))
        .respond_with(function_call_response(json!({
            "notes": [
                {"index": 0, "content": "Refined a."},
                {"index": 2, "content": "Refined b."}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/v1/chat/completions", server.uri());
    let refined = tokio::task::spawn_blocking(move || {
        ChatRefiner::new("sk-test", url).refine(&notes())
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        refined,
        vec![
            RefinedNote::new(SlidePosition::new(0), "Refined a."),
            RefinedNote::new(SlidePosition::new(2), "Refined b."),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn refine_unauthorized_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let url = format!("{}/v1/chat/completions", server.uri());
    let result = tokio::task::spawn_blocking(move || ChatRefiner::new("nope", url).refine(&notes()))
        .await
        .unwrap();

    assert!(matches!(result, Err(Error::Transport(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn refine_server_error_degrades_to_no_changes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/v1/chat/completions", server.uri());
    let refined = tokio::task::spawn_blocking(move || {
        refine_notes(&ChatRefiner::new("sk-test", url), &notes())
    })
    .await
    .unwrap();

    assert!(refined.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn refine_connection_error_degrades_to_no_changes() {
    let server = MockServer::start().await;
    let url = format!("{}/v1/chat/completions", server.uri());
    drop(server);

    let refined = tokio::task::spawn_blocking(move || {
        refine_notes(&ChatRefiner::new("sk-test", url), &notes())
    })
    .await
    .unwrap();

    assert!(refined.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn speech_streams_body_into_writer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({"model": "tts-1", "voice": "fable", "input": "Hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3audio".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let base_url = format!("{}/v1", server.uri());
    let (written, bytes) = tokio::task::spawn_blocking(move || {
        let mut out = Vec::new();
        let written = SpeechClient::new("sk-test", base_url).synthesize("Hello", &mut out);
        (written, out)
    })
    .await
    .unwrap();

    assert_eq!(written.unwrap(), 8);
    assert_eq!(bytes, b"ID3audio");
}

#[tokio::test(flavor = "multi_thread")]
async fn speech_run_skips_empty_and_failed_texts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(body_partial_json(json!({"input": "broken"})))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad input"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("audio");
    let base_url = format!("{}/v1", server.uri());
    let run_dir = output.clone();
    let report = tokio::task::spawn_blocking(move || {
        let client = SpeechClient::new("sk-test", base_url).with_voice("nova");
        let requests = SpeechRequest::sequence(&["hello", "", "broken", "world"]);
        synthesize_speech(&client, &requests, &run_dir)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(report.skipped, vec![2]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 3);
    assert!(output.join("1.mp3").is_file());
    assert!(!output.join("2.mp3").exists());
    assert!(!output.join("3.mp3").exists());
    assert!(output.join("4.mp3").is_file());
}
