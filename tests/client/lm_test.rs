//! End-to-end tests for the plain-text LM client.

use std::io::Write;

use clibridge::bridge::{BridgeError, ProcessSpec};
use clibridge::client::{CliLm, TextGenerator};
use clibridge::request::{GenerationOptions, GenerationRequest, Message};

fn lm(command: &[&str]) -> CliLm {
    CliLm::new(ProcessSpec::new(command.to_vec()).unwrap())
}

/// Write a throwaway shell script and return the file handle keeping it
/// alive plus its path.
fn script(body: &str) -> (tempfile::NamedTempFile, String) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "#!/bin/sh").unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.flush().unwrap();
    let path = file.path().to_str().unwrap().to_string();
    (file, path)
}

#[tokio::test]
async fn echo_round_trip_returns_the_transcript() {
    let request = GenerationRequest::new(vec![
        Message::system("system"),
        Message::user("hello"),
    ]);
    let outputs = lm(&["cat"]).generate(&request).await.unwrap();
    assert_eq!(outputs, vec!["SYSTEM:\nsystem\n\nUSER:\nhello".to_string()]);
}

#[test]
fn blocking_round_trip_matches_async() {
    let request = GenerationRequest::from_prompt("hello");
    let outputs = lm(&["cat"]).generate_blocking(&request).unwrap();
    assert_eq!(outputs, vec!["USER:\nhello".to_string()]);
}

#[tokio::test]
async fn n_samples_are_index_aligned() {
    let (_guard, path) = script(r#"printf "idx=%s/%s" "$CLI_GENERATION_INDEX" "$CLI_TOTAL_GENERATIONS""#);
    let request = GenerationRequest::from_prompt("multi")
        .with_options(GenerationOptions::new().with_n(2));

    let outputs = lm(&["sh", &path]).generate(&request).await.unwrap();
    assert_eq!(outputs, vec!["idx=0/2".to_string(), "idx=1/2".to_string()]);
}

#[tokio::test]
async fn zero_samples_is_a_valid_empty_result() {
    // No invocation happens: a missing binary would otherwise fail.
    let request = GenerationRequest::from_prompt("none")
        .with_options(GenerationOptions::new().with_n(0));
    let outputs = lm(&["definitely-not-a-real-binary-4471"])
        .generate(&request)
        .await
        .unwrap();
    assert!(outputs.is_empty());
}

#[tokio::test]
async fn jsonl_stream_yields_the_last_agent_message() {
    let (_guard, path) = script(concat!(
        r#"printf '%s\n' '{"type": "item.completed", "item": {"type": "agent_message", "text": "draft"}}'"#,
        "\n",
        r#"printf '%s\n' '{"type": "item.completed", "item": {"type": "agent_message", "text": "final"}}'"#,
        "\n",
    ));
    let outputs = lm(&["sh", &path])
        .generate(&GenerationRequest::from_prompt("json"))
        .await
        .unwrap();
    assert_eq!(outputs, vec!["final".to_string()]);
}

#[tokio::test]
async fn non_json_stdout_falls_back_to_raw_text() {
    let outputs = lm(&["sh", "-c", r#"printf "{not json""#])
        .generate(&GenerationRequest::from_prompt("fallback"))
        .await
        .unwrap();
    assert_eq!(outputs, vec!["{not json".to_string()]);
}

#[tokio::test]
async fn command_failure_aborts_the_request() {
    let request = GenerationRequest::from_prompt("boom")
        .with_options(GenerationOptions::new().with_n(3));
    let err = lm(&["sh", "-c", "echo intentional failure >&2; exit 2"])
        .generate(&request)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("status 2"));
    assert!(message.contains("intentional failure"));
}

#[tokio::test]
async fn empty_request_is_rejected_before_spawning() {
    let err = lm(&["definitely-not-a-real-binary-4471"])
        .generate(&GenerationRequest::new(Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::EmptyRequest));
}

#[tokio::test]
async fn works_through_the_generator_trait() {
    let lm = lm(&["cat"]);
    let generator: &dyn TextGenerator = &lm;
    let outputs = generator
        .generate(&GenerationRequest::from_prompt("via trait"))
        .await
        .unwrap();
    assert_eq!(outputs, vec!["USER:\nvia trait".to_string()]);
}
