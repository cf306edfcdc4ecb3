//! End-to-end tests for the schema-aware adapter client.

use clibridge::bridge::{BridgeError, ProcessSpec};
use clibridge::client::CliAdapter;
use clibridge::codec::CompletionOutput;
use clibridge::request::{FieldSpec, GenerationOptions, GenerationRequest, SchemaSpec};

fn adapter(command: &[&str]) -> CliAdapter {
    CliAdapter::new(ProcessSpec::new(command.to_vec()).unwrap())
}

fn math_request(question: &str) -> GenerationRequest {
    GenerationRequest::from_prompt(question)
        .with_input("question", question)
        .with_schema(
            SchemaSpec::new("math")
                .with_input(FieldSpec::required("question", "str"))
                .with_output(FieldSpec::required("answer", "str")),
        )
}

#[tokio::test]
async fn structured_round_trip_returns_field_maps() {
    let adapter = adapter(&[
        "sh",
        "-c",
        r#"cat >/dev/null; printf '{"outputs": [{"answer": "four"}]}'"#,
    ]);
    let outputs = adapter.generate(&math_request("2 + 2?")).await.unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].field("answer"), Some("four"));
}

#[test]
fn blocking_round_trip_matches_async() {
    let adapter = adapter(&["sh", "-c", r#"cat >/dev/null; printf '["plain"]'"#]);
    let outputs = adapter.generate_blocking(&math_request("q")).unwrap();
    assert_eq!(outputs, vec![CompletionOutput::Text("plain".to_string())]);
}

#[tokio::test]
async fn n_samples_collect_one_output_per_invocation() {
    let adapter = adapter(&[
        "sh",
        "-c",
        r#"cat >/dev/null; printf '{"outputs": ["gen %s"]}' "$CLI_GENERATION_INDEX""#,
    ]);
    let request = math_request("color?").with_options(GenerationOptions::new().with_n(2));

    let outputs = adapter.generate(&request).await.unwrap();
    assert_eq!(
        outputs,
        vec![
            CompletionOutput::Text("gen 0".to_string()),
            CompletionOutput::Text("gen 1".to_string()),
        ]
    );
}

#[tokio::test]
async fn invalid_json_is_a_decode_error_carrying_stdout() {
    let adapter = adapter(&["sh", "-c", r#"cat >/dev/null; printf '{not json'"#]);
    let err = adapter.generate(&math_request("q")).await.unwrap_err();

    match err {
        BridgeError::Decode { stdout, .. } => assert_eq!(stdout, "{not json"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn batch_response_for_a_single_slot_is_rejected() {
    let adapter = adapter(&[
        "sh",
        "-c",
        r#"cat >/dev/null; printf '{"outputs": ["a", "b"]}'"#,
    ]);
    let err = adapter.generate(&math_request("q")).await.unwrap_err();
    assert!(err.to_string().contains("got 2"));
}

#[tokio::test]
async fn process_failure_wins_over_decoding() {
    let adapter = adapter(&["sh", "-c", "echo intentional failure >&2; exit 2"]);
    let err = adapter.generate(&math_request("boom")).await.unwrap_err();
    assert!(matches!(err, BridgeError::ExitStatus { code: 2, .. }));
}

#[tokio::test]
async fn payload_reaches_the_process_on_stdin() {
    // The process proves it saw the payload by echoing a marker only present
    // in the structured encoding.
    let adapter = adapter(&[
        "sh",
        "-c",
        r#"if grep -q '"signature"' >/dev/null 2>&1; then printf '["saw signature"]'; else printf '["missing"]'; fi"#,
    ]);
    let outputs = adapter.generate(&math_request("q")).await.unwrap();
    assert_eq!(outputs[0].as_text(), Some("saw signature"));
}
