//! Process-level tests for bridge invocation.

use std::time::{Duration, Instant};

use clibridge::bridge::{BridgeError, CliBridge, GenerationSlot, ProcessSpec};

fn bridge(command: &[&str]) -> CliBridge {
    CliBridge::new(ProcessSpec::new(command.to_vec()).unwrap())
}

#[tokio::test]
async fn cat_echoes_stdin_verbatim() {
    let stdout = bridge(&["cat"])
        .invoke("hello bridge", GenerationSlot::single())
        .await
        .unwrap();
    assert_eq!(stdout, "hello bridge");
}

#[test]
fn blocking_invocation_matches_async() {
    let stdout = bridge(&["cat"])
        .invoke_blocking("hello blocking", GenerationSlot::single())
        .unwrap();
    assert_eq!(stdout, "hello blocking");
}

#[tokio::test]
async fn generation_slot_is_visible_in_env() {
    let bridge = bridge(&[
        "sh",
        "-c",
        r#"printf "%s/%s" "$CLI_GENERATION_INDEX" "$CLI_TOTAL_GENERATIONS""#,
    ]);
    let stdout = bridge
        .invoke("", GenerationSlot::new(2, 3))
        .await
        .unwrap();
    assert_eq!(stdout, "2/3");
}

#[tokio::test]
async fn env_overrides_are_additive() {
    let spec = ProcessSpec::builder(["sh", "-c", r#"printf "%s:%s" "$BRIDGE_HINT" "$PATH""#])
        .env("BRIDGE_HINT", "visible")
        .build()
        .unwrap();
    let stdout = CliBridge::new(spec)
        .invoke("", GenerationSlot::single())
        .await
        .unwrap();

    let (hint, path) = stdout.split_once(':').unwrap();
    assert_eq!(hint, "visible");
    // The inherited environment is merged, not replaced.
    assert!(!path.is_empty());
}

#[tokio::test]
async fn working_dir_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let canonical = dir.path().canonicalize().unwrap();

    let spec = ProcessSpec::builder(["pwd"])
        .working_dir(&canonical)
        .build()
        .unwrap();
    let stdout = CliBridge::new(spec)
        .invoke("", GenerationSlot::single())
        .await
        .unwrap();
    assert_eq!(stdout.trim(), canonical.to_str().unwrap());
}

#[tokio::test]
async fn nonzero_exit_raises_with_streams() {
    let bridge = bridge(&["sh", "-c", "echo intentional failure >&2; exit 2"]);
    let err = bridge
        .invoke("", GenerationSlot::single())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::ExitStatus { code: 2, .. }));
    let message = err.to_string();
    assert!(message.contains("status 2"));
    assert!(message.contains("intentional failure"));
    assert!(message.contains("stdout: <empty>"));
}

#[tokio::test]
async fn invoke_raw_reports_exit_code_without_raising() {
    let result = bridge(&["sh", "-c", "exit 3"])
        .invoke_raw("", GenerationSlot::single())
        .await
        .unwrap();
    assert_eq!(result.exit_code, 3);
    assert!(!result.success());
}

#[tokio::test]
async fn missing_binary_is_a_spawn_error_naming_the_command() {
    let err = bridge(&["definitely-not-a-real-binary-4471"])
        .invoke("", GenerationSlot::single())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::NotFound { .. }));
    assert!(err
        .to_string()
        .contains("definitely-not-a-real-binary-4471"));
}

#[tokio::test]
async fn timeout_kills_the_process_and_reports_partial_output() {
    let spec = ProcessSpec::builder(["sh", "-c", "echo partial; sleep 5"])
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();

    let started = Instant::now();
    let err = CliBridge::new(spec)
        .invoke("", GenerationSlot::single())
        .await
        .unwrap_err();

    // Returned promptly rather than after the full sleep.
    assert!(started.elapsed() < Duration::from_secs(3));
    match err {
        BridgeError::Timeout { stdout, .. } => assert!(stdout.contains("partial")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn timed_out_process_does_not_keep_running() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");

    let spec = ProcessSpec::builder(["sh", "-c", r#"sleep 1; touch "$MARKER_PATH""#])
        .env("MARKER_PATH", marker.to_str().unwrap())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = CliBridge::new(spec)
        .invoke("", GenerationSlot::single())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout { .. }));
    assert!(err.to_string().contains("timed out after 0.1 seconds"));

    // Were the child still alive it would create the marker after its sleep.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn dropped_invocation_kills_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");

    let spec = ProcessSpec::builder(["sh", "-c", r#"sleep 1; touch "$MARKER_PATH""#])
        .env("MARKER_PATH", marker.to_str().unwrap())
        .build()
        .unwrap();
    let bridge = CliBridge::new(spec);

    // No deadline is configured; abandoning the in-flight future is the only
    // thing that can stop the child here.
    let invocation = tokio::spawn(async move {
        let _ = bridge.invoke("", GenerationSlot::single()).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    invocation.abort();
    let _ = invocation.await;

    // Were the child still alive it would create the marker after its sleep.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn child_that_ignores_stdin_still_completes() {
    let stdout = bridge(&["sh", "-c", "echo done"])
        .invoke("unread payload", GenerationSlot::single())
        .await
        .unwrap();
    assert_eq!(stdout.trim(), "done");
}

#[test]
fn dump_state_is_exposed_on_the_bridge() {
    let spec = ProcessSpec::builder(["cat"])
        .option("api_key", serde_json::json!("secret"))
        .build()
        .unwrap();
    let state = CliBridge::new(spec).dump_state();
    assert_eq!(state["command"], serde_json::json!(["cat"]));
    assert!(!state.contains_key("api_key"));
}
