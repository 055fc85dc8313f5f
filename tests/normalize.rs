//! Tests for payload normalization: status vocabulary, output discovery order,
//! error/progress/queue extraction and the status/field invariants.

use serde_json::json;
use vidshift::normalize::{extract_error, extract_outputs, normalize};
use vidshift::task::TaskStatus;

// ---------------------------------------------------------------------------
// Status mapping
// ---------------------------------------------------------------------------

#[test]
fn completed_and_success_map_to_succeeded_in_any_case() {
    for status in ["COMPLETED", "completed", "Completed", "SUCCESS", "success", "SuCcEsS"] {
        let task = normalize(&json!({"id": "t", "status": status, "outputs": ["https://v"]}));
        assert_eq!(task.status, TaskStatus::Succeeded, "status {status}");
    }
}

#[test]
fn canonical_names_pass_through() {
    for (raw, expected) in [
        ("QUEUED", TaskStatus::Queued),
        ("RUNNING", TaskStatus::Running),
        ("SUCCEEDED", TaskStatus::Succeeded),
        ("FAILED", TaskStatus::Failed),
        ("error", TaskStatus::Failed),
    ] {
        assert_eq!(normalize(&json!({"status": raw})).status, expected, "status {raw}");
    }
}

#[test]
fn unknown_or_missing_status_is_running() {
    assert_eq!(normalize(&json!({"status": "THROTTLED"})).status, TaskStatus::Running);
    assert_eq!(normalize(&json!({"status": "PENDING"})).status, TaskStatus::Running);
    assert_eq!(normalize(&json!({})).status, TaskStatus::Running);
    assert_eq!(normalize(&json!({"status": 3})).status, TaskStatus::Running);
}

#[test]
fn non_object_payload_is_total() {
    for raw in [json!(null), json!("oops"), json!([1, 2, 3]), json!(42)] {
        let task = normalize(&raw);
        assert_eq!(task.status, TaskStatus::Running);
        assert!(task.outputs.is_empty());
        assert_eq!(task.id, "");
        assert_eq!(task.created_at, "");
    }
}

// ---------------------------------------------------------------------------
// Output discovery
// ---------------------------------------------------------------------------

#[test]
fn top_level_outputs_preserve_order_and_drop_unresolvable() {
    let raw = json!({
        "status": "SUCCEEDED",
        "outputs": [
            "https://a.mp4",
            {"url": "https://b.mp4"},
            42,
            {"signedUrl": "https://c.mp4"},
            {"nothing": "here"},
            null,
            {"href": "https://d.mp4"}
        ]
    });
    let task = normalize(&raw);
    assert_eq!(
        task.outputs,
        vec!["https://a.mp4", "https://b.mp4", "https://c.mp4", "https://d.mp4"]
    );
}

#[test]
fn singular_output_string() {
    let raw = json!({"status": "SUCCEEDED", "output": "https://one.mp4"});
    assert_eq!(normalize(&raw).outputs, vec!["https://one.mp4"]);
}

#[test]
fn singular_output_array_and_object() {
    let raw = json!({"status": "SUCCEEDED", "output": [{"videoUri": "https://x"}, "https://y"]});
    assert_eq!(normalize(&raw).outputs, vec!["https://x", "https://y"]);

    let raw = json!({"status": "SUCCEEDED", "output": {"downloadUrl": "https://z"}});
    assert_eq!(normalize(&raw).outputs, vec!["https://z"]);
}

#[test]
fn result_shapes() {
    let cases = [
        json!({"result": ["https://r1"]}),
        json!({"result": {"assets": [{"assetUrl": "https://r1"}]}}),
        json!({"result": {"files": ["https://r1"]}}),
        json!({"result": {"media": [{"uri": "https://r1"}]}}),
        json!({"result": {"output": "https://r1"}}),
        json!({"result": {"output": {"url": "https://r1"}}}),
    ];
    for mut raw in cases {
        raw["status"] = json!("SUCCEEDED");
        assert_eq!(normalize(&raw).outputs, vec!["https://r1"], "payload {raw}");
    }
}

#[test]
fn top_level_assets_files_media() {
    for key in ["assets", "files", "media"] {
        let mut raw = json!({"status": "COMPLETED"});
        raw[key] = json!([{"url": "https://m"}]);
        assert_eq!(normalize(&raw).outputs, vec!["https://m"], "key {key}");
    }
}

#[test]
fn earlier_source_wins_over_later() {
    let raw = json!({
        "status": "SUCCEEDED",
        "outputs": ["https://first"],
        "output": "https://second",
        "result": ["https://third"],
        "assets": ["https://fourth"]
    });
    assert_eq!(normalize(&raw).outputs, vec!["https://first"]);

    let raw = json!({
        "status": "SUCCEEDED",
        "output": "https://second",
        "assets": ["https://fourth"]
    });
    assert_eq!(normalize(&raw).outputs, vec!["https://second"]);
}

#[test]
fn present_but_empty_outputs_is_authoritative() {
    let raw = json!({
        "status": "SUCCEEDED",
        "outputs": [],
        "output": "https://should-not-be-used",
        "assets": ["https://nor-this"]
    });
    assert!(normalize(&raw).outputs.is_empty());
}

#[test]
fn present_result_without_known_shape_stops_search() {
    let raw = json!({
        "status": "SUCCEEDED",
        "result": {"unknown": true},
        "assets": ["https://not-reached"]
    });
    assert!(extract_outputs(&raw).is_empty());
}

#[test]
fn non_array_outputs_field_falls_through() {
    let raw = json!({"status": "SUCCEEDED", "outputs": "oops", "output": "https://ok"});
    assert_eq!(normalize(&raw).outputs, vec!["https://ok"]);
}

#[test]
fn null_output_falls_through() {
    let raw = json!({"status": "SUCCEEDED", "output": null, "media": ["https://m"]});
    assert_eq!(normalize(&raw).outputs, vec!["https://m"]);
}

#[test]
fn outputs_only_reported_when_succeeded() {
    let raw = json!({"status": "RUNNING", "outputs": ["https://partial"]});
    assert!(normalize(&raw).outputs.is_empty());
    // Still discoverable for callers that want the raw view.
    assert_eq!(extract_outputs(&raw), vec!["https://partial"]);
}

// ---------------------------------------------------------------------------
// Error message
// ---------------------------------------------------------------------------

#[test]
fn error_priority_order() {
    let raw = json!({
        "status": "FAILED",
        "failure": {"reason": "content policy"},
        "error": {"message": "second"},
        "message": "fourth"
    });
    assert_eq!(normalize(&raw).error.as_deref(), Some("content policy"));

    let raw = json!({"status": "FAILED", "error": {"message": "second"}, "message": "fourth"});
    assert_eq!(normalize(&raw).error.as_deref(), Some("second"));

    let raw = json!({"status": "FAILED", "error": "third", "message": "fourth"});
    assert_eq!(normalize(&raw).error.as_deref(), Some("third"));

    let raw = json!({"status": "FAILED", "message": "fourth"});
    assert_eq!(normalize(&raw).error.as_deref(), Some("fourth"));
}

#[test]
fn failure_as_plain_string() {
    let raw = json!({"status": "FAILED", "failure": "Input video could not be decoded"});
    assert_eq!(
        normalize(&raw).error.as_deref(),
        Some("Input video could not be decoded")
    );
}

#[test]
fn plain_failure_string_is_last_resort() {
    let raw = json!({
        "status": "FAILED",
        "failure": "generic failure text",
        "error": {"message": "quota exceeded"}
    });
    assert_eq!(normalize(&raw).error.as_deref(), Some("quota exceeded"));

    let raw = json!({"status": "FAILED", "failure": "generic failure text", "message": "last"});
    assert_eq!(normalize(&raw).error.as_deref(), Some("last"));
}

#[test]
fn error_message_is_passed_through_verbatim() {
    let raw = json!({"status": "FAILED", "failure": {"reason": "  bad input\n"}});
    assert_eq!(normalize(&raw).error.as_deref(), Some("  bad input\n"));

    // Only the empty string counts as missing.
    let raw = json!({"status": "FAILED", "failure": {"reason": ""}, "error": " "});
    assert_eq!(normalize(&raw).error.as_deref(), Some(" "));
}

#[test]
fn error_object_without_message_is_skipped() {
    let raw = json!({"status": "FAILED", "error": {"code": 7}, "message": "fallback"});
    assert_eq!(extract_error(&raw).as_deref(), Some("fallback"));
}

#[test]
fn error_only_reported_when_failed() {
    let raw = json!({"status": "RUNNING", "message": "still rendering"});
    assert_eq!(normalize(&raw).error, None);
    let raw = json!({"status": "FAILED"});
    assert_eq!(normalize(&raw).error, None);
}

// ---------------------------------------------------------------------------
// Advisory fields and pass-through
// ---------------------------------------------------------------------------

#[test]
fn progress_and_queue_position_sources() {
    let task = normalize(&json!({"status": "RUNNING", "progress": 0.4, "queuePosition": 2}));
    assert_eq!(task.progress, Some(0.4));
    assert_eq!(task.queue_position, Some(2));

    let task = normalize(&json!({
        "status": "QUEUED",
        "metrics": {"progress": 12},
        "queue": {"position": 5}
    }));
    assert_eq!(task.progress, Some(12.0));
    assert_eq!(task.queue_position, Some(5));
}

#[test]
fn non_numeric_advisory_fields_are_absent() {
    let task = normalize(&json!({
        "status": "RUNNING",
        "progress": "50%",
        "queuePosition": "3",
        "queue": {"position": -1}
    }));
    assert_eq!(task.progress, None);
    assert_eq!(task.queue_position, None);
}

#[test]
fn id_and_timestamps_pass_through_verbatim() {
    let task = normalize(&json!({
        "id": "17f20503-6c24-4c16-946b-35dbbce2af2f",
        "status": "RUNNING",
        "createdAt": "2024-06-01T10:00:00.000Z",
        "updatedAt": "not even a date"
    }));
    assert_eq!(task.id, "17f20503-6c24-4c16-946b-35dbbce2af2f");
    assert_eq!(task.created_at, "2024-06-01T10:00:00.000Z");
    assert_eq!(task.updated_at, "not even a date");
}
