//! Submission preconditions and the request body they produce.

use vidshift::config::GenerationDefaults;
use vidshift::dispatch::GenerationRequest;
use vidshift::error::VidshiftError;
use vidshift::validation::{ALLOWED_RATIOS, validate_task_id};

const VIDEO: &str = "https://cdn.example.com/clip.mp4";

fn field_of(err: VidshiftError) -> &'static str {
    match err {
        VidshiftError::Validation { field, .. } => field,
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn valid_request_builds() {
    let req = GenerationRequest::new("make it snow", "gen4_aleph", "1280:720", VIDEO, Some(7));
    assert!(req.is_ok());
}

#[test]
fn every_allowed_ratio_passes() {
    for ratio in ALLOWED_RATIOS {
        assert!(
            GenerationRequest::new("p", "gen4_aleph", ratio, VIDEO, None).is_ok(),
            "ratio {ratio}"
        );
    }
}

#[test]
fn unlisted_ratio_names_ratio_field() {
    let err = GenerationRequest::new("p", "gen4_aleph", "999:999", VIDEO, None).unwrap_err();
    assert_eq!(field_of(err), "ratio");
}

#[test]
fn unlisted_model_names_model_field() {
    let err = GenerationRequest::new("p", "gen3a_turbo", "1280:720", VIDEO, None).unwrap_err();
    assert_eq!(field_of(err), "model");
}

#[test]
fn empty_and_long_prompts_rejected() {
    let err = GenerationRequest::new("   ", "gen4_aleph", "1280:720", VIDEO, None).unwrap_err();
    assert_eq!(field_of(err), "promptText");

    let long = "x".repeat(501);
    let err = GenerationRequest::new(&long, "gen4_aleph", "1280:720", VIDEO, None).unwrap_err();
    assert_eq!(field_of(err), "promptText");

    let max = "x".repeat(500);
    assert!(GenerationRequest::new(&max, "gen4_aleph", "1280:720", VIDEO, None).is_ok());
}

#[test]
fn non_https_video_rejected() {
    for uri in ["http://cdn.example.com/a.mp4", "", "file:///tmp/a.mp4", "cdn.example.com/a.mp4"] {
        let err = GenerationRequest::new("p", "gen4_aleph", "1280:720", uri, None).unwrap_err();
        assert_eq!(field_of(err), "videoUri", "uri {uri:?}");
    }
}

#[test]
fn oversized_seed_rejected() {
    let err = GenerationRequest::new("p", "gen4_aleph", "1280:720", VIDEO, Some(1 << 40))
        .unwrap_err();
    assert_eq!(field_of(err), "seed");
}

#[test]
fn validation_errors_are_not_retryable() {
    let err = GenerationRequest::new("p", "gen4_aleph", "1:1", VIDEO, None).unwrap_err();
    assert!(!err.is_retryable());
    assert_eq!(err.kind(), "validation");
    assert!(err.user_message().contains("ratio"));
}

#[test]
fn body_is_trimmed_and_omits_absent_optionals() {
    let req = GenerationRequest::new(
        "  add neon lights  ",
        " gen4_aleph ",
        " 960:960 ",
        "  https://cdn.example.com/clip.mp4 ",
        None,
    )
    .unwrap();
    let body = req.to_body();
    assert_eq!(body["promptText"], "add neon lights");
    assert_eq!(body["model"], "gen4_aleph");
    assert_eq!(body["ratio"], "960:960");
    assert_eq!(body["videoUri"], VIDEO);
    assert!(body.get("seed").is_none());
    assert!(body.get("references").is_none());
    assert!(body.get("contentModeration").is_none());
}

#[test]
fn body_carries_seed_and_configured_extras() {
    let defaults = GenerationDefaults {
        reference_images: vec!["https://img.example.com/style.webp".to_string()],
        ..GenerationDefaults::default()
    };
    let body = GenerationRequest::new("p", "gen4_aleph", "720:1280", VIDEO, Some(123))
        .unwrap()
        .with_defaults(&defaults)
        .to_body();

    assert_eq!(body["seed"], 123);
    assert_eq!(body["references"][0]["type"], "image");
    assert_eq!(body["references"][0]["uri"], "https://img.example.com/style.webp");
    assert_eq!(body["contentModeration"]["publicFigureThreshold"], "auto");
}

#[test]
fn task_ids_must_be_path_safe() {
    assert!(validate_task_id("17f20503-6c24-4c16-946b-35dbbce2af2f").is_ok());
    assert!(validate_task_id("task_01").is_ok());
    for bad in ["", "../secrets", "a/b", "id?x=1", "id#frag", "has space"] {
        assert!(validate_task_id(bad).is_err(), "id {bad:?}");
    }
}
