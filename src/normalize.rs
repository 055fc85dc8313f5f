//! Maps the video service's task payloads onto [`RemoteTask`].
//!
//! The service (and the proxies in front of it) report outputs, errors and
//! progress under several different field names. Each lookup here is an ordered
//! list of extractor functions tried against the raw JSON; the first extractor
//! that finds its field decides the result. Normalization is pure and total:
//! any field that cannot be read simply comes back absent.

use serde_json::Value;

use crate::task::{RemoteTask, TaskStatus};

/// Field names that may carry a URL inside an output object, in priority order.
pub const URL_FIELDS: [&str; 7] = [
    "uri",
    "url",
    "signedUrl",
    "downloadUrl",
    "videoUri",
    "assetUrl",
    "href",
];

/// Returns `Some(urls)` when the extractor's source field is present, even if
/// it yields no usable URLs. `None` means "not here, try the next source".
pub type OutputExtractor = fn(&Value) -> Option<Vec<String>>;

pub type MessageExtractor = fn(&Value) -> Option<String>;

/// Output sources, tried in order.
pub const OUTPUT_EXTRACTORS: [OutputExtractor; 6] = [
    top_level_outputs,
    singular_output,
    result_field,
    top_level_assets,
    top_level_files,
    top_level_media,
];

/// Error message sources, tried in order.
pub const ERROR_EXTRACTORS: [MessageExtractor; 5] = [
    failure_reason,
    error_object_message,
    error_text,
    message_text,
    failure_text,
];

/// Normalize a raw task payload. Never fails.
pub fn normalize(raw: &Value) -> RemoteTask {
    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .map(TaskStatus::from_remote)
        .unwrap_or(TaskStatus::Running);

    let outputs = if status == TaskStatus::Succeeded {
        extract_outputs(raw)
    } else {
        Vec::new()
    };

    let error = if status == TaskStatus::Failed {
        extract_error(raw)
    } else {
        None
    };

    RemoteTask {
        id: string_field(raw, "id"),
        status,
        outputs,
        progress: extract_progress(raw),
        queue_position: extract_queue_position(raw),
        error,
        created_at: string_field(raw, "createdAt"),
        updated_at: string_field(raw, "updatedAt"),
    }
}

/// Run the output extractors in order and stop at the first present source.
pub fn extract_outputs(raw: &Value) -> Vec<String> {
    OUTPUT_EXTRACTORS
        .iter()
        .find_map(|extract| extract(raw))
        .unwrap_or_default()
}

pub fn extract_error(raw: &Value) -> Option<String> {
    ERROR_EXTRACTORS.iter().find_map(|extract| extract(raw))
}

pub fn extract_progress(raw: &Value) -> Option<f64> {
    raw.get("progress")
        .and_then(Value::as_f64)
        .or_else(|| raw.pointer("/metrics/progress").and_then(Value::as_f64))
        .filter(|p| p.is_finite())
}

pub fn extract_queue_position(raw: &Value) -> Option<u64> {
    raw.get("queuePosition")
        .and_then(non_negative_integer)
        .or_else(|| raw.pointer("/queue/position").and_then(non_negative_integer))
}

/// Pick the URL out of a single output entry: a bare string or an object
/// carrying one of [`URL_FIELDS`]. A non-string value in the winning field is discarded.
pub fn entry_url(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            let picked = URL_FIELDS
                .iter()
                .filter_map(|key| map.get(*key))
                .find(|v| !is_blank(v))?;
            picked.as_str().map(str::to_string)
        }
        _ => None,
    }
}

fn url_list(items: &[Value]) -> Vec<String> {
    items.iter().filter_map(entry_url).collect()
}

/// A single output slot that may itself be a list, a URL string or an object.
fn output_slot(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => url_list(items),
        other => entry_url(other).into_iter().collect(),
    }
}

fn array_field(raw: &Value, key: &str) -> Option<Vec<String>> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|a| url_list(a.as_slice()))
}

fn present<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.get(key).filter(|v| !is_blank(v))
}

fn top_level_outputs(raw: &Value) -> Option<Vec<String>> {
    array_field(raw, "outputs")
}

fn singular_output(raw: &Value) -> Option<Vec<String>> {
    present(raw, "output").map(output_slot)
}

fn result_field(raw: &Value) -> Option<Vec<String>> {
    let result = present(raw, "result")?;
    if let Some(items) = result.as_array() {
        return Some(url_list(items));
    }
    let nested = ["assets", "files", "media"]
        .iter()
        .find_map(|key| array_field(result, key));
    if let Some(urls) = nested {
        return Some(urls);
    }
    // `result` was present, so it is the source even when nothing usable is inside.
    Some(present(result, "output").map(output_slot).unwrap_or_default())
}

fn top_level_assets(raw: &Value) -> Option<Vec<String>> {
    array_field(raw, "assets")
}

fn top_level_files(raw: &Value) -> Option<Vec<String>> {
    array_field(raw, "files")
}

fn top_level_media(raw: &Value) -> Option<Vec<String>> {
    array_field(raw, "media")
}

fn failure_reason(raw: &Value) -> Option<String> {
    non_empty_str(raw.pointer("/failure/reason"))
}

fn failure_text(raw: &Value) -> Option<String> {
    non_empty_str(raw.get("failure"))
}

fn error_object_message(raw: &Value) -> Option<String> {
    non_empty_str(raw.pointer("/error/message"))
}

fn error_text(raw: &Value) -> Option<String> {
    non_empty_str(raw.get("error"))
}

fn message_text(raw: &Value) -> Option<String> {
    non_empty_str(raw.get("message"))
}

/// Messages pass through verbatim; only an empty string counts as missing.
fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn non_negative_integer(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}

/// Null and empty strings count as "not there".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
