use crate::error::VidshiftError;

/// Models the video service accepts for video-to-video generation.
pub const ALLOWED_MODELS: [&str; 1] = ["gen4_aleph"];

/// Output aspect ratios (width:height) the service accepts.
pub const ALLOWED_RATIOS: [&str; 6] = [
    "1280:720",
    "720:1280",
    "960:960",
    "1104:832",
    "832:1104",
    "1584:672",
];

pub const MAX_PROMPT_CHARS: usize = 500;

/// Largest seed the service accepts.
pub const MAX_SEED: u64 = u32::MAX as u64;

pub fn validate_prompt(prompt: &str) -> Result<(), VidshiftError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(VidshiftError::validation("promptText", "prompt is required"));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_PROMPT_CHARS {
        return Err(VidshiftError::validation(
            "promptText",
            format!("prompt too long ({chars} characters, max {MAX_PROMPT_CHARS})"),
        ));
    }
    Ok(())
}

pub fn validate_model(model: &str) -> Result<(), VidshiftError> {
    if ALLOWED_MODELS.contains(&model.trim()) {
        Ok(())
    } else {
        Err(VidshiftError::validation(
            "model",
            format!(
                "unsupported model '{}'; expected one of: {}",
                model.trim(),
                ALLOWED_MODELS.join(", ")
            ),
        ))
    }
}

pub fn validate_ratio(ratio: &str) -> Result<(), VidshiftError> {
    if ALLOWED_RATIOS.contains(&ratio.trim()) {
        Ok(())
    } else {
        Err(VidshiftError::validation(
            "ratio",
            format!(
                "unsupported ratio '{}'; expected one of: {}",
                ratio.trim(),
                ALLOWED_RATIOS.join(", ")
            ),
        ))
    }
}

/// Scheme check only; reachability is the service's problem.
pub fn validate_video_uri(uri: &str) -> Result<(), VidshiftError> {
    let trimmed = uri.trim();
    if trimmed.is_empty() {
        return Err(VidshiftError::validation("videoUri", "no video URL provided"));
    }
    let is_https = trimmed
        .get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"));
    if !is_https || trimmed.len() == 8 {
        return Err(VidshiftError::validation(
            "videoUri",
            "only HTTPS URLs are allowed",
        ));
    }
    Ok(())
}

pub fn validate_seed(seed: Option<u64>) -> Result<Option<u32>, VidshiftError> {
    match seed {
        None => Ok(None),
        Some(s) => u32::try_from(s).map(Some).map_err(|_| {
            VidshiftError::validation("seed", format!("seed must be between 0 and {MAX_SEED}"))
        }),
    }
}

/// Task ids are interpolated into URL paths, so only id-like characters pass.
pub fn validate_task_id(task_id: &str) -> Result<(), VidshiftError> {
    if task_id.is_empty() {
        return Err(VidshiftError::validation("taskId", "invalid task ID"));
    }
    let ok = task_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok || task_id.len() > 128 {
        return Err(VidshiftError::validation("taskId", "invalid task ID"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_length_counts_characters_not_bytes() {
        let prompt = "é".repeat(MAX_PROMPT_CHARS);
        assert!(validate_prompt(&prompt).is_ok());
        let prompt = "é".repeat(MAX_PROMPT_CHARS + 1);
        assert!(validate_prompt(&prompt).is_err());
    }

    #[test]
    fn https_scheme_is_case_insensitive() {
        assert!(validate_video_uri("HTTPS://cdn.example.com/a.mp4").is_ok());
        assert!(validate_video_uri("https://").is_err());
        assert!(validate_video_uri("http://cdn.example.com/a.mp4").is_err());
        assert!(validate_video_uri("ftp://x").is_err());
    }

    #[test]
    fn seed_range() {
        assert_eq!(validate_seed(Some(42)).unwrap(), Some(42));
        assert_eq!(validate_seed(Some(MAX_SEED)).unwrap(), Some(u32::MAX));
        assert!(validate_seed(Some(MAX_SEED + 1)).is_err());
    }
}
