pub mod async_poll;
pub mod http;

use serde_json::{Value, json};

use crate::config::GenerationDefaults;
use crate::error::VidshiftError;
use crate::validation;

/// A validated video-to-video submission. Only constructible through [`GenerationRequest::new`],
/// so holding one means every precondition has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    model: String,
    ratio: String,
    video_uri: String,
    seed: Option<u32>,
    reference_images: Vec<String>,
    public_figure_threshold: Option<String>,
}

impl GenerationRequest {
    /// Validate caller input. Fails on the first offending field.
    pub fn new(
        prompt: &str,
        model: &str,
        ratio: &str,
        video_uri: &str,
        seed: Option<u64>,
    ) -> Result<Self, VidshiftError> {
        validation::validate_video_uri(video_uri)?;
        validation::validate_prompt(prompt)?;
        validation::validate_model(model)?;
        validation::validate_ratio(ratio)?;
        let seed = validation::validate_seed(seed)?;

        Ok(Self {
            prompt: prompt.trim().to_string(),
            model: model.trim().to_string(),
            ratio: ratio.trim().to_string(),
            video_uri: video_uri.trim().to_string(),
            seed,
            reference_images: Vec::new(),
            public_figure_threshold: None,
        })
    }

    /// Attach the configured references and moderation settings.
    pub fn with_defaults(mut self, defaults: &GenerationDefaults) -> Self {
        self.reference_images = defaults.reference_images.clone();
        self.public_figure_threshold = defaults.public_figure_threshold.clone();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn ratio(&self) -> &str {
        &self.ratio
    }

    /// JSON body for the creation endpoint. Optional members are omitted, not nulled.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "model": self.model,
            "promptText": self.prompt,
            "videoUri": self.video_uri,
            "ratio": self.ratio,
        });

        if let Some(seed) = self.seed {
            body["seed"] = json!(seed);
        }
        if !self.reference_images.is_empty() {
            body["references"] = self
                .reference_images
                .iter()
                .map(|uri| json!({"type": "image", "uri": uri}))
                .collect();
        }
        if let Some(ref threshold) = self.public_figure_threshold {
            body["contentModeration"] = json!({"publicFigureThreshold": threshold});
        }

        body
    }
}
