use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::dispatch::async_poll::{
    DEFAULT_INTERVAL_MS, DEFAULT_MAX_CONSECUTIVE_ERRORS, DEFAULT_MAX_DURATION_MS, PollPolicy,
};
use crate::error::VidshiftError;
use crate::validation;

pub const DEFAULT_API_BASE: &str = "https://api.dev.runwayml.com/v1";
pub const DEFAULT_API_VERSION: &str = "2024-12-01";
pub const DEFAULT_CONFIG_FILE: &str = "vidshift.toml";
pub const DEFAULT_PUBLIC_FIGURE_THRESHOLD: &str = "auto";

/// Connection settings for the video service.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub version: String,
    /// None when no key was configured; remote calls then fail with a config error.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Values applied to every submission unless the caller overrides them.
#[derive(Debug, Clone)]
pub struct GenerationDefaults {
    pub model: String,
    pub ratio: String,
    /// Image references attached to every submission as `{type: "image", uri}`.
    pub reference_images: Vec<String>,
    /// Sent as `contentModeration.publicFigureThreshold` when set.
    pub public_figure_threshold: Option<String>,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            model: validation::ALLOWED_MODELS[0].to_string(),
            ratio: validation::ALLOWED_RATIOS[0].to_string(),
            reference_images: Vec::new(),
            public_figure_threshold: Some(DEFAULT_PUBLIC_FIGURE_THRESHOLD.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub poll: PollPolicy,
    pub generation: GenerationDefaults,
}

// --- TOML file shape: every key optional, unknown keys rejected ---

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api: FileApi,
    poll: FilePoll,
    generation: FileGeneration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileApi {
    base_url: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FilePoll {
    interval_ms: Option<u64>,
    max_duration_ms: Option<u64>,
    max_consecutive_errors: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileGeneration {
    default_model: Option<String>,
    default_ratio: Option<String>,
    reference_images: Option<Vec<String>>,
    public_figure_threshold: Option<String>,
}

impl Config {
    /// Load from `$VIDSHIFT_CONFIG` (or `./vidshift.toml` if present), then the process environment.
    pub fn load() -> Result<Self, VidshiftError> {
        let path = env::var("VIDSHIFT_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });

        let file = match path {
            Some(p) => Some(read_config_file(&p)?),
            None => None,
        };

        Self::from_sources(file.as_deref(), |key| env::var(key).ok())
    }

    /// Build a config from optional TOML text and an environment lookup.
    /// Precedence: built-in defaults < TOML < environment.
    pub fn from_sources(
        toml_text: Option<&str>,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, VidshiftError> {
        let file: FileConfig = match toml_text {
            Some(text) => toml::from_str(text)
                .map_err(|e| VidshiftError::Config(format!("invalid config file: {e}")))?,
            None => FileConfig::default(),
        };

        let lookup = |key: &str| env_lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = lookup("RUNWAY_API_KEY").or_else(|| lookup("RUNWAYML_API_SECRET"));
        if api_key.is_none() {
            tracing::warn!("RUNWAY_API_KEY not set; remote operations will fail");
        }

        let base_url = lookup("RUNWAY_API_BASE")
            .or(file.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let version = lookup("X_RUNWAY_VERSION")
            .or(file.api.version)
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let api = ApiConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            version,
            api_key,
        };

        let poll = PollPolicy::new(
            Duration::from_millis(file.poll.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS)),
            Duration::from_millis(file.poll.max_duration_ms.unwrap_or(DEFAULT_MAX_DURATION_MS)),
            file.poll
                .max_consecutive_errors
                .unwrap_or(DEFAULT_MAX_CONSECUTIVE_ERRORS),
        )
        .map_err(|e| VidshiftError::Config(e.to_string()))?;

        let mut generation = GenerationDefaults::default();
        if let Some(model) = file.generation.default_model {
            validation::validate_model(&model)
                .map_err(|e| VidshiftError::Config(e.to_string()))?;
            generation.model = model;
        }
        if let Some(ratio) = file.generation.default_ratio {
            validation::validate_ratio(&ratio)
                .map_err(|e| VidshiftError::Config(e.to_string()))?;
            generation.ratio = ratio;
        }
        if let Some(images) = file.generation.reference_images {
            for uri in &images {
                validation::validate_video_uri(uri).map_err(|_| {
                    VidshiftError::Config(format!("reference image must be an HTTPS URL: {uri}"))
                })?;
            }
            generation.reference_images = images;
        }
        if let Some(threshold) = file.generation.public_figure_threshold {
            // An empty string in the file turns content moderation settings off.
            generation.public_figure_threshold = Some(threshold).filter(|t| !t.is_empty());
        }

        Ok(Config {
            api,
            poll,
            generation,
        })
    }
}

fn read_config_file(path: &Path) -> Result<String, VidshiftError> {
    std::fs::read_to_string(path).map_err(|e| {
        VidshiftError::Config(format!("cannot read config file {}: {e}", path.display()))
    })
}
