use serde::Serialize;

use crate::config::GenerationDefaults;
use crate::dispatch::async_poll::PollPolicy;
use crate::validation::{ALLOWED_MODELS, ALLOWED_RATIOS, MAX_PROMPT_CHARS};

#[derive(Debug, Serialize)]
pub struct PollInfo {
    pub interval_ms: u64,
    pub max_duration_ms: u64,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
}

impl From<&PollPolicy> for PollInfo {
    fn from(policy: &PollPolicy) -> Self {
        Self {
            interval_ms: policy.interval().as_millis() as u64,
            max_duration_ms: policy.max_duration().as_millis() as u64,
            max_attempts: policy.max_attempts(),
            max_consecutive_errors: policy.max_consecutive_errors(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub models: Vec<&'static str>,
    pub ratios: Vec<&'static str>,
    pub default_model: String,
    pub default_ratio: String,
    pub max_prompt_chars: usize,
    pub poll: PollInfo,
}

impl OptionsResponse {
    pub fn new(defaults: &GenerationDefaults, policy: &PollPolicy) -> Self {
        Self {
            models: ALLOWED_MODELS.to_vec(),
            ratios: ALLOWED_RATIOS.to_vec(),
            default_model: defaults.model.clone(),
            default_ratio: defaults.ratio.clone(),
            max_prompt_chars: MAX_PROMPT_CHARS,
            poll: PollInfo::from(policy),
        }
    }
}
