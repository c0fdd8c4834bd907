//! Run-time knobs for the pipeline, overridable via environment variables.
//!
//! Mirrors the teacher's `LLMClient::new()`, which reads `LLM_API_KEY` /
//! `LLM_API_URL` with sane fallbacks rather than failing when unset.

use std::env;
use std::time::Duration;

const DEFAULT_SAMPLE_LINES: usize = 3000;
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;
const DEFAULT_REGEX_TIMEOUT_MS: u64 = 100;
const DEFAULT_LLM_MODEL: &str = "google:gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of lines taken from the head of the document for stage 1.
    pub sample_lines: usize,
    /// Upper bound on concurrent LM calls in stages 2 and 4. `None` means
    /// unbounded (the original default, in practice limited by the LM's own
    /// rate limiting).
    pub max_concurrency: Option<usize>,
    /// Minimum confidence stage 4 requires, in addition to `is_correct`, for
    /// `verification_passed` to be `true`.
    pub confidence_threshold: f64,
    /// Per-line budget for a single regex match in stage 3.
    pub regex_timeout: Duration,
    /// Provider/model identifier handed to the LM client, e.g. `"google:gemini-2.0-flash"`.
    pub llm_model: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_lines: DEFAULT_SAMPLE_LINES,
            max_concurrency: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            regex_timeout: Duration::from_millis(DEFAULT_REGEX_TIMEOUT_MS),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Builds a config from the process environment, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let sample_lines = env::var("READERAI_SAMPLE_LINES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.sample_lines);

        let max_concurrency = env::var("READERAI_MAX_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok());

        let confidence_threshold = env::var("READERAI_CONFIDENCE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.confidence_threshold);

        let regex_timeout_ms = env::var("READERAI_REGEX_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REGEX_TIMEOUT_MS);

        let llm_model =
            env::var("READERAI_LLM_MODEL").unwrap_or(defaults.llm_model);

        Self {
            sample_lines,
            max_concurrency,
            confidence_threshold,
            regex_timeout: Duration::from_millis(regex_timeout_ms),
            llm_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.sample_lines, 3000);
        assert_eq!(cfg.max_concurrency, None);
        assert_eq!(cfg.confidence_threshold, 0.8);
        assert_eq!(cfg.regex_timeout, Duration::from_millis(100));
        assert_eq!(cfg.llm_model, "google:gemini-2.0-flash");
    }

    #[test]
    fn from_env_falls_back_to_defaults_when_unset() {
        for var in [
            "READERAI_SAMPLE_LINES",
            "READERAI_MAX_CONCURRENCY",
            "READERAI_CONFIDENCE_THRESHOLD",
            "READERAI_REGEX_TIMEOUT_MS",
            "READERAI_LLM_MODEL",
        ] {
            unsafe { env::remove_var(var) };
        }
        let cfg = PipelineConfig::from_env();
        assert_eq!(cfg.sample_lines, PipelineConfig::default().sample_lines);
    }
}
