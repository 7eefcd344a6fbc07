use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::job_name::JobNameConfig;
use crate::provider::Provider;
use crate::redaction::ContentRedactionConfig;

/// Default interval between job status checks.
pub const DEFAULT_JOB_CHECK_INTERVAL_MS: u64 = 500;

/// Default extension for text written to scratch objects.
pub const DEFAULT_TEXT_FILE_EXTENSION: &str = "txt";

/// Language preferences for a transcription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language of the audio (e.g. `"en-US"`).
    ///
    /// When empty, the language is identified automatically, which only some providers offer.
    pub language_code: String,

    /// Identify several languages spoken within the same file.
    pub identify_multiple_languages: bool,

    /// Candidate languages that narrow automatic identification.
    pub language_options: Vec<String>,
}

/// Options that control how a transcription is performed.
///
/// This struct represents *library-level configuration*. Frontends (CLIs, function handlers,
/// tests) build it programmatically, from `Default`, or from JSON via [`Opts::from_json_str`].
/// Every field is optional in JSON and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Opts {
    /// Backend to use. `None` lets the selector decide.
    pub provider: Option<Provider>,

    pub language: LanguageConfig,

    /// Content redaction (AWS only). The empty config disables redaction.
    pub content_redaction: ContentRedactionConfig,

    /// Add punctuation to the transcript (GCP only).
    pub enable_automatic_punctuation: bool,

    /// Replace spoken punctuation ("question mark") with symbols (GCP only).
    pub enable_spoken_punctuation: bool,

    /// Replace spoken emojis with Unicode symbols (GCP only).
    pub enable_spoken_emojis: bool,

    /// Mask profanities except for their first letter (GCP only).
    pub profanity_filter: bool,

    /// Naming of submitted transcription jobs (job-based providers).
    pub job_name: JobNameConfig,

    /// Minimum time between two job status checks, in milliseconds.
    pub job_check_interval_ms: u64,

    /// Give up waiting for a job after this many milliseconds. `None` waits indefinitely.
    pub job_timeout_ms: Option<u64>,

    /// Bucket used for staged audio and scratch transcripts.
    pub temp_bucket: String,

    /// Extension of scratch transcript objects (without a leading period).
    pub default_text_file_extension: String,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            provider: None,
            language: LanguageConfig::default(),
            content_redaction: ContentRedactionConfig::default(),
            enable_automatic_punctuation: false,
            enable_spoken_punctuation: false,
            enable_spoken_emojis: false,
            profanity_filter: false,
            job_name: JobNameConfig::default(),
            job_check_interval_ms: DEFAULT_JOB_CHECK_INTERVAL_MS,
            job_timeout_ms: None,
            temp_bucket: String::new(),
            default_text_file_extension: DEFAULT_TEXT_FILE_EXTENSION.to_owned(),
        }
    }
}

impl Opts {
    /// Parse options from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Whether the request needs the provider to identify the spoken language.
    pub fn requires_language_identification(&self) -> bool {
        self.language.language_code.is_empty() || self.language.identify_multiple_languages
    }

    /// Whether any GCP-only transcript formatting feature is requested.
    pub fn requires_formatting(&self) -> bool {
        self.profanity_filter
            || self.enable_automatic_punctuation
            || self.enable_spoken_punctuation
            || self.enable_spoken_emojis
    }

    pub fn job_check_interval(&self) -> Duration {
        Duration::from_millis(self.job_check_interval_ms)
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redaction::RedactionOutput;

    #[test]
    fn defaults_match_documented_values() {
        let opts = Opts::default();
        assert_eq!(opts.job_check_interval(), Duration::from_millis(500));
        assert_eq!(opts.default_text_file_extension, "txt");
        assert!(opts.provider.is_none());
        assert!(opts.job_timeout().is_none());
        assert!(opts.content_redaction.is_empty());
    }

    #[test]
    fn from_json_fills_missing_fields_with_defaults() -> anyhow::Result<()> {
        let opts = Opts::from_json_str(
            r#"{
                "provider": "gcp",
                "language": { "language_code": "de-DE" },
                "profanity_filter": true,
                "temp_bucket": "scratch",
                "content_redaction": { "output": "redacted_and_unredacted" }
            }"#,
        )?;

        assert_eq!(opts.provider, Some(Provider::Gcp));
        assert_eq!(opts.language.language_code, "de-DE");
        assert!(opts.profanity_filter);
        assert_eq!(opts.temp_bucket, "scratch");
        assert_eq!(opts.job_check_interval_ms, DEFAULT_JOB_CHECK_INTERVAL_MS);
        assert_eq!(
            opts.content_redaction.output,
            Some(RedactionOutput::RedactedAndUnredacted)
        );
        Ok(())
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        assert!(Opts::from_json_str("{ not json").is_err());
    }

    #[test]
    fn language_identification_needed_for_empty_code_or_multi() {
        let mut opts = Opts::default();
        assert!(opts.requires_language_identification());

        opts.language.language_code = "en-US".into();
        assert!(!opts.requires_language_identification());

        opts.language.identify_multiple_languages = true;
        assert!(opts.requires_language_identification());
    }
}
