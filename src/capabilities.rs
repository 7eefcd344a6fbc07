//! Capability tables of the bundled providers.
//!
//! Backends hand these out from `Backend::capabilities`; selection reads whatever each
//! registered backend declares, so it stays a pure function of the request.

use crate::provider::Provider;

/// How a provider delivers its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Submission returns a job handle; completion is observed by polling.
    Job,

    /// The call returns the transcript itself.
    Direct,
}

/// Optional, selection-relevant features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    LanguageIdentification,
    MultipleLanguageIdentification,
    ContentRedaction,
    AutomaticPunctuation,
    SpokenPunctuation,
    SpokenEmojis,
    ProfanityFilter,
}

/// What one provider can do.
#[derive(Debug)]
pub struct Capabilities {
    pub language_identification: bool,
    pub multiple_language_identification: bool,
    pub content_redaction: bool,
    pub automatic_punctuation: bool,
    pub spoken_punctuation: bool,
    pub spoken_emojis: bool,
    pub profanity_filter: bool,
    pub execution: ExecutionMode,

    /// Whether the provider reads local paths or arbitrary URLs without staging.
    pub direct_file_input: bool,

    /// Accepted audio file extensions (lowercase, no leading period).
    pub audio_formats: &'static [&'static str],

    pub default_region: &'static str,
}

pub static AWS: Capabilities = Capabilities {
    language_identification: true,
    multiple_language_identification: true,
    content_redaction: true,
    automatic_punctuation: false,
    spoken_punctuation: false,
    spoken_emojis: false,
    profanity_filter: false,
    execution: ExecutionMode::Job,
    direct_file_input: false,
    audio_formats: &["amr", "flac", "m4a", "mp3", "mp4", "ogg", "wav", "webm"],
    default_region: "us-east-1",
};

pub static GCP: Capabilities = Capabilities {
    language_identification: false,
    multiple_language_identification: false,
    content_redaction: false,
    automatic_punctuation: true,
    spoken_punctuation: true,
    spoken_emojis: true,
    profanity_filter: true,
    execution: ExecutionMode::Direct,
    direct_file_input: false,
    audio_formats: &["amr", "awb", "flac", "mp3", "ogg", "opus", "spx", "wav", "webm"],
    default_region: "global",
};

/// Capability table for `provider`.
pub fn capabilities(provider: Provider) -> &'static Capabilities {
    match provider {
        Provider::Aws => &AWS,
        Provider::Gcp => &GCP,
    }
}

impl Capabilities {
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::LanguageIdentification => self.language_identification,
            Feature::MultipleLanguageIdentification => self.multiple_language_identification,
            Feature::ContentRedaction => self.content_redaction,
            Feature::AutomaticPunctuation => self.automatic_punctuation,
            Feature::SpokenPunctuation => self.spoken_punctuation,
            Feature::SpokenEmojis => self.spoken_emojis,
            Feature::ProfanityFilter => self.profanity_filter,
        }
    }

    /// Case-insensitive extension check. `file_type` has no leading period.
    pub fn supports_file_type(&self, file_type: &str) -> bool {
        !file_type.is_empty()
            && self
                .audio_formats
                .iter()
                .any(|f| f.eq_ignore_ascii_case(file_type))
    }
}
