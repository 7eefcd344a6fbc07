//! Backend doubles shared by the unit tests.

use async_trait::async_trait;

use crate::backend::{Backend, TranscriptionOutput};
use crate::capabilities::{self, Capabilities, ExecutionMode};
use crate::credentials::CredentialsHolder;
use crate::location::is_provider_storage_url;
use crate::opts::Opts;
use crate::provider::Provider;
use crate::{Error, Result};

/// GCP's table plus m4a.
pub static GCP_WITH_M4A: Capabilities = Capabilities {
    language_identification: false,
    multiple_language_identification: false,
    content_redaction: false,
    automatic_punctuation: true,
    spoken_punctuation: true,
    spoken_emojis: true,
    profanity_filter: true,
    execution: ExecutionMode::Direct,
    direct_file_input: false,
    audio_formats: &["amr", "awb", "flac", "m4a", "mp3", "ogg", "opus", "spx", "wav", "webm"],
    default_region: "global",
};

/// AWS's table plus profanity filtering.
pub static AWS_WITH_PROFANITY_FILTER: Capabilities = Capabilities {
    language_identification: true,
    multiple_language_identification: true,
    content_redaction: true,
    automatic_punctuation: false,
    spoken_punctuation: false,
    spoken_emojis: false,
    profanity_filter: true,
    execution: ExecutionMode::Job,
    direct_file_input: false,
    audio_formats: &["amr", "flac", "m4a", "mp3", "mp4", "ogg", "wav", "webm"],
    default_region: "us-east-1",
};

/// A backend that only answers questions about itself.
pub struct Declared {
    pub provider: Provider,
    pub capabilities: &'static Capabilities,
    pub direct: bool,

    /// Whether the provider's own bucket URLs are claimed.
    pub claims_storage: bool,
}

impl Declared {
    pub fn of(provider: Provider) -> Self {
        Self::with(provider, capabilities::capabilities(provider))
    }

    pub fn with(provider: Provider, capabilities: &'static Capabilities) -> Self {
        Self {
            provider,
            capabilities,
            direct: capabilities.direct_file_input,
            claims_storage: true,
        }
    }
}

#[async_trait]
impl Backend for Declared {
    fn provider(&self) -> Provider {
        self.provider
    }
    fn capabilities(&self) -> &'static Capabilities {
        self.capabilities
    }
    fn create_client(&self, _: &CredentialsHolder, _: &str) -> Result<()> {
        Ok(())
    }
    fn transform_request(&self, source: String, opts: Opts) -> Result<(String, Opts)> {
        Ok((source, opts))
    }
    async fn transcribe_to_destination(&self, _: &str, _: &str, _: &str, _: &Opts) -> Result<()> {
        Ok(())
    }
    async fn transcribe_direct(&self, _: &str, _: &str, _: &Opts) -> Result<TranscriptionOutput> {
        Err(Error::msg("unused"))
    }
    fn owns_storage_url(&self, url: &str) -> bool {
        self.claims_storage && is_provider_storage_url(self.provider, url)
    }
    fn supports_direct_file_input(&self) -> bool {
        self.direct
    }
    fn close_client(&self) -> Result<()> {
        Ok(())
    }
}
