use async_trait::async_trait;

use crate::Result;
use crate::capabilities::Capabilities;
use crate::credentials::CredentialsHolder;
use crate::job::JobStatus;
use crate::location::ObjectRef;
use crate::opts::Opts;
use crate::provider::Provider;

/// Text produced by a direct transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionOutput {
    pub text: String,

    /// Provider that produced the transcript.
    pub provider: Provider,

    /// Name of the vendor job, for job-based providers.
    pub job_name: Option<String>,

    /// Terminal job status, for job-based providers.
    pub job_status: Option<JobStatus>,
}

/// Pluggable cloud transcription backend used by [`crate::Transcriber`].
///
/// One instance exists per provider per `Transcriber`; it is shared across calls, so all
/// methods take `&self`. Vendor clients are kept per region and never replaced under a call
/// that already holds one.
///
/// Vendor failures should be reported as `Error::Invocation` / `Error::ClientConstruction`
/// naming the provider; the orchestrator does not retry.
#[async_trait]
pub trait Backend: Send + Sync {
    fn provider(&self) -> Provider;

    fn capabilities(&self) -> &'static Capabilities;

    /// Establish the vendor client for `region`.
    ///
    /// Clients for other regions are left alone. Calling this again with the same credentials
    /// and region is a no-op.
    fn create_client(&self, credentials: &CredentialsHolder, region: &str) -> Result<()>;

    /// Backend-specific normalization applied right before invocation.
    fn transform_request(&self, source: String, opts: Opts) -> Result<(String, Opts)>;

    /// Transcribe `source` and store the result at `destination`.
    ///
    /// Runs on the client created for `region`. Returns once the transcript has been written
    /// (job-based backends poll until then).
    async fn transcribe_to_destination(
        &self,
        source: &str,
        destination: &str,
        region: &str,
        opts: &Opts,
    ) -> Result<()>;

    /// Transcribe `source` on the client created for `region` and return the text.
    async fn transcribe_direct(
        &self,
        source: &str,
        region: &str,
        opts: &Opts,
    ) -> Result<TranscriptionOutput>;

    /// True if `url` addresses this provider's own storage service.
    fn owns_storage_url(&self, url: &str) -> bool;

    /// File type without the leading period.
    fn supports_file_type(&self, file_type: &str) -> bool {
        self.capabilities().supports_file_type(file_type)
    }

    /// Whether local paths and foreign URLs can be passed without staging.
    fn supports_direct_file_input(&self) -> bool {
        self.capabilities().direct_file_input
    }

    /// Release every vendor client. A no-op is fine when the vendor has nothing to close.
    fn close_client(&self) -> Result<()>;

    fn default_region(&self) -> &str {
        self.capabilities().default_region
    }

    /// URL under which the backend reads `object`.
    fn storage_url(&self, object: &ObjectRef) -> String {
        object.url()
    }
}
