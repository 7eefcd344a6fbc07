use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::backend::{Backend, TranscriptionOutput};
use crate::capabilities::{self, Capabilities};
use crate::credentials::{AwsCredentials, CredentialsHolder};
use crate::job::{JobSnapshot, PollSettings, wait_for_completion};
use crate::job_name::unique_timestamp_nanos;
use crate::location::{ObjectRef, StorageLocation, file_type_from_name, parse_location};
use crate::opts::Opts;
use crate::provider::Provider;
use crate::redaction::{ContentRedactionConfig, RedactionType};
use crate::staging::merge_run_and_cleanup;
use crate::storage::StorageTransfer;
use crate::{Error, Result};

/// A `StartTranscriptionJob` request, reduced to the fields cloudscribe sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSubmission {
    pub job_name: String,
    pub media_uri: String,

    /// Media format, when the file type is one AWS understands.
    pub media_format: Option<String>,

    /// Explicit language; `None` when the language is identified automatically.
    pub language_code: Option<String>,
    pub identify_language: bool,
    pub identify_multiple_languages: bool,
    pub language_options: Vec<String>,

    /// Redaction settings, `None` when redaction is disabled.
    pub content_redaction: Option<ContentRedactionConfig>,

    pub output_bucket: String,
    pub output_key: String,
}

/// The slice of the AWS Transcribe API cloudscribe drives.
#[async_trait]
pub trait TranscribeJobApi: Send + Sync {
    async fn start_transcription_job(&self, job: &JobSubmission) -> Result<JobSnapshot>;

    async fn get_transcription_job(&self, job_name: &str) -> Result<JobSnapshot>;
}

/// Creates an AWS Transcribe client for a region.
pub trait AwsConnector: Send + Sync {
    fn connect(
        &self,
        credentials: &AwsCredentials,
        region: &str,
    ) -> Result<Arc<dyn TranscribeJobApi>>;
}

struct Session {
    credentials: AwsCredentials,
    api: Arc<dyn TranscribeJobApi>,
}

/// Job-based backend powered by AWS Transcribe and S3.
///
/// Results are written by AWS to the output bucket/key of the job. Direct transcriptions go
/// through a scratch object in the temp bucket which is read back and deleted afterwards.
///
/// One client is kept per region, so concurrent calls for different regions each keep
/// the client they started with.
pub struct AwsBackend {
    connector: Arc<dyn AwsConnector>,
    storage: Arc<dyn StorageTransfer>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl AwsBackend {
    pub fn new(connector: Arc<dyn AwsConnector>, storage: Arc<dyn StorageTransfer>) -> Self {
        Self {
            connector,
            storage,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| Error::msg("aws session lock poisoned"))
    }

    fn api(&self, region: &str) -> Result<Arc<dyn TranscribeJobApi>> {
        self.sessions()?
            .get(region)
            .map(|s| s.api.clone())
            .ok_or_else(|| {
                Error::invocation(
                    Provider::Aws,
                    format!("service client has not been created for region '{region}'"),
                )
            })
    }

    /// Submit a job writing to `output` and wait for it to finish.
    async fn run_job(
        &self,
        api: Arc<dyn TranscribeJobApi>,
        source: &str,
        output: &ObjectRef,
        opts: &Opts,
    ) -> Result<JobSnapshot> {
        let submission = build_submission(source, output, opts);
        info!(
            job = %submission.job_name,
            media = %submission.media_uri,
            output = %output,
            "starting transcription job"
        );

        let submitted = api
            .start_transcription_job(&submission)
            .await
            .map_err(|err| Error::invocation(Provider::Aws, err))?;

        let done = wait_for_completion(submitted, PollSettings::from_opts(opts), |name| {
            let api = api.clone();
            async move {
                api.get_transcription_job(&name)
                    .await
                    .map_err(|err| Error::invocation(Provider::Aws, err))
            }
        })
        .await?;

        info!(job = %done.name, "transcription job completed");
        Ok(done)
    }

    async fn read_transcript(&self, output: &ObjectRef) -> Result<String> {
        let local = self
            .storage
            .download(&StorageLocation::Object(output.clone()))
            .await
            .map_err(|err| {
                Error::invocation(
                    Provider::Aws,
                    format!("failed to fetch transcript '{output}': {err}"),
                )
            })?;

        let raw = tokio::fs::read_to_string(&local).await;
        if let Err(err) = tokio::fs::remove_file(&local).await {
            warn!(path = %local.display(), error = %err, "failed to remove downloaded transcript");
        }

        parse_transcript_json(&raw?)
    }
}

#[async_trait]
impl Backend for AwsBackend {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    fn capabilities(&self) -> &'static Capabilities {
        &capabilities::AWS
    }

    fn create_client(&self, credentials: &CredentialsHolder, region: &str) -> Result<()> {
        let creds = credentials
            .aws
            .as_ref()
            .ok_or_else(|| Error::client(Provider::Aws, "no AWS credentials configured"))?;

        let current = self
            .sessions()?
            .get(region)
            .is_some_and(|s| s.credentials == *creds);
        if current {
            return Ok(());
        }

        // Connect without the lock held; a racing call for the same region may connect too.
        let api = self
            .connector
            .connect(creds, region)
            .map_err(|err| Error::client(Provider::Aws, err))?;

        let mut sessions = self.sessions()?;
        let raced = sessions
            .get(region)
            .is_some_and(|s| s.credentials == *creds);
        if !raced {
            info!(%region, "created transcription client");
            sessions.insert(
                region.to_owned(),
                Session {
                    credentials: creds.clone(),
                    api,
                },
            );
        }
        Ok(())
    }

    fn transform_request(&self, source: String, mut opts: Opts) -> Result<(String, Opts)> {
        let redaction = &mut opts.content_redaction;
        if !redaction.is_empty() && redaction.redaction_type.is_none() {
            redaction.redaction_type = Some(RedactionType::Pii);
        }

        if opts.requires_formatting() {
            warn!("aws ignores punctuation, spoken emoji and profanity settings");
        }
        Ok((source, opts))
    }

    async fn transcribe_to_destination(
        &self,
        source: &str,
        destination: &str,
        region: &str,
        opts: &Opts,
    ) -> Result<()> {
        let output = match parse_location(destination) {
            StorageLocation::Object(obj) if obj.provider == Provider::Aws => obj,
            _ => {
                return Err(Error::invocation(
                    Provider::Aws,
                    format!("destination '{destination}' is not an S3 URI or S3 object URL"),
                ));
            }
        };

        let api = self.api(region)?;
        self.run_job(api, source, &output, opts).await?;
        Ok(())
    }

    async fn transcribe_direct(
        &self,
        source: &str,
        region: &str,
        opts: &Opts,
    ) -> Result<TranscriptionOutput> {
        if opts.temp_bucket.is_empty() {
            return Err(Error::invocation(
                Provider::Aws,
                "a temp bucket is required to receive the job output",
            ));
        }

        let api = self.api(region)?;
        let scratch = ObjectRef::new(
            Provider::Aws,
            &opts.temp_bucket,
            format!(
                "{}.{}",
                unique_timestamp_nanos(),
                opts.default_text_file_extension
            ),
        )
        .with_region(region);

        let job = self.run_job(api, source, &scratch, opts).await?;

        // The scratch object only exists once the job completed.
        let text = self.read_transcript(&scratch).await;
        let cleanup = self
            .storage
            .delete(&scratch)
            .await
            .map_err(|err| Error::Cleanup {
                location: scratch.to_string(),
                message: err.to_string(),
            });

        let text = merge_run_and_cleanup(text, cleanup)?;
        Ok(TranscriptionOutput {
            text,
            provider: Provider::Aws,
            job_name: Some(job.name),
            job_status: Some(job.status),
        })
    }

    fn owns_storage_url(&self, url: &str) -> bool {
        crate::location::is_provider_storage_url(Provider::Aws, url)
    }

    fn close_client(&self) -> Result<()> {
        // AWS clients hold no connection that needs closing; dropping them is enough.
        self.sessions()?.clear();
        Ok(())
    }
}

fn build_submission(source: &str, output: &ObjectRef, opts: &Opts) -> JobSubmission {
    let language = &opts.language;
    let file_type = file_type_from_name(source).to_ascii_lowercase();
    let media_format = capabilities::AWS
        .supports_file_type(&file_type)
        .then_some(file_type);

    let identify_multiple_languages = language.identify_multiple_languages;
    let identify_language = language.language_code.is_empty() && !identify_multiple_languages;
    let language_code = (!language.language_code.is_empty() && !identify_multiple_languages)
        .then(|| language.language_code.clone());

    JobSubmission {
        job_name: opts.job_name.resolve(),
        media_uri: source.to_owned(),
        media_format,
        language_code,
        identify_language,
        identify_multiple_languages,
        language_options: language.language_options.clone(),
        content_redaction: (!opts.content_redaction.is_empty())
            .then(|| opts.content_redaction.clone()),
        output_bucket: output.bucket.clone(),
        output_key: output.key.clone(),
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptDocument {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    #[serde(default)]
    transcripts: Vec<TranscriptText>,
}

#[derive(Debug, Deserialize)]
struct TranscriptText {
    transcript: String,
}

/// Extract the plain text from an AWS Transcribe output document.
fn parse_transcript_json(raw: &str) -> Result<String> {
    let doc: TranscriptDocument = serde_json::from_str(raw).map_err(|err| {
        Error::invocation(Provider::Aws, format!("unreadable transcript document: {err}"))
    })?;

    Ok(doc
        .results
        .transcripts
        .iter()
        .map(|t| t.transcript.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" "))
}
