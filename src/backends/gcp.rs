use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::{Backend, TranscriptionOutput};
use crate::capabilities::{self, Capabilities};
use crate::credentials::{CredentialsHolder, GcpCredentials};
use crate::location::{StorageLocation, file_type_from_name, parse_location};
use crate::opts::Opts;
use crate::provider::Provider;
use crate::storage::StorageTransfer;
use crate::{Error, Result};

/// A synchronous `Recognize` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizeRequest {
    /// `gs://` URI, `http(s)` URL or local path of the audio.
    pub uri: String,
    pub audio_format: String,
    pub language_code: String,
    pub alternative_language_codes: Vec<String>,
    pub enable_automatic_punctuation: bool,
    pub enable_spoken_punctuation: bool,
    pub enable_spoken_emojis: bool,
    pub profanity_filter: bool,
}

/// The slice of the Google Cloud Speech API cloudscribe drives.
#[async_trait]
pub trait SpeechApi: Send + Sync {
    /// Returns the best alternative of every result segment, in order.
    async fn recognize(&self, request: &RecognizeRequest) -> Result<Vec<String>>;

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Creates a Speech client bound to a location.
pub trait GcpConnector: Send + Sync {
    fn connect(&self, credentials: &GcpCredentials, region: &str) -> Result<Arc<dyn SpeechApi>>;
}

struct Session {
    credentials: GcpCredentials,
    api: Arc<dyn SpeechApi>,
}

/// Direct backend powered by Google Cloud Speech-to-Text. Keeps one client per location.
pub struct GcpBackend {
    connector: Arc<dyn GcpConnector>,
    storage: Arc<dyn StorageTransfer>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl GcpBackend {
    pub fn new(connector: Arc<dyn GcpConnector>, storage: Arc<dyn StorageTransfer>) -> Self {
        Self {
            connector,
            storage,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| Error::msg("gcp session lock poisoned"))
    }

    fn api(&self, region: &str) -> Result<Arc<dyn SpeechApi>> {
        self.sessions()?
            .get(region)
            .map(|s| s.api.clone())
            .ok_or_else(|| {
                Error::invocation(
                    Provider::Gcp,
                    format!("service client has not been created for location '{region}'"),
                )
            })
    }

    async fn recognize(&self, source: &str, region: &str, opts: &Opts) -> Result<String> {
        let api = self.api(region)?;
        let request = build_request(source, opts);
        debug!(uri = %request.uri, language = %request.language_code, "recognize");

        let segments = api
            .recognize(&request)
            .await
            .map_err(|err| Error::invocation(Provider::Gcp, err))?;

        Ok(segments
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }
}

#[async_trait]
impl Backend for GcpBackend {
    fn provider(&self) -> Provider {
        Provider::Gcp
    }

    fn capabilities(&self) -> &'static Capabilities {
        &capabilities::GCP
    }

    fn create_client(&self, credentials: &CredentialsHolder, region: &str) -> Result<()> {
        let creds = credentials
            .gcp
            .as_ref()
            .ok_or_else(|| Error::client(Provider::Gcp, "no GCP service account configured"))?;

        let current = self
            .sessions()?
            .get(region)
            .is_some_and(|s| s.credentials == *creds);
        if current {
            return Ok(());
        }

        let api = self
            .connector
            .connect(creds, region)
            .map_err(|err| Error::client(Provider::Gcp, err))?;

        let mut sessions = self.sessions()?;
        let raced = sessions
            .get(region)
            .is_some_and(|s| s.credentials == *creds);
        if !raced {
            info!(location = %region, "created speech client");
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

    fn transform_request(&self, source: String, opts: Opts) -> Result<(String, Opts)> {
        if opts.language.language_code.is_empty() {
            return Err(Error::invocation(
                Provider::Gcp,
                "a language code is required; automatic language identification is not supported",
            ));
        }
        if opts.language.identify_multiple_languages {
            return Err(Error::invocation(
                Provider::Gcp,
                "multiple language identification is not supported",
            ));
        }
        if !opts.content_redaction.is_empty() {
            return Err(Error::invocation(
                Provider::Gcp,
                "content redaction is not supported",
            ));
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
        let StorageLocation::Object(dest) = parse_location(destination) else {
            return Err(Error::invocation(
                Provider::Gcp,
                format!("destination '{destination}' is not a storage object URL"),
            ));
        };

        let text = self.recognize(source, region, opts).await?;

        let write_failed = |err: std::io::Error| {
            Error::invocation(
                Provider::Gcp,
                format!("failed to write transcript for '{destination}': {err}"),
            )
        };
        let tmp = tempfile::Builder::new()
            .prefix("cloudscribe-")
            .tempfile()
            .map_err(write_failed)?;
        tokio::fs::write(tmp.path(), text.as_bytes())
            .await
            .map_err(write_failed)?;

        self.storage.upload(tmp.path(), &dest).await.map_err(|err| {
            Error::invocation(
                Provider::Gcp,
                format!("failed to store transcript at '{dest}': {err}"),
            )
        })?;

        info!(destination = %dest, "transcript stored");
        Ok(())
    }

    async fn transcribe_direct(
        &self,
        source: &str,
        region: &str,
        opts: &Opts,
    ) -> Result<TranscriptionOutput> {
        let text = self.recognize(source, region, opts).await?;
        Ok(TranscriptionOutput {
            text,
            provider: Provider::Gcp,
            job_name: None,
            job_status: None,
        })
    }

    fn owns_storage_url(&self, url: &str) -> bool {
        crate::location::is_provider_storage_url(Provider::Gcp, url)
    }

    fn close_client(&self) -> Result<()> {
        let sessions: Vec<Session> = self.sessions()?.drain().map(|(_, s)| s).collect();
        let errors = sessions
            .iter()
            .filter_map(|s| s.api.close().err())
            .map(|err| Error::client(Provider::Gcp, format!("close failed: {err}")))
            .collect();
        match Error::combine(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn build_request(source: &str, opts: &Opts) -> RecognizeRequest {
    RecognizeRequest {
        uri: source.to_owned(),
        audio_format: file_type_from_name(source).to_ascii_lowercase(),
        language_code: opts.language.language_code.clone(),
        alternative_language_codes: opts
            .language
            .language_options
            .iter()
            .filter(|code| **code != opts.language.language_code)
            .cloned()
            .collect(),
        enable_automatic_punctuation: opts.enable_automatic_punctuation,
        enable_spoken_punctuation: opts.enable_spoken_punctuation,
        enable_spoken_emojis: opts.enable_spoken_emojis,
        profanity_filter: opts.profanity_filter,
    }
}
