//! High-level API for running transcriptions with cloudscribe.
//!
//! `Transcriber` is the single entry point. It wires up provider selection → staging → client
//! construction → request transform → backend invocation → cleanup, while each of those
//! pieces stays testable in its own module.
//!
//! The intent is:
//! - Build once, with the storage service, credentials and the backends to use.
//! - Call `transcribe` / `transcribe_direct` many times; backends are created on first use and
//!   reused afterwards.
//! - Callers choose features and provider preferences via `Opts`.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::backend::{Backend, TranscriptionOutput};
use crate::backends::aws::{AwsBackend, AwsConnector};
use crate::backends::gcp::{GcpBackend, GcpConnector};
use crate::credentials::CredentialsHolder;
use crate::opts::Opts;
use crate::provider::{DEFAULT_PROVIDER, Provider};
use crate::selector::select_provider;
use crate::staging::{Staged, Stager, merge_run_and_cleanup};
use crate::storage::StorageTransfer;
use crate::{Error, Result};

/// Creates a backend bound to the transcriber's storage service.
pub type BackendFactory = Box<dyn Fn(Arc<dyn StorageTransfer>) -> Arc<dyn Backend> + Send + Sync>;

struct Inner {
    storage: Arc<dyn StorageTransfer>,
    region: Option<String>,
    credentials: CredentialsHolder,
    delete_temp_files: bool,
    default_provider: Provider,
    factories: BTreeMap<Provider, BackendFactory>,

    /// One backend per provider, created on first use.
    backends: Mutex<HashMap<Provider, Arc<dyn Backend>>>,
}

/// The main transcription entry point.
///
/// Cloning is cheap and clones share the backend cache.
///
/// Typical usage:
/// - Construct once with [`Transcriber::builder`].
/// - Call [`Transcriber::transcribe`] or [`Transcriber::transcribe_direct`] per file.
/// - Call [`Transcriber::close_all_clients`] on shutdown.
#[derive(Clone)]
pub struct Transcriber {
    inner: Arc<Inner>,
}

impl Transcriber {
    pub fn builder() -> TranscriberBuilder {
        TranscriberBuilder::default()
    }

    /// Transcribe `source` and write the transcript to `destination`.
    ///
    /// `source` may be a provider storage URL, any `http(s)` URL, or a local path;
    /// `destination` is a storage URL of the selected provider. Runs to completion in the
    /// calling task, including job polling. Temporary objects created for this call are
    /// deleted afterwards whether or not the transcription succeeded.
    pub async fn transcribe(&self, source: &str, destination: &str, opts: Opts) -> Result<()> {
        let (backend, opts) = self.select(source, opts)?;
        let stager = self.stager();
        let staged = stager
            .stage(
                source,
                Some(destination),
                &opts,
                self.inner.region.as_deref(),
                backend.as_ref(),
            )
            .await?;
        let artifacts: Vec<_> = staged.artifact.iter().cloned().collect();

        let region = staged.region.clone();
        let run_res = async {
            let (source, opts) = self.prepare(backend.as_ref(), staged, opts)?;
            backend
                .transcribe_to_destination(&source, destination, &region, &opts)
                .await
        }
        .await;

        let cleanup_res = stager.cleanup(&artifacts).await;
        let res = merge_run_and_cleanup(run_res, cleanup_res);
        if res.is_ok() {
            info!(%destination, provider = %backend.provider(), "transcription stored");
        }
        res
    }

    /// Transcribe `source` and return the text.
    ///
    /// The work runs on its own tokio task; the returned future settles exactly once with the
    /// task's result. Must be called from within a tokio runtime.
    pub fn transcribe_direct(&self, source: impl Into<String>, opts: Opts) -> DirectTranscription {
        let (tx, rx) = oneshot::channel();
        let this = self.clone();
        let source = source.into();

        tokio::spawn(async move {
            let res = this.run_direct(&source, opts).await;
            // The caller may have dropped the future; nobody is left to tell.
            let _ = tx.send(res);
        });

        DirectTranscription { rx }
    }

    async fn run_direct(&self, source: &str, opts: Opts) -> Result<TranscriptionOutput> {
        let (backend, opts) = self.select(source, opts)?;
        let stager = self.stager();
        let staged = stager
            .stage(
                source,
                None,
                &opts,
                self.inner.region.as_deref(),
                backend.as_ref(),
            )
            .await?;
        let artifacts: Vec<_> = staged.artifact.iter().cloned().collect();

        let region = staged.region.clone();
        let run_res = async {
            let (source, opts) = self.prepare(backend.as_ref(), staged, opts)?;
            backend.transcribe_direct(&source, &region, &opts).await
        }
        .await;

        let cleanup_res = stager.cleanup(&artifacts).await;
        merge_run_and_cleanup(run_res, cleanup_res)
    }

    fn select(&self, source: &str, opts: Opts) -> Result<(Arc<dyn Backend>, Opts)> {
        let candidates = self.registered_backends()?;
        let (provider, opts) =
            select_provider(opts, source, &candidates, self.inner.default_provider)?;
        Ok((self.backend(provider)?, opts))
    }

    /// Create the vendor client for the staged region and apply the backend's request
    /// transform.
    fn prepare(&self, backend: &dyn Backend, staged: Staged, opts: Opts) -> Result<(String, Opts)> {
        backend.create_client(&self.inner.credentials, &staged.region)?;
        let (source, opts) = backend.transform_request(staged.source, opts)?;
        info!(
            provider = %backend.provider(),
            region = %staged.region,
            %source,
            "invoking backend"
        );
        Ok((source, opts))
    }

    fn stager(&self) -> Stager {
        Stager::new(self.inner.storage.clone(), self.inner.delete_temp_files)
    }

    /// The cached backend for `provider`, creating it on first use.
    fn backend(&self, provider: Provider) -> Result<Arc<dyn Backend>> {
        let mut cache = self
            .inner
            .backends
            .lock()
            .map_err(|_| Error::msg("backend cache lock poisoned"))?;

        if let Some(backend) = cache.get(&provider) {
            return Ok(backend.clone());
        }

        let factory = self.inner.factories.get(&provider).ok_or_else(|| {
            Error::Selection(format!("provider '{provider}' is not registered"))
        })?;
        debug!(%provider, "creating backend");
        let backend = factory(self.inner.storage.clone());
        cache.insert(provider, backend.clone());
        Ok(backend)
    }

    /// Every registered backend, in selection order.
    fn registered_backends(&self) -> Result<Vec<Arc<dyn Backend>>> {
        self.inner
            .factories
            .keys()
            .map(|provider| self.backend(*provider))
            .collect()
    }

    /// Providers this transcriber can use, in selection order.
    pub fn registered_providers(&self) -> Vec<Provider> {
        self.inner.factories.keys().copied().collect()
    }

    /// True if a registered backend claims `url` as its own storage.
    pub fn is_provider_storage_url(&self, url: &str) -> Result<bool> {
        Ok(self
            .registered_backends()?
            .iter()
            .any(|backend| backend.owns_storage_url(url)))
    }

    /// Close the vendor clients of `provider`, if any were created.
    pub fn close_client(&self, provider: Provider) -> Result<()> {
        let backend = self
            .inner
            .backends
            .lock()
            .map_err(|_| Error::msg("backend cache lock poisoned"))?
            .get(&provider)
            .cloned();

        match backend {
            Some(backend) => backend.close_client(),
            None => Ok(()),
        }
    }

    /// Close every vendor client created so far.
    ///
    /// Every backend is attempted; failures are reported together.
    pub fn close_all_clients(&self) -> Result<()> {
        let backends: Vec<Arc<dyn Backend>> = self
            .inner
            .backends
            .lock()
            .map_err(|_| Error::msg("backend cache lock poisoned"))?
            .values()
            .cloned()
            .collect();

        let errors: Vec<Error> = backends
            .iter()
            .filter_map(|backend| backend.close_client().err())
            .collect();

        match Error::combine(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Pending result of [`Transcriber::transcribe_direct`].
#[must_use = "the transcription result is only available by awaiting this future"]
pub struct DirectTranscription {
    rx: oneshot::Receiver<Result<TranscriptionOutput>>,
}

impl Future for DirectTranscription {
    type Output = Result<TranscriptionOutput>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|res| {
            res.unwrap_or_else(|_| Err(Error::msg("transcription task ended without a result")))
        })
    }
}

/// Configures and builds a [`Transcriber`].
pub struct TranscriberBuilder {
    storage: Option<Arc<dyn StorageTransfer>>,
    region: Option<String>,
    credentials: Option<CredentialsHolder>,
    delete_temp_files: bool,
    default_provider: Provider,
    factories: BTreeMap<Provider, BackendFactory>,
}

impl Default for TranscriberBuilder {
    fn default() -> Self {
        Self {
            storage: None,
            region: None,
            credentials: None,
            delete_temp_files: true,
            default_provider: DEFAULT_PROVIDER,
            factories: BTreeMap::new(),
        }
    }
}

impl TranscriberBuilder {
    /// Storage service used for staging and result transfer. Required.
    pub fn storage(mut self, storage: Arc<dyn StorageTransfer>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Pin the execution region instead of deriving it per call.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Credentials for every provider. Read from the environment when not set.
    pub fn credentials(mut self, credentials: CredentialsHolder) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Whether temporary objects and files are deleted after each call. Defaults to `true`.
    pub fn delete_temp_files(mut self, delete: bool) -> Self {
        self.delete_temp_files = delete;
        self
    }

    /// Provider used when the file type does not single one out.
    pub fn default_provider(mut self, provider: Provider) -> Self {
        self.default_provider = provider;
        self
    }

    pub fn aws(self, connector: Arc<dyn AwsConnector>) -> Self {
        self.backend(Provider::Aws, move |storage| {
            Arc::new(AwsBackend::new(connector.clone(), storage))
        })
    }

    pub fn gcp(self, connector: Arc<dyn GcpConnector>) -> Self {
        self.backend(Provider::Gcp, move |storage| {
            Arc::new(GcpBackend::new(connector.clone(), storage))
        })
    }

    /// Register a backend factory for `provider`, replacing any earlier one.
    pub fn backend<F>(mut self, provider: Provider, factory: F) -> Self
    where
        F: Fn(Arc<dyn StorageTransfer>) -> Arc<dyn Backend> + Send + Sync + 'static,
    {
        self.factories.insert(provider, Box::new(factory));
        self
    }

    pub fn build(self) -> Result<Transcriber> {
        let storage = self
            .storage
            .ok_or_else(|| Error::msg("a storage transfer service is required"))?;
        if self.factories.is_empty() {
            return Err(Error::msg("at least one backend must be registered"));
        }

        Ok(Transcriber {
            inner: Arc::new(Inner {
                storage,
                region: self.region,
                credentials: self.credentials.unwrap_or_else(CredentialsHolder::from_env),
                delete_temp_files: self.delete_temp_files,
                default_provider: self.default_provider,
                factories: self.factories,
                backends: Mutex::new(HashMap::new()),
            }),
        })
    }
}
