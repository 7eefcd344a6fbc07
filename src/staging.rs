//! Source staging: making the audio readable by the selected backend.
//!
//! Staging classifies the source, resolves the execution region, and when the backend cannot
//! read the source where it is, moves a copy into the temp bucket. Every object created here
//! is owned by the call that created it and is handed back as a [`StagedArtifact`] so the
//! caller can delete it once the backend is done.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::Backend;
use crate::location::{
    ObjectRef, StorageLocation, file_type_from_name, file_type_from_path, parse_location,
    parse_object_url,
};
use crate::opts::Opts;
use crate::storage::StorageTransfer;
use crate::{Error, Result};

/// An object created while staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub location: ObjectRef,

    /// Whether the object exists only for this call and may be deleted afterwards.
    pub delete_after_use: bool,
}

/// Result of staging a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    /// The location to hand to the backend.
    pub source: String,

    /// The temporary object created for this call, if any.
    pub artifact: Option<StagedArtifact>,

    /// Region the backend should run in.
    pub region: String,
}

pub struct Stager {
    storage: Arc<dyn StorageTransfer>,
    delete_temp_files: bool,
}

impl Stager {
    pub fn new(storage: Arc<dyn StorageTransfer>, delete_temp_files: bool) -> Self {
        Self {
            storage,
            delete_temp_files,
        }
    }

    /// Make `source` readable by `backend`.
    ///
    /// `pinned_region` is the caller-configured execution region; when unset the region is
    /// taken from the source, then the destination, then the backend default.
    pub async fn stage(
        &self,
        source: &str,
        destination: Option<&str>,
        opts: &Opts,
        pinned_region: Option<&str>,
        backend: &dyn Backend,
    ) -> Result<Staged> {
        let provider = backend.provider();
        let location = parse_location(source);
        let region = resolve_region(pinned_region, source, destination, backend);

        if backend.owns_storage_url(source) {
            let relocate = parse_object_url(provider, source).filter(|obj| {
                matches!(
                    (pinned_region, obj.region.as_deref()),
                    (Some(pinned), Some(actual)) if pinned != actual
                )
            });
            let Some(obj) = relocate else {
                debug!(%source, %region, "source already on provider storage");
                return Ok(Staged {
                    source: source.to_owned(),
                    artifact: None,
                    region,
                });
            };

            let dest = temp_object(opts, source, file_type_from_name(&obj.key), &region, backend)?;
            info!(from = %obj, to = %dest, "copying source into execution region");
            self.storage.copy(&obj, &dest).await.map_err(|err| {
                Error::staging(format!("failed to copy '{obj}' to '{dest}'"), err)
            })?;
            return Ok(self.staged_upload(dest, region, backend));
        }

        match &location {
            StorageLocation::Object(_) => {
                let file_type = file_type_from_name(source).to_owned();
                self.materialize(&location, source, &file_type, opts, region, backend)
                    .await
            }

            StorageLocation::Remote(_) if backend.supports_direct_file_input() => {
                debug!(%source, "backend reads remote source directly");
                Ok(Staged {
                    source: source.to_owned(),
                    artifact: None,
                    region,
                })
            }

            StorageLocation::Remote(_) => {
                let file_type = file_type_from_name(source).to_owned();
                self.materialize(&location, source, &file_type, opts, region, backend)
                    .await
            }

            StorageLocation::Local(path) => {
                let is_file = tokio::fs::metadata(path)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false);
                if !is_file {
                    return Err(Error::Staging(format!(
                        "source file '{}' does not exist",
                        path.display()
                    )));
                }

                if backend.supports_direct_file_input() {
                    debug!(%source, "backend reads local source directly");
                    return Ok(Staged {
                        source: source.to_owned(),
                        artifact: None,
                        region,
                    });
                }

                let dest = temp_object(opts, source, &file_type_from_path(path), &region, backend)?;
                self.upload(path, &dest).await?;
                Ok(self.staged_upload(dest, region, backend))
            }
        }
    }

    /// Download a remote or foreign source and upload it to the temp bucket.
    async fn materialize(
        &self,
        location: &StorageLocation,
        source: &str,
        file_type: &str,
        opts: &Opts,
        region: String,
        backend: &dyn Backend,
    ) -> Result<Staged> {
        let dest = temp_object(opts, source, file_type, &region, backend)?;

        let local = self
            .storage
            .download(location)
            .await
            .map_err(|err| Error::staging(format!("failed to download '{source}'"), err))?;
        debug!(%source, local = %local.display(), "downloaded source");

        let uploaded = self.upload(&local, &dest).await;

        if self.delete_temp_files {
            if let Err(err) = tokio::fs::remove_file(&local).await {
                warn!(path = %local.display(), error = %err, "failed to remove local temp file");
            }
        }

        uploaded?;
        Ok(self.staged_upload(dest, region, backend))
    }

    async fn upload(&self, local: &Path, dest: &ObjectRef) -> Result<()> {
        info!(local = %local.display(), dest = %dest, "uploading source to temp bucket");
        self.storage.upload(local, dest).await.map_err(|err| {
            Error::staging(
                format!("failed to upload '{}' to '{dest}'", local.display()),
                err,
            )
        })
    }

    fn staged_upload(&self, dest: ObjectRef, region: String, backend: &dyn Backend) -> Staged {
        Staged {
            source: backend.storage_url(&dest),
            artifact: Some(StagedArtifact {
                location: dest,
                delete_after_use: true,
            }),
            region,
        }
    }

    /// Delete the cleanup-eligible `artifacts`, if temp file deletion is enabled.
    ///
    /// Every artifact is attempted; failures are reported together.
    pub async fn cleanup(&self, artifacts: &[StagedArtifact]) -> Result<()> {
        if !self.delete_temp_files {
            return Ok(());
        }

        let mut errors = Vec::new();
        for artifact in artifacts.iter().filter(|a| a.delete_after_use) {
            debug!(artifact = %artifact.location, "deleting staged artifact");
            if let Err(err) = self.storage.delete(&artifact.location).await {
                errors.push(Error::Cleanup {
                    location: artifact.location.to_string(),
                    message: err.to_string(),
                });
            }
        }

        match Error::combine(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Combine the outcome of a backend call with the outcome of its cleanup.
///
/// Neither failure hides the other: a cleanup error surfaces even when the call succeeded.
pub(crate) fn merge_run_and_cleanup<T>(run_res: Result<T>, cleanup_res: Result<()>) -> Result<T> {
    match (run_res, cleanup_res) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup_err)) => Err(Error::Multiple(vec![err, cleanup_err])),
    }
}

fn resolve_region(
    pinned: Option<&str>,
    source: &str,
    destination: Option<&str>,
    backend: &dyn Backend,
) -> String {
    if let Some(region) = pinned {
        return region.to_owned();
    }

    let own_region = |url: &str| {
        if !backend.owns_storage_url(url) {
            return None;
        }
        parse_object_url(backend.provider(), url).and_then(|obj| obj.region)
    };

    own_region(source)
        .or_else(|| destination.and_then(own_region))
        .unwrap_or_else(|| backend.default_region().to_owned())
}

fn temp_object(
    opts: &Opts,
    source: &str,
    file_type: &str,
    region: &str,
    backend: &dyn Backend,
) -> Result<ObjectRef> {
    if opts.temp_bucket.is_empty() {
        return Err(Error::Staging(format!(
            "a temp bucket is required to stage '{source}' for {}",
            backend.provider()
        )));
    }

    let id = Uuid::new_v4();
    let key = if file_type.is_empty() {
        id.to_string()
    } else {
        format!("{id}.{file_type}")
    };
    Ok(ObjectRef::new(backend.provider(), &opts.temp_bucket, key).with_region(region))
}
