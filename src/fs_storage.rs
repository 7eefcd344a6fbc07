//! A [`StorageTransfer`] backed by a local directory.
//!
//! Objects live at `<root>/<provider>/<bucket>/<key>`; the region is ignored. Remote `http(s)`
//! sources are fetched with `reqwest`. Useful for development setups and tests where a real
//! bucket is not available.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::location::{ObjectRef, StorageLocation};
use crate::storage::StorageTransfer;
use crate::{Error, Result};

pub struct FsStorage {
    root: PathBuf,
    http: reqwest::Client,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path that backs `object`.
    pub fn object_path(&self, object: &ObjectRef) -> PathBuf {
        self.root
            .join(object.provider.as_str())
            .join(&object.bucket)
            .join(&object.key)
    }

    async fn copy_file(from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(from, to).await.map_err(|err| {
            Error::msg(format!(
                "failed to copy '{}' to '{}': {err}",
                from.display(),
                to.display()
            ))
        })?;
        Ok(())
    }

    async fn fetch_url(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self.http.get(url).send().await?.error_for_status()?;
        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl StorageTransfer for FsStorage {
    async fn upload(&self, local: &Path, dest: &ObjectRef) -> Result<()> {
        debug!(local = %local.display(), dest = %dest, "upload");
        Self::copy_file(local, &self.object_path(dest)).await
    }

    async fn download(&self, source: &StorageLocation) -> Result<PathBuf> {
        // Keep the file on disk; the caller removes it once it is no longer needed.
        let target = tempfile::Builder::new()
            .prefix("cloudscribe-")
            .tempfile()?
            .into_temp_path()
            .keep()
            .map_err(|err| Error::msg(format!("failed to persist download file: {err}")))?;

        debug!(source = %source, target = %target.display(), "download");
        let res = match source {
            StorageLocation::Object(obj) => Self::copy_file(&self.object_path(obj), &target).await,
            StorageLocation::Local(path) => Self::copy_file(path, &target).await,
            StorageLocation::Remote(url) => self.fetch_url(url, &target).await,
        };

        if let Err(err) = res {
            let _ = tokio::fs::remove_file(&target).await;
            return Err(err);
        }
        Ok(target)
    }

    async fn copy(&self, source: &ObjectRef, dest: &ObjectRef) -> Result<()> {
        debug!(source = %source, dest = %dest, "copy");
        Self::copy_file(&self.object_path(source), &self.object_path(dest)).await
    }

    async fn delete(&self, object: &ObjectRef) -> Result<()> {
        debug!(object = %object, "delete");
        tokio::fs::remove_file(self.object_path(object))
            .await
            .map_err(|err| Error::msg(format!("failed to delete '{object}': {err}")))
    }
}
