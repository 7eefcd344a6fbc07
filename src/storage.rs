use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::Result;
use crate::location::{ObjectRef, StorageLocation};

/// Object-storage operations the orchestration layer relies on.
///
/// Implementations talk to S3 / Cloud Storage (or anything else); cloudscribe only decides
/// *what* to move where. All errors are propagated as-is and wrapped with stage context by
/// the caller.
#[async_trait]
pub trait StorageTransfer: Send + Sync {
    /// Upload the local file at `local` to `dest`.
    async fn upload(&self, local: &Path, dest: &ObjectRef) -> Result<()>;

    /// Download `source` into a new local file and return its path.
    ///
    /// The caller owns the returned file and is responsible for removing it.
    async fn download(&self, source: &StorageLocation) -> Result<PathBuf>;

    /// Copy an object, possibly across regions.
    async fn copy(&self, source: &ObjectRef, dest: &ObjectRef) -> Result<()>;

    /// Delete an object.
    async fn delete(&self, object: &ObjectRef) -> Result<()>;
}
