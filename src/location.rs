//! Classification of source/destination strings into storage locations.
//!
//! Everything here is pure pattern matching: no network or filesystem access. Whether a
//! local path actually exists is checked later, by the staging pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::capabilities::capabilities;
use crate::provider::Provider;

/// A stored object on one provider's storage service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub provider: Provider,
    pub bucket: String,
    pub key: String,

    /// Region the object lives in, when the address says so.
    pub region: Option<String>,
}

impl ObjectRef {
    pub fn new(provider: Provider, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            provider,
            bucket: bucket.into(),
            key: key.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Canonical URL for this object, in the provider's preferred addressing scheme.
    ///
    /// S3 objects with a known region use the virtual-hosted https form so the region travels
    /// with the address.
    pub fn url(&self) -> String {
        match (self.provider, self.region.as_deref()) {
            (Provider::Aws, Some(region)) => format!(
                "https://{}.s3.{region}.amazonaws.com/{}",
                self.bucket, self.key
            ),
            (Provider::Aws, None) => format!("s3://{}/{}", self.bucket, self.key),
            (Provider::Gcp, _) => format!("gs://{}/{}", self.bucket, self.key),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Where a source or destination lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// An object on a provider's native storage.
    Object(ObjectRef),

    /// Any other `http(s)` URL.
    Remote(String),

    /// A path on the local filesystem.
    Local(PathBuf),
}

impl StorageLocation {
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            StorageLocation::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Region implied by the location, if any.
    pub fn region(&self) -> Option<&str> {
        self.as_object().and_then(|obj| obj.region.as_deref())
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Object(obj) => obj.fmt(f),
            StorageLocation::Remote(url) => f.write_str(url),
            StorageLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Classify `raw` by matching it against each provider's URL conventions.
///
/// Anything that is neither a provider storage URL nor an `http(s)` URL is treated as a
/// local path.
pub fn parse_location(raw: &str) -> StorageLocation {
    for provider in Provider::ALL {
        if let Some(obj) = parse_object_url(provider, raw) {
            return StorageLocation::Object(obj);
        }
    }

    if is_http_url(raw) {
        return StorageLocation::Remote(raw.to_owned());
    }

    StorageLocation::Local(PathBuf::from(raw))
}

/// True if `raw` addresses an object on `provider`'s storage service.
pub fn is_provider_storage_url(provider: Provider, raw: &str) -> bool {
    parse_object_url(provider, raw).is_some()
}

/// Parse `raw` as an object URL of `provider`, or `None` if it is not one.
pub fn parse_object_url(provider: Provider, raw: &str) -> Option<ObjectRef> {
    let url = Url::parse(raw.trim()).ok()?;
    match provider {
        Provider::Aws => parse_s3_url(&url),
        Provider::Gcp => parse_gcs_url(&url),
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

// s3://bucket/key
// https://bucket.s3.amazonaws.com/key
// https://bucket.s3.region.amazonaws.com/key
// https://s3.region.amazonaws.com/bucket/key
fn parse_s3_url(url: &Url) -> Option<ObjectRef> {
    let host = url.host_str()?;

    if url.scheme() == "s3" {
        let key = path_key(url);
        return non_empty_bucket(host).map(|bucket| ObjectRef::new(Provider::Aws, bucket, key));
    }

    if url.scheme() != "https" {
        return None;
    }

    let rest = host.strip_suffix(".amazonaws.com")?;
    let default_region = capabilities(Provider::Aws).default_region;

    // Path-style: the host starts with the service name.
    if rest == "s3" || rest.starts_with("s3.") || rest.starts_with("s3-") {
        let region = rest
            .strip_prefix("s3.")
            .or_else(|| rest.strip_prefix("s3-"))
            .unwrap_or(default_region);
        let path = url.path().trim_start_matches('/');
        let (bucket, key) = path.split_once('/').unwrap_or((path, ""));
        return non_empty_bucket(bucket)
            .map(|bucket| ObjectRef::new(Provider::Aws, bucket, key).with_region(region));
    }

    // Virtual-hosted style: `<bucket>.s3[.<region>]`.
    let (bucket, service) = rest.split_once(".s3")?;
    let region = match service.strip_prefix('.').or_else(|| service.strip_prefix('-')) {
        Some(region) if !region.is_empty() => region,
        _ if service.is_empty() => default_region,
        _ => return None,
    };

    non_empty_bucket(bucket)
        .map(|bucket| ObjectRef::new(Provider::Aws, bucket, path_key(url)).with_region(region))
}

// gs://bucket/key
// https://storage.cloud.google.com/bucket/key
// https://storage.googleapis.com/bucket/key
fn parse_gcs_url(url: &Url) -> Option<ObjectRef> {
    match url.scheme() {
        "gs" => {
            let bucket = non_empty_bucket(url.host_str()?)?;
            Some(ObjectRef::new(Provider::Gcp, bucket, path_key(url)))
        }
        "https" => {
            let host = url.host_str()?;
            if host != "storage.cloud.google.com" && host != "storage.googleapis.com" {
                return None;
            }
            let path = url.path().trim_start_matches('/');
            let (bucket, key) = path.split_once('/').unwrap_or((path, ""));
            non_empty_bucket(bucket).map(|bucket| ObjectRef::new(Provider::Gcp, bucket, key))
        }
        _ => None,
    }
}

fn path_key(url: &Url) -> String {
    url.path().trim_start_matches('/').to_owned()
}

fn non_empty_bucket(bucket: &str) -> Option<&str> {
    (!bucket.is_empty()).then_some(bucket)
}

/// File type (extension without the period) of a file name, path or URL.
///
/// Only the last extension of the final path segment counts: `"test.tar.gz"` → `"gz"`.
/// Names without an extension yield `""`.
pub fn file_type_from_name(name: &str) -> &str {
    let without_query = name.split(['?', '#']).next().unwrap_or(name);
    let file_name = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_query);

    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

/// File type of a local path, using the same rules as [`file_type_from_name`].
pub fn file_type_from_path(path: &Path) -> String {
    file_type_from_name(&path.to_string_lossy()).to_owned()
}
