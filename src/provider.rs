use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of cloud transcription vendors cloudscribe knows how to drive.
///
/// Capability differences between vendors drive provider selection, so this is a closed enum
/// rather than an open plugin registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// AWS Transcribe (job-based) with S3 storage.
    Aws,

    /// Google Cloud Speech-to-Text (direct) with Cloud Storage.
    Gcp,
}

/// Provider used when selection heuristics do not single out a backend.
pub const DEFAULT_PROVIDER: Provider = Provider::Aws;

impl Provider {
    /// Every known provider, in selection order.
    pub const ALL: [Provider; 2] = [Provider::Aws, Provider::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Gcp => "gcp",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "gcp" | "google" => Ok(Provider::Gcp),
            other => Err(format!("unknown provider '{other}' (expected 'aws' or 'gcp')")),
        }
    }
}
