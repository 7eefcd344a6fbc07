//! `cloudscribe`: vendor-neutral speech-to-text on top of cloud transcription services.
//!
//! This crate provides:
//! - Provider selection from the requested features and the audio file type
//! - Staging of local files and remote URLs into the selected provider's storage
//! - Job tracking for job-based providers, with a bounded poll loop
//! - Cleanup of every temporary artifact a call creates
//!
//! Vendor SDKs and object storage are reached through small traits (`AwsConnector`,
//! `GcpConnector`, `StorageTransfer`) so the orchestration stays testable and SDK-agnostic.

// High-level API (most consumers should start here).
pub mod opts;
pub mod transcriber;

// Request vocabulary.
pub mod job_name;
pub mod provider;
pub mod redaction;

// Selection and capabilities.
pub mod capabilities;
pub mod selector;

// Locations, storage and staging.
pub mod fs_storage;
pub mod location;
pub mod staging;
pub mod storage;

// Backend interface and the built-in vendor adapters.
pub mod backend;
pub mod backends;
pub mod credentials;
pub mod job;

mod error;

#[cfg(test)]
mod testing;

// Logging configuration.
#[cfg(feature = "logging")]
mod logging;

pub use backend::{Backend, TranscriptionOutput};
pub use credentials::{AwsCredentials, CredentialsHolder, GcpCredentials};
pub use error::{Error, Result};
pub use fs_storage::FsStorage;
pub use location::{ObjectRef, StorageLocation};
pub use opts::Opts;
pub use provider::Provider;
pub use storage::StorageTransfer;
pub use transcriber::{DirectTranscription, Transcriber, TranscriberBuilder};

#[cfg(feature = "logging")]
pub use logging::{LOG_ENV, init_logging};
