use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

use crate::provider::Provider;

/// cloudscribe's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// cloudscribe's crate-wide error type.
///
/// Each orchestration stage has its own variant so callers can tell where a call failed.
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// No registered backend satisfies the requested feature combination.
    #[error("provider selection failed: {0}")]
    Selection(String),

    /// The source could not be classified, downloaded, uploaded or relocated.
    #[error("staging failed: {0}")]
    Staging(String),

    /// The vendor session for a backend could not be established.
    #[error("failed to create {provider} service client: {message}")]
    ClientConstruction { provider: Provider, message: String },

    /// The vendor rejected or failed to process a request.
    #[error("{provider} transcription request failed: {message}")]
    Invocation { provider: Provider, message: String },

    /// The vendor accepted a job but it terminated unsuccessfully.
    #[error("transcription job '{job_name}' failed: {reason}")]
    JobFailed { job_name: String, reason: String },

    /// A job did not reach a terminal state before the configured deadline.
    #[error("transcription job '{job_name}' did not finish within {waited:?}")]
    JobTimedOut { job_name: String, waited: Duration },

    /// A temporary artifact could not be deleted.
    #[error("failed to delete temporary artifact '{location}': {message}")]
    Cleanup { location: String, message: String },

    /// Several independent failures (e.g. a failed transcription plus a failed cleanup).
    #[error("{}", join_messages(.0))]
    Multiple(Vec<Error>),

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub(crate) fn staging(context: impl AsRef<str>, err: impl std::fmt::Display) -> Self {
        Self::Staging(format!("{}: {err}", context.as_ref()))
    }

    pub(crate) fn client(provider: Provider, err: impl std::fmt::Display) -> Self {
        Self::ClientConstruction {
            provider,
            message: err.to_string(),
        }
    }

    pub(crate) fn invocation(provider: Provider, err: impl std::fmt::Display) -> Self {
        Self::Invocation {
            provider,
            message: err.to_string(),
        }
    }

    /// Combine a list of errors into one, or `None` when the list is empty.
    ///
    /// A single error is returned as-is rather than wrapped.
    pub fn combine(mut errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_empty_is_none() {
        assert!(Error::combine(Vec::new()).is_none());
    }

    #[test]
    fn combine_single_is_unwrapped() {
        let err = Error::combine(vec![Error::msg("boom")]).expect("one error");
        assert!(matches!(err, Error::Message(ref m) if m == "boom"));
    }

    #[test]
    fn combine_many_keeps_every_message() {
        let err = Error::combine(vec![
            Error::invocation(Provider::Aws, "quota exceeded"),
            Error::Cleanup {
                location: "s3://tmp/a".into(),
                message: "access denied".into(),
            },
        ])
        .expect("two errors");

        let text = err.to_string();
        assert!(matches!(err, Error::Multiple(ref v) if v.len() == 2));
        assert!(text.contains("quota exceeded"));
        assert!(text.contains("access denied"));
    }
}
