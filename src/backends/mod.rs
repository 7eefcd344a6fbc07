/// AWS Transcribe (job-based).
pub mod aws;

/// Google Cloud Speech-to-Text (direct).
pub mod gcp;
