use std::fmt;
use std::path::PathBuf;

/// AWS access key pair (plus optional session token).
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Google service-account credentials file.
#[derive(Clone, PartialEq, Eq)]
pub struct GcpCredentials {
    pub service_account_file: PathBuf,
}

/// Per-provider credential material handed to backend connectors.
///
/// Acquiring and storing credentials is up to the caller; this is only the carrier.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialsHolder {
    pub aws: Option<AwsCredentials>,
    pub gcp: Option<GcpCredentials>,
}

impl CredentialsHolder {
    /// Read credentials from the standard environment variables.
    ///
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`
    /// - `GOOGLE_APPLICATION_CREDENTIALS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary key lookup (environment, config map, ...).
    ///
    /// Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let aws = match (get("AWS_ACCESS_KEY_ID"), get("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(AwsCredentials {
                access_key_id,
                secret_access_key,
                session_token: get("AWS_SESSION_TOKEN"),
            }),
            _ => None,
        };

        let gcp = get("GOOGLE_APPLICATION_CREDENTIALS").map(|path| GcpCredentials {
            service_account_file: PathBuf::from(path),
        });

        Self { aws, gcp }
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl fmt::Debug for GcpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcpCredentials")
            .field("service_account_file", &self.service_account_file)
            .finish()
    }
}

impl fmt::Debug for CredentialsHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsHolder")
            .field("aws", &self.aws)
            .field("gcp", &self.gcp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_both_providers() {
        let creds = CredentialsHolder::from_lookup(lookup(&[
            ("AWS_ACCESS_KEY_ID", "AKIA123"),
            ("AWS_SECRET_ACCESS_KEY", "s3cr3t"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/etc/gcp.json"),
        ]));

        let aws = creds.aws.expect("aws credentials");
        assert_eq!(aws.access_key_id, "AKIA123");
        assert!(aws.session_token.is_none());
        assert_eq!(
            creds.gcp.expect("gcp credentials").service_account_file,
            PathBuf::from("/etc/gcp.json")
        );
    }

    #[test]
    fn incomplete_aws_pair_is_missing() {
        let creds = CredentialsHolder::from_lookup(lookup(&[
            ("AWS_ACCESS_KEY_ID", "AKIA123"),
            ("AWS_SECRET_ACCESS_KEY", "  "),
        ]));
        assert!(creds.aws.is_none());
        assert!(creds.gcp.is_none());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = CredentialsHolder::from_lookup(lookup(&[
            ("AWS_ACCESS_KEY_ID", "AKIA123"),
            ("AWS_SECRET_ACCESS_KEY", "s3cr3t"),
            ("AWS_SESSION_TOKEN", "tok3n"),
        ]));
        let printed = format!("{creds:?}");
        assert!(printed.contains("AKIA123"));
        assert!(!printed.contains("s3cr3t"));
        assert!(!printed.contains("tok3n"));
    }
}
