//! Content redaction settings.
//!
//! Redaction is a vendor feature that removes categories of sensitive information from the
//! transcript. Only AWS Transcribe offers it today; requesting it pins provider selection.

use serde::{Deserialize, Serialize};

/// Category of information to redact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedactionType {
    /// Personally identifiable information.
    #[serde(rename = "PII")]
    Pii,
}

impl RedactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedactionType::Pii => "PII",
        }
    }
}

/// A kind of entity to remove from the transcript.
///
/// `Custom` forwards a vendor value cloudscribe does not model yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedactionEntityType {
    BankAccountNumber,
    BankRouting,
    CreditDebitNumber,
    CreditDebitCvv,
    CreditDebitExpiry,
    Pin,
    Email,
    Address,
    Name,
    Phone,
    Ssn,
    All,
    #[serde(untagged)]
    Custom(String),
}

impl RedactionEntityType {
    pub fn as_str(&self) -> &str {
        match self {
            RedactionEntityType::BankAccountNumber => "BANK_ACCOUNT_NUMBER",
            RedactionEntityType::BankRouting => "BANK_ROUTING",
            RedactionEntityType::CreditDebitNumber => "CREDIT_DEBIT_NUMBER",
            RedactionEntityType::CreditDebitCvv => "CREDIT_DEBIT_CVV",
            RedactionEntityType::CreditDebitExpiry => "CREDIT_DEBIT_EXPIRY",
            RedactionEntityType::Pin => "PIN",
            RedactionEntityType::Email => "EMAIL",
            RedactionEntityType::Address => "ADDRESS",
            RedactionEntityType::Name => "NAME",
            RedactionEntityType::Phone => "PHONE",
            RedactionEntityType::Ssn => "SSN",
            RedactionEntityType::All => "ALL",
            RedactionEntityType::Custom(raw) => raw,
        }
    }
}

/// Whether only the redacted transcript is produced, or both versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionOutput {
    Redacted,
    RedactedAndUnredacted,
}

impl RedactionOutput {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedactionOutput::Redacted => "redacted",
            RedactionOutput::RedactedAndUnredacted => "redacted_and_unredacted",
        }
    }
}

/// Redaction configuration attached to a request.
///
/// The all-unset value means "redaction disabled"; use [`ContentRedactionConfig::is_empty`]
/// to test for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentRedactionConfig {
    /// Category to redact. When redaction is enabled but this is unset, PII is assumed.
    pub redaction_type: Option<RedactionType>,

    /// Entity kinds to redact.
    pub entity_types: Vec<RedactionEntityType>,

    /// Which transcripts the vendor should produce.
    pub output: Option<RedactionOutput>,
}

impl ContentRedactionConfig {
    /// True when no redaction field is set, i.e. redaction is disabled.
    pub fn is_empty(&self) -> bool {
        self.redaction_type.is_none() && self.entity_types.is_empty() && self.output.is_none()
    }
}
