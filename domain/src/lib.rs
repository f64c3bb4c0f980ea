use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error; // For domain-specific errors

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Invalid email address '{value}': {reason}")]
    InvalidEmail { value: String, reason: String },
}

// --- Email Address ---

/// A syntactically validated email address.
///
/// Validation runs in `TryFrom<String>`, which serde invokes while
/// deserializing, so a malformed address never constructs a `Message`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(raw: String) -> Result<Self, DomainError> {
        Self::try_from(raw)
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(raw: String) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidEmail {
            value: raw.clone(),
            reason: reason.to_string(),
        };

        if raw.chars().any(char::is_whitespace) {
            return Err(invalid("must not contain whitespace"));
        }
        let Some((local, domain)) = raw.split_once('@') else {
            return Err(invalid("missing '@' separator"));
        };
        if local.is_empty() {
            return Err(invalid("local part is empty"));
        }
        if domain.contains('@') {
            return Err(invalid("contains more than one '@'"));
        }
        if !domain.contains('.') {
            return Err(invalid("domain must contain a '.'"));
        }
        if domain.split('.').any(|label| label.is_empty()) {
            return Err(invalid("domain contains an empty label"));
        }

        Ok(Self(raw))
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Record Kinds ---

/// A portfolio project entry.
///
/// Read-only from this service's perspective; records are authored
/// directly in the datastore. Unset optional fields are omitted from the
/// serialized form so listings only carry the fields a record actually has.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    /// Project title.
    pub title: String,
    /// Short description.
    pub summary: String,
    /// Tags/technologies, in display order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Live/demo URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Repository URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

/// An inbound contact-form submission.
///
/// Written once to storage when a datastore is configured; never read back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    /// Sender name.
    pub name: String,
    /// Sender email.
    pub email: EmailAddress,
    /// Optional subject line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Message body.
    pub message: String,
}
