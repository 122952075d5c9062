//! Error types for zonesync
//!
//! Every failure the reconciliation core can surface is one variant of
//! [`Error`]. Only a provider "record not found" answer to a removal is ever
//! absorbed locally; everything else propagates to the caller unchanged.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Provider error codes that mean "the record to remove is already gone"
const RECORD_NOT_FOUND_CODES: &[&str] = &["RR_NOT_FOUND", "RECORD_NOT_FOUND"];

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Host handed us a value of the wrong container type
    #[error("Unexpected input shape: {0}")]
    Shape(String),

    /// Declared configuration violates a record type's rules
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The remote API answered with `result: "error"`
    #[error("Provider error for {domain}: {code}: {text}")]
    Provider {
        /// Domain the error was reported for (empty for top-level errors)
        domain: String,
        /// Provider error code
        code: String,
        /// Provider error text
        text: String,
    },

    /// The network call itself failed
    #[error("Transport error during {operation}: {message}")]
    Transport {
        /// API operation being attempted
        operation: String,
        /// Underlying transport message
        message: String,
    },

    /// Provider response could not be decoded
    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Capability not offered by a resource kind
    #[error("{operation} is not supported by {kind}")]
    Unsupported {
        /// Requested operation
        operation: String,
        /// Resource kind name
        kind: String,
    },

    /// A provider write failed; carries the record it was applied to
    #[error("{operation} of {record_type} record {record} failed: {source}")]
    Operation {
        /// "add" or "remove"
        operation: String,
        /// Record type tag
        record_type: String,
        /// Human-readable record description
        record: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a shape error
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a provider error
    pub fn provider(
        domain: impl Into<String>,
        code: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::Provider {
            domain: domain.into(),
            code: code.into(),
            text: text.into(),
        }
    }

    /// Create a transport error
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an "unsupported capability" error
    pub fn unsupported(operation: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            kind: kind.into(),
        }
    }

    /// Wrap a write failure with the record it was applied to
    pub fn operation(
        operation: impl Into<String>,
        record_type: impl Into<String>,
        record: impl Into<String>,
        source: Error,
    ) -> Self {
        Self::Operation {
            operation: operation.into(),
            record_type: record_type.into(),
            record: record.into(),
            source: Box::new(source),
        }
    }

    /// Whether the provider reported that the targeted record does not exist
    ///
    /// Looks through [`Error::Operation`] wrappers.
    pub fn is_record_not_found(&self) -> bool {
        match self {
            Self::Provider { code, .. } => RECORD_NOT_FOUND_CODES.contains(&code.as_str()),
            Self::Operation { source, .. } => source.is_record_not_found(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_codes() {
        assert!(Error::provider("example.com", "RR_NOT_FOUND", "gone").is_record_not_found());
        assert!(Error::provider("example.com", "RECORD_NOT_FOUND", "gone").is_record_not_found());
        assert!(!Error::provider("example.com", "DOMAIN_NOT_FOUND", "x").is_record_not_found());
        assert!(!Error::not_found("example.com/www").is_record_not_found());
    }

    #[test]
    fn test_not_found_through_operation_wrapper() {
        let inner = Error::provider("example.com", "RR_NOT_FOUND", "gone");
        let err = Error::operation("remove", "A", "www 1.1.1.1", inner);
        assert!(err.is_record_not_found());
        assert!(err.to_string().contains("remove of A record www 1.1.1.1 failed"));
    }

    #[test]
    fn test_json_error_is_parse() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, Error::Parse(_)));
    }
}
