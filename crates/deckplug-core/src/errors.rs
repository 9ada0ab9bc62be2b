//! Error types for envelope and payload handling.
//!
//! - [`EnvelopeDecodeError`]: an inbound frame was not a valid envelope
//! - [`EnvelopeEncodeError`]: an outbound envelope could not be serialized
//! - [`PayloadDecodeError`]: a payload did not match the requested shape
//! - [`ContractViolation`]: panic payload raised when the dispatch path breaks
//!   a routing invariant

use std::fmt;

use thiserror::Error;

/// An inbound frame could not be decoded into an [`Event`](crate::Event).
#[derive(Debug, Error)]
#[error("failed to decode event envelope: {source}")]
pub struct EnvelopeDecodeError {
    /// Underlying JSON error.
    #[source]
    pub source: serde_json::Error,
}

/// An outbound envelope or payload could not be serialized.
#[derive(Debug, Error)]
#[error("failed to encode {event_name} event: {source}")]
pub struct EnvelopeEncodeError {
    /// Event name of the envelope being encoded.
    pub event_name: String,
    /// Underlying JSON error.
    #[source]
    pub source: serde_json::Error,
}

/// A payload did not match the shape a handler asked for.
#[derive(Debug, Error)]
#[error("failed to decode {event_name} payload: {source}")]
pub struct PayloadDecodeError {
    /// Event name whose payload failed to decode.
    pub event_name: String,
    /// Underlying JSON error.
    #[source]
    pub source: serde_json::Error,
}

/// A routing invariant was broken inside the dispatch path.
///
/// Raised as a panic payload via [`std::panic::panic_any`]. It signals a bug,
/// not bad input, and the handler registry turns it into a process abort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractViolation {
    /// Operation that detected the violation.
    pub operation: &'static str,
    /// What was wrong.
    pub detail: String,
}

impl ContractViolation {
    /// Create a violation record.
    pub fn new(operation: &'static str, detail: impl Into<String>) -> Self {
        Self {
            operation,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contract violation in {}: {}", self.operation, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{\"message\": \"test\"").unwrap_err()
    }

    #[test]
    fn payload_error_names_event() {
        let err = PayloadDecodeError {
            event_name: "keyDown".into(),
            source: json_error(),
        };
        assert!(err.to_string().starts_with("failed to decode keyDown payload"));
    }

    #[test]
    fn payload_error_exposes_source() {
        let err = PayloadDecodeError {
            event_name: "keyDown".into(),
            source: json_error(),
        };
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn envelope_decode_display() {
        let err = EnvelopeDecodeError {
            source: json_error(),
        };
        assert!(err.to_string().contains("failed to decode event envelope"));
    }

    #[test]
    fn contract_violation_display() {
        let violation = ContractViolation::new("add context", "empty instance-context id");
        assert_eq!(
            violation.to_string(),
            "contract violation in add context: empty instance-context id"
        );
    }
}
