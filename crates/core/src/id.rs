//! Correlation identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Pairs one outbound request with exactly one response.
///
/// Freshly generated ids are random UUIDv4. Callers may also supply their own
/// (e.g. an upstream request id) as long as it is non-empty and not reused for
/// another in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

/// Rejected caller-supplied correlation id.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("correlation id cannot be empty")]
pub struct ParseCorrelationIdError;

impl FromStr for CorrelationId {
    type Err = ParseCorrelationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseCorrelationIdError);
        }
        Ok(Self(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_v4_and_unique() {
        let a = CorrelationId::generate();
        let b = CorrelationId::generate();
        assert_ne!(a, b);

        let parsed = Uuid::parse_str(a.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn caller_supplied_ids_are_kept_verbatim() {
        let id: CorrelationId = "req-42".parse().unwrap();
        assert_eq!(id.as_str(), "req-42");
    }

    #[test]
    fn blank_id_is_a_parse_error() {
        assert_eq!("   ".parse::<CorrelationId>(), Err(ParseCorrelationIdError));
        assert_eq!(
            ParseCorrelationIdError.to_string(),
            "correlation id cannot be empty"
        );
    }
}
