//! SMTP envelope addresses.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing an SMTP address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Empty input.
    #[error("Empty address")]
    Empty,

    /// Missing the `@` separator.
    #[error("Missing '@' separator in address: {0}")]
    MissingAtSign(String),

    /// Nothing before the `@` separator.
    #[error("Empty local-part in address: {0}")]
    EmptyLocalPart(String),

    /// Nothing after the `@` separator.
    #[error("Empty domain in address: {0}")]
    EmptyDomain(String),

    /// Whitespace or control characters in the address.
    #[error("Invalid character in address: {0}")]
    InvalidCharacter(String),
}

/// An SMTP envelope address (`local-part@domain`).
///
/// Immutable once parsed; the domain is kept as written and lower-cased on
/// demand for domain-alias matching.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    local_part: String,
    domain: String,
}

impl Address {
    /// Parses `local-part@domain` text into an [`Address`].
    ///
    /// The split happens at the last `@`, so a quoted local-part containing
    /// `@` keeps its quoting intact.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if the input is empty, lacks a separator, has
    /// an empty side, or contains whitespace or control characters.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        if trimmed
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control())
        {
            return Err(AddressError::InvalidCharacter(trimmed.to_string()));
        }

        let (local_part, domain) = trimmed
            .rsplit_once('@')
            .ok_or_else(|| AddressError::MissingAtSign(trimmed.to_string()))?;

        if local_part.is_empty() {
            return Err(AddressError::EmptyLocalPart(trimmed.to_string()));
        }

        if domain.is_empty() {
            return Err(AddressError::EmptyDomain(trimmed.to_string()));
        }

        Ok(Self {
            local_part: local_part.to_string(),
            domain: domain.to_string(),
        })
    }

    /// The part before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// The part after the `@`, as written.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The lower-cased domain, as used for domain-alias matching.
    #[must_use]
    pub fn domain_lowercase(&self) -> String {
        self.domain.to_lowercase()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_simple() {
        let address = Address::parse("user@example.com").unwrap();
        assert_eq!(address.local_part(), "user");
        assert_eq!(address.domain(), "example.com");
        assert_eq!(address.to_string(), "user@example.com");
    }

    #[test]
    fn test_parse_preserves_case() {
        let address = Address::parse("User@Example.COM").unwrap();
        assert_eq!(address.to_string(), "User@Example.COM");
        assert_eq!(address.domain_lowercase(), "example.com");
    }

    #[test]
    fn test_parse_splits_at_last_separator() {
        let address = Address::parse("\"a@b\"@example.com").unwrap();
        assert_eq!(address.local_part(), "\"a@b\"");
        assert_eq!(address.domain(), "example.com");
    }

    #[test]
    fn test_parse_trims_surrounding_whitespace() {
        let address = Address::parse("  user@example.com  ").unwrap();
        assert_eq!(address.to_string(), "user@example.com");
    }

    #[test]
    fn test_parse_rejects_invalid_input() {
        assert_eq!(Address::parse(""), Err(AddressError::Empty));
        assert_eq!(Address::parse("   "), Err(AddressError::Empty));
        assert_eq!(
            Address::parse("user"),
            Err(AddressError::MissingAtSign("user".to_string()))
        );
        assert_eq!(
            Address::parse("@example.com"),
            Err(AddressError::EmptyLocalPart("@example.com".to_string()))
        );
        assert_eq!(
            Address::parse("user@"),
            Err(AddressError::EmptyDomain("user@".to_string()))
        );
        assert_eq!(
            Address::parse("us er@example.com"),
            Err(AddressError::InvalidCharacter("us er@example.com".to_string()))
        );
    }

    #[test]
    fn test_from_str_roundtrip() {
        let address: Address = "user@example.com".parse().unwrap();
        assert_eq!(address, Address::parse("user@example.com").unwrap());
    }
}
