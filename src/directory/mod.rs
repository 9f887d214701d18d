//! Directory lookup abstraction.
//!
//! A [`Directory`] answers one question: which entries claim a recipient,
//! either by an exact proxy address (`smtp:<address>`) or by a domain-wide
//! alias (`smtp:@<domain>`)? Lookups are read-only and safe to issue
//! concurrently. Backends: [`LdapDirectory`] for production,
//! [`MemoryDirectory`] for tests and transient use.

pub mod ldap;
pub mod memory;

pub use ldap::LdapDirectory;
pub use memory::MemoryDirectory;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while querying the directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The backing service could not be reached or queried.
    #[error("Directory unavailable: {0}")]
    Unavailable(#[from] ldap3::LdapError),

    /// The query exceeded the configured time bound.
    #[error("Directory query timed out after {0} seconds")]
    Timeout(u64),

    /// The RootDSE exposes no default naming context to scope the users
    /// container under.
    #[error("Directory exposes no default naming context")]
    MissingNamingContext,
}

impl DirectoryError {
    /// Returns `true` if the failure is temporary and a later query may
    /// succeed.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// One directory record matched by a proxy-address search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name, kept for diagnostics.
    pub dn: String,

    /// Common name attribute (`cn`).
    pub common_name: Option<String>,

    /// Canonical mail attribute. May be multi-valued; the first non-empty
    /// value wins.
    pub mail: Vec<String>,

    /// Proxy (alias) addresses, each `smtp:<address>` or `smtp:@<domain>`
    /// with a case-insensitive scheme prefix.
    pub proxy_addresses: Vec<String>,
}

impl DirectoryEntry {
    /// The entry's canonical mail address: the first non-empty value of the
    /// multi-valued mail attribute.
    #[must_use]
    pub fn canonical_address(&self) -> Option<&str> {
        self.mail
            .iter()
            .map(String::as_str)
            .find(|mail| !mail.is_empty())
    }
}

/// Read-only proxy-address lookup against a directory service.
///
/// Implementations must be safe to invoke concurrently for different
/// recipients of the same or different messages; lookups are independent and
/// carry no mutable state visible to callers.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Searches for entries whose proxy-address collection contains either a
    /// domain-level alias for `domain` or an address-level alias for
    /// `address`.
    ///
    /// An empty result means "no match" and is not an error. Result order is
    /// directory order and is not guaranteed stable by the service.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the query cannot be executed.
    async fn search(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_address_first_value_wins() {
        let entry = DirectoryEntry {
            mail: vec!["first@example.com".to_string(), "second@example.com".to_string()],
            ..Default::default()
        };
        assert_eq!(entry.canonical_address(), Some("first@example.com"));
    }

    #[test]
    fn test_canonical_address_skips_empty_values() {
        let entry = DirectoryEntry {
            mail: vec![String::new(), "second@example.com".to_string()],
            ..Default::default()
        };
        assert_eq!(entry.canonical_address(), Some("second@example.com"));
    }

    #[test]
    fn test_canonical_address_absent() {
        let entry = DirectoryEntry::default();
        assert_eq!(entry.canonical_address(), None);

        let empty_only = DirectoryEntry {
            mail: vec![String::new()],
            ..Default::default()
        };
        assert_eq!(empty_only.canonical_address(), None);
    }

    #[test]
    fn test_error_classification() {
        assert!(DirectoryError::Timeout(5).is_temporary());
        assert!(!DirectoryError::MissingNamingContext.is_temporary());
    }
}
