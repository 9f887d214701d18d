//! In-memory directory backend.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use super::{Directory, DirectoryEntry, DirectoryError};

/// In-memory [`Directory`] implementation.
///
/// Entries live in a `Vec` behind an `RwLock`. Primarily intended for
/// testing, but usable wherever a transient directory is enough.
///
/// Searches mimic the wildcard filter of the LDAP backend: an entry matches
/// when any of its proxy addresses contains the domain alias or the
/// recipient address as a case-insensitive substring. The precise equality
/// rules live in the resolver, exactly as they do for the production
/// backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    entries: Arc<RwLock<Vec<DirectoryEntry>>>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. Search results preserve insertion order.
    pub fn insert(&self, entry: DirectoryEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// The number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the directory holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn search(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let domain_alias = format!("smtp:@{}", domain.to_lowercase());
        let exact_alias = format!("smtp:{}", address.to_lowercase());

        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| {
                entry.proxy_addresses.iter().any(|proxy| {
                    let proxy = proxy.to_lowercase();
                    proxy.contains(&domain_alias) || proxy.contains(&exact_alias)
                })
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(dn: &str, proxies: &[&str]) -> DirectoryEntry {
        DirectoryEntry {
            dn: dn.to_string(),
            proxy_addresses: proxies.iter().map(ToString::to_string).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_by_exact_alias() {
        let directory = MemoryDirectory::new();
        directory.insert(entry("cn=one", &["smtp:one@foo.com"]));
        directory.insert(entry("cn=two", &["smtp:two@bar.com"]));

        let found = directory.search("foo.com", "one@foo.com").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dn, "cn=one");
    }

    #[tokio::test]
    async fn test_search_by_domain_alias() {
        let directory = MemoryDirectory::new();
        directory.insert(entry("cn=catchall", &["smtp:@foo.com"]));

        let found = directory.search("foo.com", "anyone@foo.com").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dn, "cn=catchall");
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let directory = MemoryDirectory::new();
        directory.insert(entry("cn=one", &["SMTP:One@Foo.com"]));

        let found = directory.search("foo.com", "ONE@FOO.COM").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_search_matches_substring_like_the_wildcard_filter() {
        // `*smtp:@foo.com*` also matches `smtp:@foo.com.bar`; rejecting the
        // longer domain is the resolver's job, not the filter's.
        let directory = MemoryDirectory::new();
        directory.insert(entry("cn=longer", &["smtp:@foo.com.bar"]));

        let found = directory.search("foo.com", "user@foo.com").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_search_empty_result_is_ok() {
        let directory = MemoryDirectory::new();
        assert!(directory.is_empty());

        let found = directory.search("foo.com", "user@foo.com").await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_search_preserves_insertion_order() {
        let directory = MemoryDirectory::new();
        directory.insert(entry("cn=first", &["smtp:@foo.com"]));
        directory.insert(entry("cn=second", &["smtp:@foo.com"]));

        let found = directory.search("foo.com", "user@foo.com").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].dn, "cn=first");
        assert_eq!(found[1].dn, "cn=second");
    }
}
