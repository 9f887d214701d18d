//! Recipient resolution: the proxy-address matching core.
//!
//! One directory search per recipient, then two ordered passes over the
//! result. An exact proxy-address match confirms the recipient as-is and
//! short-circuits everything else; failing that, a domain-wide alias
//! reroutes the recipient to the canonical address of the entry carrying
//! the alias.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::{
    address::{Address, AddressError},
    directory::{Directory, DirectoryEntry, DirectoryError},
};

/// Errors that can occur while resolving a single recipient.
///
/// Either error is isolated to its recipient: the submission handler reports
/// it and treats the recipient as "not rerouted".
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The directory query failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A domain alias matched, but the entry carries no usable canonical
    /// mail address.
    #[error("Directory entry {dn} has no usable canonical mail address")]
    MalformedRecord {
        dn: String,
        #[source]
        source: Option<AddressError>,
    },
}

/// The outcome of resolving one recipient. Exactly one decision is made per
/// recipient per submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// No directory entry claimed the recipient; leave it alone.
    NoChange,

    /// The recipient's literal address is a known proxy; keep it verbatim
    /// and exclude it from domain-alias routing.
    ExactRecipient(Address),

    /// A domain alias claimed the recipient; route to the canonical address
    /// of the entry carrying the alias.
    Rerouted(Address),
}

impl RoutingDecision {
    /// Returns `true` if the decision replaced the recipient address.
    #[must_use]
    pub const fn is_rerouted(&self) -> bool {
        matches!(self, Self::Rerouted(_))
    }
}

/// Resolves one recipient at a time against a [`Directory`].
#[derive(Clone)]
pub struct RecipientResolver {
    directory: Arc<dyn Directory>,
}

impl RecipientResolver {
    /// Creates a resolver over the given directory.
    #[must_use]
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Decides the routing outcome for `recipient`.
    ///
    /// Two ordered passes over one search result; within each pass the first
    /// discovered match (in search-result order) wins:
    ///
    /// 1. **Exact pass** — any proxy equal to `smtp:<recipient>`
    ///    (case-insensitive) yields [`RoutingDecision::ExactRecipient`]. A
    ///    user who carries the literal address as a personal proxy is never
    ///    rerouted, even when a domain-wide alias also exists.
    /// 2. **Domain pass** — any proxy equal to `smtp:@<domain>` yields
    ///    [`RoutingDecision::Rerouted`] with that entry's canonical address.
    ///    Equality is exact, never substring, so `@foo.com` cannot match
    ///    `@foo.com.bar`.
    ///
    /// An empty search result skips both passes.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Directory`] if the search fails;
    /// [`ResolveError::MalformedRecord`] if a domain alias matches an entry
    /// without a usable canonical address.
    pub async fn resolve(&self, recipient: &Address) -> Result<RoutingDecision, ResolveError> {
        let domain = recipient.domain_lowercase();
        let entries = self
            .directory
            .search(&domain, &recipient.to_string())
            .await?;

        if entries.is_empty() {
            return Ok(RoutingDecision::NoChange);
        }

        let exact_alias = format!("smtp:{recipient}");
        for entry in &entries {
            if entry
                .proxy_addresses
                .iter()
                .any(|proxy| proxy.eq_ignore_ascii_case(&exact_alias))
            {
                debug!("{recipient} is a known proxy address of {}", entry.dn);
                return Ok(RoutingDecision::ExactRecipient(recipient.clone()));
            }
        }

        let domain_alias = format!("smtp:@{domain}");
        for entry in &entries {
            if entry
                .proxy_addresses
                .iter()
                .any(|proxy| proxy.eq_ignore_ascii_case(&domain_alias))
            {
                return reroute(entry).map(RoutingDecision::Rerouted);
            }
        }

        Ok(RoutingDecision::NoChange)
    }
}

/// Reads the canonical target out of a domain-alias entry.
fn reroute(entry: &DirectoryEntry) -> Result<Address, ResolveError> {
    let canonical = entry
        .canonical_address()
        .ok_or_else(|| ResolveError::MalformedRecord {
            dn: entry.dn.clone(),
            source: None,
        })?;

    Address::parse(canonical).map_err(|err| ResolveError::MalformedRecord {
        dn: entry.dn.clone(),
        source: Some(err),
    })
}
