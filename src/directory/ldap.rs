//! LDAP directory backend.
//!
//! Searches person/user entries under the domain's `CN=Users` container for
//! proxy-address aliases. The container DN is discovered from the RootDSE on
//! first use and memoized for the life of the client.

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, ldap_escape};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{Directory, DirectoryEntry, DirectoryError};
use crate::config::DirectoryConfig;

/// LDAP-backed [`Directory`].
///
/// Each search opens its own connection. The users container DN is the only
/// state shared between queries; it is initialized once under an async
/// once-cell and treated as read-only afterwards, so concurrent submissions
/// never race on first construction.
#[derive(Debug)]
pub struct LdapDirectory {
    config: DirectoryConfig,
    users_base: OnceCell<String>,
}

impl LdapDirectory {
    /// Creates a client for the directory named in `config`. When the
    /// configuration carries an explicit `users_base`, RootDSE discovery is
    /// skipped entirely.
    #[must_use]
    pub fn new(config: DirectoryConfig) -> Self {
        let users_base = OnceCell::new_with(config.users_base.clone());

        Self { config, users_base }
    }

    const fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn connect(&self) -> Result<Ldap, DirectoryError> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.timeout());
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.config.url).await?;

        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                warn!("Directory connection error: {err}");
            }
        });

        Ok(ldap)
    }

    /// The users container DN, `CN=Users,<defaultNamingContext>`, resolved
    /// from the RootDSE on first use.
    async fn users_base(&self, ldap: &Ldap) -> Result<&str, DirectoryError> {
        let mut root = ldap.clone();
        let timeout = self.timeout();
        let timeout_secs = self.config.timeout_secs;

        self.users_base
            .get_or_try_init(|| async move {
                let (entries, _) = tokio::time::timeout(
                    timeout,
                    root.search(
                        "",
                        Scope::Base,
                        "(objectClass=*)",
                        vec!["defaultNamingContext"],
                    ),
                )
                .await
                .map_err(|_| DirectoryError::Timeout(timeout_secs))??
                .success()?;

                let naming_context = entries
                    .into_iter()
                    .next()
                    .map(SearchEntry::construct)
                    .and_then(|root_dse| {
                        root_dse
                            .attrs
                            .get("defaultNamingContext")
                            .and_then(|values| values.first().cloned())
                    })
                    .ok_or(DirectoryError::MissingNamingContext)?;

                let base = format!("CN=Users,{naming_context}");
                debug!("Resolved users container {base}");

                Ok(base)
            })
            .await
            .map(String::as_str)
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn search(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let mut ldap = self.connect().await?;
        let base = self.users_base(&ldap).await?;
        let filter = proxy_filter(domain, address);

        debug!("Searching {base} with {filter}");

        let response = tokio::time::timeout(
            self.timeout(),
            ldap.search(
                base,
                Scope::Subtree,
                &filter,
                vec!["cn", "mail", "proxyAddresses"],
            ),
        )
        .await;

        let _ = ldap.unbind().await;

        let (entries, _) = response
            .map_err(|_| DirectoryError::Timeout(self.config.timeout_secs))??
            .success()?;

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(to_directory_entry)
            .collect())
    }
}

/// Builds the proxy-address filter for one recipient: person/user entries
/// carrying either a domain-level alias or an address-level alias. Values
/// are wildcard-wrapped so the server-side match is broad; the resolver
/// applies the precise equality rules.
fn proxy_filter(domain: &str, address: &str) -> String {
    format!(
        "(&(objectCategory=person)(objectClass=user)(|(proxyAddresses=*smtp:@{}*)(proxyAddresses=*smtp:{}*)))",
        ldap_escape(domain.to_lowercase().as_str()),
        ldap_escape(address),
    )
}

fn to_directory_entry(entry: SearchEntry) -> DirectoryEntry {
    let SearchEntry { dn, mut attrs, .. } = entry;

    DirectoryEntry {
        dn,
        common_name: attrs
            .remove("cn")
            .and_then(|values| values.into_iter().next()),
        mail: attrs.remove("mail").unwrap_or_default(),
        proxy_addresses: attrs.remove("proxyAddresses").unwrap_or_default(),
    }
}
