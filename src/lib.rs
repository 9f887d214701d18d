//! Recipient rewriting for mail submission pipelines.
//!
//! For each envelope recipient on a submitted message, decides whether the
//! address should be replaced by a canonical address found in a directory
//! service, based on proxy-address matching. See [`SubmissionHandler`] for
//! the entry point and [`resolver`] for the matching rules.

pub mod address;
pub mod config;
pub mod directory;
pub mod resolver;
pub mod submission;

pub use address::{Address, AddressError};
pub use config::{Config, ConfigError, DirectoryConfig};
pub use directory::{Directory, DirectoryEntry, DirectoryError, LdapDirectory, MemoryDirectory};
pub use resolver::{RecipientResolver, ResolveError, RoutingDecision};
pub use submission::{RecipientBatch, SubmissionHandler, SubmissionMessage};
