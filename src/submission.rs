//! Submission handling: per-message recipient rewriting.
//!
//! The host transport pipeline invokes [`SubmissionHandler::on_submission`]
//! once per submitted message. Recipients are resolved independently and in
//! order; a failing recipient is reported and left unrouted without
//! disturbing the rest of the message, and no failure ever reaches the host.

use std::sync::Arc;

use tracing::{error, info};

use crate::{
    address::Address,
    config::Config,
    directory::{Directory, LdapDirectory},
    resolver::{RecipientResolver, RoutingDecision},
};

/// Narrow view of a submitted message, implemented by the host pipeline at
/// the process boundary. The message's lifetime belongs to the host; the
/// handler only reads recipients and commits at most one replacement list.
pub trait SubmissionMessage {
    /// Identifier used in diagnostics, e.g. the RFC 822 message id.
    fn id(&self) -> &str;

    /// The envelope recipients, in submission order.
    fn recipients(&self) -> &[Address];

    /// Replaces the envelope recipient list. Invoked at most once per
    /// submission, and only with a non-empty list.
    fn replace_recipients(&mut self, recipients: Vec<Address>);
}

/// The replacement recipient list for one submission.
///
/// Built in recipient order, owned by a single handler invocation, and
/// committed at most once. Discarded when the invocation ends.
#[derive(Debug, Default)]
pub struct RecipientBatch {
    recipients: Vec<Address>,
    rerouted: bool,
}

impl RecipientBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one routing decision to the batch.
    ///
    /// `ExactRecipient` appends the confirmed original so it survives the
    /// write-back alongside rerouted peers; `NoChange` appends nothing.
    pub fn record(&mut self, decision: RoutingDecision) {
        match decision {
            RoutingDecision::NoChange => {}
            RoutingDecision::ExactRecipient(address) => self.recipients.push(address),
            RoutingDecision::Rerouted(address) => {
                self.recipients.push(address);
                self.rerouted = true;
            }
        }
    }

    /// Returns `true` if at least one recorded decision was a reroute.
    #[must_use]
    pub const fn any_rerouted(&self) -> bool {
        self.rerouted
    }

    /// Returns `true` if the batch should replace the message's recipient
    /// list: at least one reroute happened and the list is non-empty.
    #[must_use]
    pub fn should_commit(&self) -> bool {
        self.rerouted && !self.recipients.is_empty()
    }

    /// The number of recipients accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    /// Returns `true` if no decision appended a recipient yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Consumes the batch, yielding the replacement list.
    #[must_use]
    pub fn into_recipients(self) -> Vec<Address> {
        self.recipients
    }
}

/// Rewrites envelope recipients on message submission.
///
/// One handler serves the whole process; each submission gets its own
/// [`RecipientBatch`].
pub struct SubmissionHandler {
    resolver: RecipientResolver,
    debug_log: bool,
}

impl SubmissionHandler {
    /// Creates a handler over `directory`, with verbose reporting per the
    /// supplied configuration.
    #[must_use]
    pub fn new(directory: Arc<dyn Directory>, config: &Config) -> Self {
        let handler = Self {
            resolver: RecipientResolver::new(directory),
            debug_log: config.debug_log,
        };

        if handler.debug_log {
            info!("Loaded recipient rewriting handler");
        }

        handler
    }

    /// Creates a handler backed by the LDAP directory named in `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(LdapDirectory::new(config.directory.clone())), config)
    }

    /// Entry point for the host pipeline, invoked once per submitted
    /// message.
    ///
    /// Never fails toward the host: every error is reported and isolated to
    /// the recipient that caused it, which is simply not rerouted. If no
    /// recipient was rerouted the message is left completely unmodified.
    pub async fn on_submission<M: SubmissionMessage>(&self, message: &mut M) {
        if self.debug_log {
            info!("Checking message {}", message.id());
        }

        let mut batch = RecipientBatch::new();

        for recipient in message.recipients() {
            match self.resolver.resolve(recipient).await {
                Ok(decision) => {
                    if let RoutingDecision::Rerouted(target) = &decision {
                        info!(
                            "Routing message {} from {recipient} to {target}",
                            message.id()
                        );
                    }
                    batch.record(decision);
                }
                Err(err) => {
                    // Isolated to this recipient; the rest of the message
                    // still resolves.
                    error!(
                        "Error routing message {} to {recipient}: {err}",
                        message.id()
                    );
                }
            }
        }

        if batch.should_commit() {
            message.replace_recipients(batch.into_recipients());
        }
    }
}
