//! In-proc message transport (pluggable via the `Transport` trait)
//!
//! Every agent owns a [`Mailbox`]. Receiving is a non-blocking template scan;
//! an agent with nothing to do parks on a [`MailboxWatcher`] until new mail
//! is delivered.

use std::collections::VecDeque;
use std::sync::Arc;

use agora_core::{AgentId, Message, MessageTemplate};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{BusError, Result};

/// Outbound side of a message transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `message` to every agent in `message.receivers`.
    ///
    /// Delivery is best effort per receiver: known receivers get the message
    /// even when others are unknown, and the unknown ones are reported in
    /// [`BusError::UnknownRecipients`].
    async fn send(&self, message: Message) -> Result<()>;
}

/// Incoming message queue for one agent
pub struct Mailbox {
    owner: AgentId,
    queue: Mutex<VecDeque<Message>>,
    arrivals: watch::Sender<u64>,
}

impl Mailbox {
    pub fn new(owner: AgentId) -> Self {
        let (arrivals, _) = watch::channel(0);
        Self {
            owner,
            queue: Mutex::new(VecDeque::new()),
            arrivals,
        }
    }

    pub fn owner(&self) -> &AgentId {
        &self.owner
    }

    pub fn deliver(&self, message: Message) {
        self.queue.lock().push_back(message);
        self.arrivals.send_modify(|count| *count = count.wrapping_add(1));
    }

    /// Take the oldest message matching `template`, if any
    pub fn try_receive(&self, template: &MessageTemplate) -> Option<Message> {
        let mut queue = self.queue.lock();
        let position = queue.iter().position(|m| template.matches(m))?;
        queue.remove(position)
    }

    /// Drop every queued message matching `template`, returning how many
    pub fn discard(&self, template: &MessageTemplate) -> usize {
        let mut queue = self.queue.lock();
        let before = queue.len();
        queue.retain(|m| !template.matches(m));
        before - queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Subscribe to delivery notifications
    pub fn watch(&self) -> MailboxWatcher {
        MailboxWatcher {
            arrivals: self.arrivals.subscribe(),
        }
    }
}

impl std::fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("owner", &self.owner)
            .field("queued", &self.len())
            .finish()
    }
}

/// Wakes its holder when new mail arrives
///
/// Call [`MailboxWatcher::mark_seen`] before scanning the mailbox; a later
/// [`MailboxWatcher::changed`] then resolves for any delivery made after the
/// scan started, so no arrival is missed.
pub struct MailboxWatcher {
    arrivals: watch::Receiver<u64>,
}

impl MailboxWatcher {
    pub fn mark_seen(&mut self) {
        self.arrivals.borrow_and_update();
    }

    /// Suspend until a message is delivered after the last `mark_seen`.
    ///
    /// Never resolves once the mailbox is gone, so callers should race it
    /// against a shutdown signal or deadline.
    pub async fn changed(&mut self) {
        if self.arrivals.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Routing table of in-process mailboxes
#[derive(Clone, Default)]
pub struct InProcTransport {
    mailboxes: Arc<DashMap<AgentId, Arc<Mailbox>>>,
}

impl InProcTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or return the existing) mailbox for `agent`
    pub fn register(&self, agent: AgentId) -> Arc<Mailbox> {
        self.mailboxes
            .entry(agent.clone())
            .or_insert_with(|| Arc::new(Mailbox::new(agent)))
            .clone()
    }

    /// Remove `agent`'s mailbox; later messages to it are undeliverable
    pub fn unregister(&self, agent: &AgentId) -> bool {
        self.mailboxes.remove(agent).is_some()
    }

    pub fn mailbox(&self, agent: &AgentId) -> Option<Arc<Mailbox>> {
        self.mailboxes.get(agent).map(|m| m.clone())
    }
}

#[async_trait]
impl Transport for InProcTransport {
    async fn send(&self, message: Message) -> Result<()> {
        if message.receivers.is_empty() {
            return Err(BusError::NoReceivers {
                sender: message.sender.clone(),
            });
        }

        let mut unknown = Vec::new();
        for receiver in &message.receivers {
            match self.mailbox(receiver) {
                Some(mailbox) => {
                    tracing::trace!(
                        performative = %message.performative,
                        from = %message.sender,
                        to = %receiver,
                        "message delivered"
                    );
                    mailbox.deliver(message.clone());
                }
                None => unknown.push(receiver.clone()),
            }
        }

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(BusError::UnknownRecipients { agents: unknown })
        }
    }
}
