//! Seller Agent - answers buyers from its local inventory
//!
//! The seller runs three independent reactive handlers:
//! 1. Proposal handler: `CFP` -> `PROPOSE(price)` or `REFUSE`
//! 2. Discount handler: `PROPOSE` -> `ACCEPT(percent)` or `REFUSE`
//! 3. Confirmation handler: `ACCEPT` -> `CONFIRMED` or `FAILURE`
//!
//! Each handler emits exactly one reply per inbound message. The handlers are
//! plain functions over a shared [`Inventory`], so they may run concurrently;
//! the inventory's atomic `remove` settles any race between two buyers
//! accepting the same title.

use std::future::Future;
use std::sync::Arc;

use agora_bus::{Directory, Mailbox, ServiceDescription, Transport};
use agora_core::{
    AgentId, Inventory, Message, MessageTemplate, Performative, BOOK_SELLING_SERVICE,
    BOOK_TRADING_SERVICE_NAME,
};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::discount::{DiscountPolicy, RandomDiscount};

/// Refusal reason when a title is not carried
pub const NOT_AVAILABLE: &str = "not-available";
/// Refusal reason for a discount request on a title not carried
pub const BOOK_NOT_AVAILABLE: &str = "book not available";
/// Refusal reason when the coin flip goes against the buyer
pub const DISCOUNT_NOT_AVAILABLE: &str = "discount not available";

/// Errors that can occur in seller operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SellerError {
    #[error("Price for {title} must be positive")]
    InvalidPrice { title: String },

    #[error("Catalogue of seller {seller} is closed")]
    CatalogueClosed { seller: AgentId },
}

pub type Result<T> = std::result::Result<T, SellerError>;

// ============================================================================
// Reactive handlers
// ============================================================================

/// Answer a call for proposals with the title's price, or refuse
pub fn handle_cfp(seller: &AgentId, inventory: &Inventory, cfp: &Message) -> Message {
    let title = cfp.content.as_str();
    match inventory.lookup(title) {
        Some(price) => {
            tracing::debug!(seller = %seller, buyer = %cfp.sender, title, price, "proposal sent");
            cfp.create_reply(seller.clone(), Performative::Propose)
                .with_content(price.to_string())
        }
        None => {
            tracing::debug!(seller = %seller, buyer = %cfp.sender, title, "title not carried");
            cfp.create_reply(seller.clone(), Performative::Refuse)
                .with_content(NOT_AVAILABLE)
        }
    }
}

/// Answer a discount request according to `policy`
pub fn handle_discount_request(
    seller: &AgentId,
    inventory: &Inventory,
    policy: &mut dyn DiscountPolicy,
    request: &Message,
) -> Message {
    let title = request.content.as_str();
    if inventory.lookup(title).is_none() {
        tracing::info!(seller = %seller, title, "There is no book with this title");
        return request
            .create_reply(seller.clone(), Performative::Refuse)
            .with_content(BOOK_NOT_AVAILABLE);
    }

    match policy.offer(title, &request.sender) {
        Some(percent) => {
            tracing::info!(
                seller = %seller,
                buyer = %request.sender,
                title,
                discount = percent,
                "Discount offered"
            );
            request
                .create_reply(seller.clone(), Performative::Accept)
                .with_content(percent.to_string())
        }
        None => {
            tracing::info!(seller = %seller, buyer = %request.sender, title, "No discount offered");
            request
                .create_reply(seller.clone(), Performative::Refuse)
                .with_content(DISCOUNT_NOT_AVAILABLE)
        }
    }
}

/// Complete a purchase: remove the title or report that it is gone
pub fn handle_accept(seller: &AgentId, inventory: &Inventory, order: &Message) -> Message {
    let title = order.content.as_str();
    match inventory.remove(title) {
        Some(price) => {
            tracing::info!(seller = %seller, buyer = %order.sender, title, price, "Book sold");
            order.create_reply(seller.clone(), Performative::Confirmed)
        }
        None => {
            tracing::info!(
                seller = %seller,
                buyer = %order.sender,
                title,
                "Book already sold to another buyer"
            );
            order
                .create_reply(seller.clone(), Performative::Failure)
                .with_content(NOT_AVAILABLE)
        }
    }
}

// ============================================================================
// Catalogue update path
// ============================================================================

/// One-shot inventory mutation queued by an external actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueUpdate {
    pub title: String,
    pub price: u64,
}

/// Cloneable handle for adding titles to a running seller
///
/// Updates are queued and applied by the seller's own loop, never from the
/// caller's task.
#[derive(Debug, Clone)]
pub struct CatalogueHandle {
    seller: AgentId,
    updates: mpsc::UnboundedSender<CatalogueUpdate>,
}

impl CatalogueHandle {
    pub fn update(&self, title: impl Into<String>, price: u64) -> Result<()> {
        let title = title.into();
        if price == 0 {
            return Err(SellerError::InvalidPrice { title });
        }
        self.updates
            .send(CatalogueUpdate { title, price })
            .map_err(|_| SellerError::CatalogueClosed {
                seller: self.seller.clone(),
            })
    }

    pub fn seller(&self) -> &AgentId {
        &self.seller
    }
}

// ============================================================================
// Seller agent
// ============================================================================

/// The Seller Agent
pub struct SellerAgent {
    id: AgentId,
    inventory: Arc<Inventory>,
    mailbox: Arc<Mailbox>,
    transport: Arc<dyn Transport>,
    directory: Arc<dyn Directory>,
    policy: Box<dyn DiscountPolicy>,
    updates_tx: mpsc::UnboundedSender<CatalogueUpdate>,
    updates_rx: mpsc::UnboundedReceiver<CatalogueUpdate>,
}

impl SellerAgent {
    /// Create a seller with an empty inventory and a random discount policy
    pub fn new(
        id: AgentId,
        mailbox: Arc<Mailbox>,
        transport: Arc<dyn Transport>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            id,
            inventory: Arc::new(Inventory::new()),
            mailbox,
            transport,
            directory,
            policy: Box::new(RandomDiscount::new()),
            updates_tx,
            updates_rx,
        }
    }

    pub fn with_policy(mut self, policy: impl DiscountPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_inventory(mut self, inventory: Arc<Inventory>) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn inventory(&self) -> Arc<Inventory> {
        self.inventory.clone()
    }

    pub fn catalogue(&self) -> CatalogueHandle {
        CatalogueHandle {
            seller: self.id.clone(),
            updates: self.updates_tx.clone(),
        }
    }

    /// Serve buyers until `shutdown` resolves.
    ///
    /// Registers the book-selling service on entry and withdraws it on exit;
    /// directory failures are logged and do not stop the seller.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let service = ServiceDescription::new(BOOK_SELLING_SERVICE, BOOK_TRADING_SERVICE_NAME);
        if let Err(e) = self.directory.register(self.id.clone(), service).await {
            tracing::warn!(seller = %self.id, error = %e, "service registration failed");
        }
        tracing::info!(seller = %self.id, titles = self.inventory.len(), "Seller ready");

        let mut watcher = self.mailbox.watch();
        tokio::pin!(shutdown);

        loop {
            watcher.mark_seen();
            while let Ok(update) = self.updates_rx.try_recv() {
                self.apply_update(update);
            }
            while let Some(message) = self.mailbox.try_receive(&MessageTemplate::Any) {
                self.dispatch(message).await;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                Some(update) = self.updates_rx.recv() => self.apply_update(update),
                _ = watcher.changed() => {}
            }
        }

        if let Err(e) = self.directory.deregister(&self.id).await {
            tracing::warn!(seller = %self.id, error = %e, "service deregistration failed");
        }
        tracing::info!(seller = %self.id, "Seller terminating");
    }

    fn apply_update(&self, update: CatalogueUpdate) {
        tracing::info!(
            seller = %self.id,
            title = %update.title,
            price = update.price,
            "Title inserted into catalogue"
        );
        self.inventory.put(update.title, update.price);
    }

    async fn dispatch(&mut self, message: Message) {
        let reply = match message.performative {
            Performative::Cfp => handle_cfp(&self.id, &self.inventory, &message),
            Performative::Propose => handle_discount_request(
                &self.id,
                &self.inventory,
                self.policy.as_mut(),
                &message,
            ),
            Performative::Accept => handle_accept(&self.id, &self.inventory, &message),
            other => {
                tracing::debug!(
                    seller = %self.id,
                    performative = %other,
                    from = %message.sender,
                    "unexpected message dropped"
                );
                return;
            }
        };

        if let Err(e) = self.transport.send(reply).await {
            tracing::warn!(seller = %self.id, error = %e, "reply not delivered");
        }
    }
}
