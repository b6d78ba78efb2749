//! Buyer Agent - periodically negotiates for its target title
//!
//! The buyer agent demonstrates the initiator flow:
//! 1. On every tick, searches the directory for book sellers
//! 2. Starts a fresh negotiation against the sellers found
//! 3. Reports each negotiation's outcome
//! 4. Stops after a successful purchase (unless configured otherwise)

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use agora_bus::{Directory, Mailbox, Transport};
use agora_core::{AgentId, CorrelationToken, MessageTemplate, BOOK_SELLING_SERVICE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::negotiation::{Negotiation, NegotiationConfig, Outcome};
use crate::runner::drive;
use crate::trace::NegotiationTrace;

/// How many retired correlation tokens the buyer remembers for purging
const RETIRED_TOKEN_LIMIT: usize = 1024;

/// Errors that can occur in buyer operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuyerError {
    #[error("Invalid buyer configuration: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = std::result::Result<T, BuyerError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerConfig {
    /// Title to buy; `None` makes the buyer terminate at startup
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: f64,

    #[serde(default = "default_service_type")]
    pub service_type: String,

    #[serde(default = "default_true")]
    pub stop_on_purchase: bool,

    #[serde(default)]
    pub negotiation: NegotiationConfig,
}

impl Default for BuyerConfig {
    fn default() -> Self {
        Self {
            target: None,
            tick_interval_secs: default_tick_interval(),
            service_type: default_service_type(),
            stop_on_purchase: true,
            negotiation: NegotiationConfig::default(),
        }
    }
}

impl BuyerConfig {
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Default::default()
        }
    }

    pub fn tick_interval(&self) -> Result<Duration> {
        if !self.tick_interval_secs.is_finite() || self.tick_interval_secs <= 0.0 {
            return Err(BuyerError::InvalidConfig {
                reason: format!("tick interval must be positive, got {}", self.tick_interval_secs),
            });
        }
        Ok(Duration::from_secs_f64(self.tick_interval_secs))
    }
}

fn default_tick_interval() -> f64 {
    30.0
}

fn default_service_type() -> String {
    BOOK_SELLING_SERVICE.to_string()
}

fn default_true() -> bool {
    true
}

/// Why the buyer stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuyerExit {
    /// No target title was configured
    NoTarget,
    /// A negotiation bought the title
    Purchased { seller: AgentId, price: u64 },
    /// The shutdown signal fired
    Shutdown,
}

/// Summary of one finished negotiation, sent to the buyer's observer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationReport {
    pub negotiation_id: String,
    pub item: String,
    pub sellers: Vec<AgentId>,
    pub outcome: Outcome,
    pub trace: NegotiationTrace,
}

impl NegotiationReport {
    fn from_negotiation(negotiation: Negotiation) -> Option<Self> {
        let outcome = negotiation.outcome()?.clone();
        Some(Self {
            negotiation_id: negotiation.id().to_string(),
            item: negotiation.item().to_string(),
            sellers: negotiation.responders().to_vec(),
            outcome,
            trace: negotiation.into_trace(),
        })
    }
}

/// The Buyer Agent
pub struct BuyerAgent {
    id: AgentId,
    config: BuyerConfig,
    mailbox: Arc<Mailbox>,
    transport: Arc<dyn Transport>,
    directory: Arc<dyn Directory>,
    observer: Option<mpsc::UnboundedSender<NegotiationReport>>,
    retired: VecDeque<CorrelationToken>,
}

impl BuyerAgent {
    pub fn new(
        id: AgentId,
        config: BuyerConfig,
        mailbox: Arc<Mailbox>,
        transport: Arc<dyn Transport>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            id,
            config,
            mailbox,
            transport,
            directory,
            observer: None,
            retired: VecDeque::new(),
        }
    }

    /// Receive a report for every negotiation that reaches an outcome
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<NegotiationReport>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn config(&self) -> &BuyerConfig {
        &self.config
    }

    /// Negotiate on every tick until a purchase or `shutdown`.
    ///
    /// Without a target title the buyer returns [`BuyerExit::NoTarget`]
    /// immediately. Discovery failures skip the tick.
    pub async fn run<F>(mut self, shutdown: F) -> Result<BuyerExit>
    where
        F: Future<Output = ()> + Send,
    {
        let Some(target) = self.config.target.clone() else {
            tracing::info!(buyer = %self.id, "No target book title specified");
            return Ok(BuyerExit::NoTarget);
        };
        let period = self.config.tick_interval()?;
        tracing::info!(buyer = %self.id, title = %target, "Buyer ready");

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut negotiations: JoinSet<Negotiation> = JoinSet::new();
        tokio::pin!(shutdown);

        let exit = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break BuyerExit::Shutdown,
                Some(joined) = negotiations.join_next() => {
                    match joined {
                        Ok(negotiation) => {
                            if let Some(exit) = self.on_finished(negotiation) {
                                break exit;
                            }
                        }
                        Err(e) => tracing::error!(buyer = %self.id, error = %e, "negotiation task failed"),
                    }
                }
                _ = ticker.tick() => self.on_tick(&target, &mut negotiations).await,
            }
        };

        if !negotiations.is_empty() {
            tracing::warn!(
                buyer = %self.id,
                in_flight = negotiations.len(),
                "Aborting unfinished negotiations"
            );
        }
        negotiations.abort_all();
        tracing::info!(buyer = %self.id, "Buyer terminating");
        Ok(exit)
    }

    async fn on_tick(&mut self, target: &str, negotiations: &mut JoinSet<Negotiation>) {
        self.purge_retired();

        let sellers = match self.directory.search(&self.config.service_type).await {
            Ok(sellers) => sellers,
            Err(e) => {
                tracing::warn!(buyer = %self.id, error = %e, "seller discovery failed, skipping tick");
                return;
            }
        };
        if sellers.is_empty() {
            tracing::info!(buyer = %self.id, title = target, "No sellers found, skipping tick");
            return;
        }
        tracing::info!(
            buyer = %self.id,
            sellers = ?sellers.iter().map(AgentId::as_str).collect::<Vec<_>>(),
            "Found seller agents"
        );

        let negotiation = Negotiation::new(
            self.id.clone(),
            target,
            sellers,
            self.config.negotiation.clone(),
        );
        let transport = self.transport.clone();
        let mailbox = self.mailbox.clone();
        negotiations.spawn(async move { drive(negotiation, transport.as_ref(), &mailbox).await });
    }

    fn on_finished(&mut self, negotiation: Negotiation) -> Option<BuyerExit> {
        for token in negotiation.issued_tokens() {
            self.retired.push_back(token.clone());
        }
        while self.retired.len() > RETIRED_TOKEN_LIMIT {
            self.retired.pop_front();
        }

        let report = NegotiationReport::from_negotiation(negotiation)?;
        let exit = match &report.outcome {
            Outcome::Purchased { seller, price } if self.config.stop_on_purchase => {
                Some(BuyerExit::Purchased {
                    seller: seller.clone(),
                    price: *price,
                })
            }
            _ => None,
        };

        if let Some(observer) = &self.observer {
            let _ = observer.send(report);
        }
        exit
    }

    /// Drop replies that arrived after their negotiation finished
    fn purge_retired(&self) {
        if self.retired.is_empty() {
            return;
        }
        let template = MessageTemplate::in_reply_to_any(self.retired.iter().cloned().collect());
        let purged = self.mailbox.discard(&template);
        if purged > 0 {
            tracing::debug!(buyer = %self.id, purged, "late replies dropped");
        }
    }
}
