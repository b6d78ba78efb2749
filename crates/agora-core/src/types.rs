//! Canonical types for Agora
//!
//! Identities, performatives and the message envelope exchanged between
//! buyers and sellers. Every field is serde-serializable so a message can be
//! carried as JSON by any transport.

use serde::{Deserialize, Serialize};
use ulid::Ulid;
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Conversation id stamped on every book-trading message
pub const BOOK_TRADE_CONVERSATION: &str = "book-trade";

/// Directory service type advertised by sellers
pub const BOOK_SELLING_SERVICE: &str = "book-selling";

/// Directory service name advertised by sellers
pub const BOOK_TRADING_SERVICE_NAME: &str = "agora-book-trading";

// ============================================================================
// Identity Types
// ============================================================================

/// Opaque handle naming one agent (buyer or seller)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new() -> Self {
        Self(format!("agent_{}", Uuid::new_v4()))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phase-scoped correlation value (`reply_with` / `in_reply_to`)
///
/// Tokens are `<prefix>-<ulid>`; a fresh one is minted for every send phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationToken(pub String);

impl CorrelationToken {
    pub fn fresh(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Message kinds used by the book-trading protocol
///
/// | Phase      | Buyer sends            | Seller answers          |
/// |------------|------------------------|-------------------------|
/// | proposals  | `Cfp`                  | `Propose` / `Refuse`    |
/// | discount   | `Propose`              | `Accept` / `Refuse`     |
/// | acceptance | `Accept`               | `Confirmed` / `Failure` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Performative {
    Cfp,
    Propose,
    Refuse,
    Accept,
    Confirmed,
    Failure,
}

impl Performative {
    pub fn as_str(&self) -> &'static str {
        match self {
            Performative::Cfp => "CFP",
            Performative::Propose => "PROPOSE",
            Performative::Refuse => "REFUSE",
            Performative::Accept => "ACCEPT",
            Performative::Confirmed => "CONFIRMED",
            Performative::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for Performative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Performative {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CFP" => Ok(Performative::Cfp),
            "PROPOSE" => Ok(Performative::Propose),
            "REFUSE" => Ok(Performative::Refuse),
            "ACCEPT" => Ok(Performative::Accept),
            "CONFIRMED" => Ok(Performative::Confirmed),
            "FAILURE" => Ok(Performative::Failure),
            other => Err(CoreError::UnknownPerformative(other.to_string())),
        }
    }
}

/// Protocol message envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub performative: Performative,
    pub sender: AgentId,
    pub receivers: Vec<AgentId>,
    /// Item title, price, discount percentage or a free-text reason
    pub content: String,
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_with: Option<CorrelationToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<CorrelationToken>,
}

impl Message {
    pub fn new(performative: Performative, sender: AgentId) -> Self {
        Self {
            performative,
            sender,
            receivers: Vec::new(),
            content: String::new(),
            conversation_id: None,
            reply_with: None,
            in_reply_to: None,
        }
    }

    pub fn with_receiver(mut self, receiver: AgentId) -> Self {
        self.receivers.push(receiver);
        self
    }

    pub fn with_receivers<I>(mut self, receivers: I) -> Self
    where
        I: IntoIterator<Item = AgentId>,
    {
        self.receivers.extend(receivers);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_reply_with(mut self, token: CorrelationToken) -> Self {
        self.reply_with = Some(token);
        self
    }

    pub fn with_in_reply_to(mut self, token: CorrelationToken) -> Self {
        self.in_reply_to = Some(token);
        self
    }

    /// Build a reply skeleton addressed to this message's sender.
    ///
    /// The reply keeps the conversation id and answers this message's
    /// `reply_with` token. The caller fills in performative and content.
    pub fn create_reply(&self, sender: AgentId, performative: Performative) -> Message {
        Message {
            performative,
            sender,
            receivers: vec![self.sender.clone()],
            content: String::new(),
            conversation_id: self.conversation_id.clone(),
            reply_with: None,
            in_reply_to: self.reply_with.clone(),
        }
    }

    /// Parse the content as a price
    pub fn price(&self) -> Result<u64> {
        self.content
            .trim()
            .parse::<u64>()
            .map_err(|_| CoreError::MalformedContent {
                sender: self.sender.0.clone(),
                field: "price",
                content: self.content.clone(),
            })
    }

    /// Parse the content as a discount percentage in `[0, 100)`
    pub fn discount(&self) -> Result<u32> {
        let percent = self
            .content
            .trim()
            .parse::<u32>()
            .map_err(|_| CoreError::MalformedContent {
                sender: self.sender.0.clone(),
                field: "discount",
                content: self.content.clone(),
            })?;
        if percent >= 100 {
            return Err(CoreError::DiscountOutOfRange {
                sender: self.sender.0.clone(),
                percent,
            });
        }
        Ok(percent)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
