//! Agora Core - Canonical types for the book-trading negotiation protocol
//!
//! This crate holds the pieces every other Agora crate shares:
//! - AgentId: opaque handle naming a buyer or seller agent
//! - Message: performative-tagged protocol message with correlation fields
//! - MessageTemplate: predicate used to pick messages out of a mailbox
//! - Inventory: a seller's concurrent title -> price catalogue
//! - Offer: per-seller price/discount record and the winner-selection rule
//!
//! # Protocol Invariants
//!
//! 1. A reply only counts for the phase whose token it carries
//! 2. Inventory removal is the single point where a sale is decided
//! 3. Sellers with no proposal never win, whatever discount they report

pub mod error;
pub mod inventory;
pub mod offer;
pub mod template;
pub mod types;

pub use error::*;
pub use inventory::*;
pub use offer::*;
pub use template::*;
pub use types::*;
