//! Agora Agents - Book-trading buyer and seller
//!
//! - **SellerAgent**: answers calls for proposals, discount requests and
//!   purchase orders from its inventory
//! - **BuyerAgent**: periodically discovers sellers and runs a
//!   [`Negotiation`] for its target title
//!
//! # Key Principle
//!
//! **The negotiation state machine does no I/O.** It consumes replies and
//! deadlines and returns the messages to send; [`runner::drive`] connects it
//! to a transport and a mailbox.

pub mod buyer;
pub mod discount;
pub mod negotiation;
pub mod runner;
pub mod seller;
pub mod trace;

pub use buyer::{BuyerAgent, BuyerConfig, BuyerError, BuyerExit, NegotiationReport};
pub use discount::{DiscountPolicy, FixedDiscount, RandomDiscount, DEFAULT_MAX_DISCOUNT};
pub use negotiation::{DiscountTargets, Negotiation, NegotiationConfig, Outcome, Phase};
pub use runner::drive;
pub use seller::{
    handle_accept, handle_cfp, handle_discount_request, CatalogueHandle, CatalogueUpdate,
    SellerAgent, SellerError,
};
pub use trace::{NegotiationTrace, TraceEvent, TraceStage};
