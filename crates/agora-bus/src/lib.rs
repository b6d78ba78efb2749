//! Agora Bus - message transport and service discovery
//!
//! The negotiation core only talks to the [`Transport`] and [`Directory`]
//! traits. This crate also ships the in-process implementations used by the
//! CLI market and by tests:
//!
//! - **InProcTransport**: per-agent [`Mailbox`] routing table
//! - **InMemoryDirectory**: service-type registry that preserves
//!   registration order

pub mod directory;
pub mod error;
pub mod transport;

pub use directory::{Directory, InMemoryDirectory, ServiceDescription};
pub use error::{BusError, Result};
pub use transport::{InProcTransport, Mailbox, MailboxWatcher, Transport};
