//! Service directory ("yellow pages")
//!
//! Sellers register the services they offer; buyers search by service type.
//! Search results keep registration order, which the negotiation uses as the
//! enumeration order for tie-breaking.

use agora_core::AgentId;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{BusError, Result};

/// A service advertised by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescription {
    pub service_type: String,
    pub name: String,
}

impl ServiceDescription {
    pub fn new(service_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            name: name.into(),
        }
    }
}

/// Capability discovery
#[async_trait]
pub trait Directory: Send + Sync {
    /// Advertise `service` for `agent`
    async fn register(&self, agent: AgentId, service: ServiceDescription) -> Result<()>;

    /// Withdraw every service advertised by `agent`
    async fn deregister(&self, agent: &AgentId) -> Result<()>;

    /// Agents offering `service_type`, in registration order
    async fn search(&self, service_type: &str) -> Result<Vec<AgentId>>;
}

#[derive(Debug, Clone)]
struct DirectoryEntry {
    agent: AgentId,
    service: ServiceDescription,
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    entries: RwLock<Vec<DirectoryEntry>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn register(&self, agent: AgentId, service: ServiceDescription) -> Result<()> {
        let mut entries = self.entries.write();
        if entries
            .iter()
            .any(|e| e.agent == agent && e.service.service_type == service.service_type)
        {
            return Err(BusError::AlreadyRegistered {
                agent,
                service_type: service.service_type,
            });
        }
        tracing::debug!(agent = %agent, service_type = %service.service_type, "service registered");
        entries.push(DirectoryEntry { agent, service });
        Ok(())
    }

    async fn deregister(&self, agent: &AgentId) -> Result<()> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| &e.agent != agent);
        if entries.len() == before {
            return Err(BusError::NotRegistered {
                agent: agent.clone(),
            });
        }
        tracing::debug!(agent = %agent, "services deregistered");
        Ok(())
    }

    async fn search(&self, service_type: &str) -> Result<Vec<AgentId>> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|e| e.service.service_type == service_type)
            .map(|e| e.agent.clone())
            .collect())
    }
}
