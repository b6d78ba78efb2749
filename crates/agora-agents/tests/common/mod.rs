#![allow(dead_code)]

use std::sync::Arc;

use agora_agents::{DiscountPolicy, SellerAgent};
use agora_bus::{InMemoryDirectory, InProcTransport, Mailbox, Transport};
use agora_core::{AgentId, Inventory, Message, Performative};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

/// In-proc transport that remembers every message it was asked to send
#[derive(Default)]
pub struct RecordingTransport {
    inner: InProcTransport,
    sent: Mutex<Vec<Message>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }

    pub fn sent_by(&self, sender: &AgentId, performative: Performative) -> Vec<Message> {
        self.sent()
            .into_iter()
            .filter(|m| &m.sender == sender && m.performative == performative)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, message: Message) -> agora_bus::Result<()> {
        self.sent.lock().push(message.clone());
        self.inner.send(message).await
    }
}

pub struct Market {
    pub transport: Arc<RecordingTransport>,
    pub directory: Arc<InMemoryDirectory>,
    stop: watch::Sender<bool>,
}

impl Market {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            transport: Arc::new(RecordingTransport::default()),
            directory: Arc::new(InMemoryDirectory::new()),
            stop,
        }
    }

    pub fn mailbox(&self, agent: &AgentId) -> Arc<Mailbox> {
        self.transport.inner.register(agent.clone())
    }

    /// Build a seller stocked with `titles`, without starting it
    pub fn seller(
        &self,
        name: &str,
        titles: &[(&str, u64)],
        policy: impl DiscountPolicy + 'static,
    ) -> SellerAgent {
        let id = AgentId::from_string(name);
        let inventory: Inventory = titles.iter().map(|(t, p)| (t.to_string(), *p)).collect();
        SellerAgent::new(
            id.clone(),
            self.mailbox(&id),
            self.transport.clone(),
            self.directory.clone(),
        )
        .with_policy(policy)
        .with_inventory(Arc::new(inventory))
    }

    pub fn spawn_seller(&self, seller: SellerAgent) -> tokio::task::JoinHandle<()> {
        let mut stop = self.stop.subscribe();
        tokio::spawn(seller.run(async move {
            let _ = stop.changed().await;
        }))
    }

    pub fn shutdown(&self) {
        let _ = self.stop.send(true);
    }
}

pub fn agent(name: &str) -> AgentId {
    AgentId::from_string(name)
}
