//! Negotiation trace artifacts for replay and audit

use agora_core::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceStage {
    Cfp,
    Proposal,
    Discount,
    Selection,
    Acceptance,
    Outcome,
    Dropped,
    Timeout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub timestamp: DateTime<Utc>,
    pub stage: TraceStage,
    /// Seller the event concerns, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<AgentId>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationTrace {
    pub negotiation_id: String,
    pub item: String,
    pub created_at: DateTime<Utc>,
    pub events: Vec<TraceEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
}

impl NegotiationTrace {
    pub fn new(
        negotiation_id: impl Into<String>,
        item: impl Into<String>,
        max_entries: Option<usize>,
    ) -> Self {
        Self {
            negotiation_id: negotiation_id.into(),
            item: item.into(),
            created_at: Utc::now(),
            events: Vec::new(),
            max_entries,
        }
    }

    pub fn record(
        &mut self,
        stage: TraceStage,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) {
        self.push(stage, None, message.into(), data);
    }

    /// Record an event about one seller's reply or selection
    pub fn record_seller(
        &mut self,
        stage: TraceStage,
        seller: &AgentId,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) {
        self.push(stage, Some(seller.clone()), message.into(), data);
    }

    fn push(
        &mut self,
        stage: TraceStage,
        seller: Option<AgentId>,
        message: String,
        data: Option<serde_json::Value>,
    ) {
        self.events.push(TraceEvent {
            timestamp: Utc::now(),
            stage,
            seller,
            message,
            data,
        });
        if let Some(max) = self.max_entries {
            if self.events.len() > max {
                let overflow = self.events.len() - max;
                self.events.drain(0..overflow);
            }
        }
    }

    pub fn count(&self, stage: TraceStage) -> usize {
        self.events.iter().filter(|e| e.stage == stage).count()
    }

    pub fn last(&self) -> Option<&TraceEvent> {
        self.events.last()
    }

    /// Everything recorded about `seller`, oldest first
    pub fn seller_events<'a>(&'a self, seller: &'a AgentId) -> impl Iterator<Item = &'a TraceEvent> {
        self.events
            .iter()
            .filter(move |e| e.seller.as_ref() == Some(seller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_is_bounded() {
        let mut trace = NegotiationTrace::new("neg-1", "Dune", Some(3));
        for i in 0..5 {
            trace.record(TraceStage::Proposal, format!("proposal {i}"), None);
        }
        assert_eq!(trace.events.len(), 3);
        assert_eq!(trace.events[0].message, "proposal 2");
        assert_eq!(trace.count(TraceStage::Proposal), 3);
        assert_eq!(trace.last().unwrap().message, "proposal 4");
    }

    #[test]
    fn test_seller_events_are_filtered() {
        let alice = AgentId::from_string("alice");
        let bob = AgentId::from_string("bob");
        let mut trace = NegotiationTrace::new("neg-1", "Dune", None);
        trace.record(TraceStage::Cfp, "call for proposals sent", None);
        trace.record_seller(TraceStage::Proposal, &alice, "proposal received", None);
        trace.record_seller(TraceStage::Proposal, &bob, "seller refused", None);
        trace.record_seller(TraceStage::Discount, &alice, "discount granted", None);

        let stages: Vec<_> = trace.seller_events(&alice).map(|e| e.stage).collect();
        assert_eq!(stages, vec![TraceStage::Proposal, TraceStage::Discount]);
        assert_eq!(trace.seller_events(&bob).count(), 1);
        assert!(trace.events[0].seller.is_none());
    }
}
