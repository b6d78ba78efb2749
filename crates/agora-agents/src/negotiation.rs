//! Buyer-side negotiation state machine
//!
//! One [`Negotiation`] drives one purchase attempt for one title against a
//! responder set fixed at creation:
//!
//! ```text
//! SendCfp -> CollectProposals -> SendDiscountRequest -> CollectDiscounts
//!         -> SendAcceptance -> CollectConfirmation -> Done
//! ```
//!
//! Phases only move forward. The machine does no I/O: every entry point
//! returns the messages to send, and the async driver in [`crate::runner`]
//! feeds it replies and phase deadlines.

use std::collections::HashSet;
use std::time::Duration;

use agora_core::{
    select_winner, AgentId, CorrelationToken, Message, MessageTemplate, Offer, Performative,
    Winner, BOOK_TRADE_CONVERSATION,
};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::trace::{NegotiationTrace, TraceStage};

/// Negotiation phase, in strict forward order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    SendCfp,
    CollectProposals,
    SendDiscountRequest,
    CollectDiscounts,
    SendAcceptance,
    CollectConfirmation,
    Done,
}

impl Phase {
    pub fn is_collecting(&self) -> bool {
        matches!(
            self,
            Phase::CollectProposals | Phase::CollectDiscounts | Phase::CollectConfirmation
        )
    }
}

/// Who receives the discount request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountTargets {
    /// Only sellers that proposed a price
    #[default]
    Proposers,
    /// Every seller in the responder set
    AllResponders,
}

/// Terminal result of a negotiation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The winning seller confirmed the sale
    Purchased { seller: AgentId, price: u64 },
    /// No seller proposed a price
    NoOffers,
    /// The winning seller had already sold the title
    AlreadySold { seller: AgentId },
    /// The winning seller never answered the purchase order
    NoConfirmation { seller: AgentId },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Purchased { .. })
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Outcome::Purchased { .. } => "purchased",
            Outcome::NoOffers => "not available for sale",
            Outcome::AlreadySold { .. } => "requested book already sold",
            Outcome::NoConfirmation { .. } => "no confirmation received",
        }
    }

    /// The seller chosen as winner, if the negotiation got that far
    pub fn seller(&self) -> Option<&AgentId> {
        match self {
            Outcome::Purchased { seller, .. }
            | Outcome::AlreadySold { seller }
            | Outcome::NoConfirmation { seller } => Some(seller),
            Outcome::NoOffers => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationConfig {
    #[serde(default = "default_conversation_id")]
    pub conversation_id: String,

    #[serde(default)]
    pub discount_targets: DiscountTargets,

    /// Deadline for each collecting phase; `None` waits forever
    #[serde(default, with = "optional_secs")]
    pub phase_timeout: Option<Duration>,

    #[serde(default = "default_trace_max_entries")]
    pub trace_max_entries: Option<usize>,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            conversation_id: default_conversation_id(),
            discount_targets: DiscountTargets::default(),
            phase_timeout: None,
            trace_max_entries: default_trace_max_entries(),
        }
    }
}

fn default_conversation_id() -> String {
    BOOK_TRADE_CONVERSATION.to_string()
}

fn default_trace_max_entries() -> Option<usize> {
    Some(256)
}

mod optional_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(d)?;
        Ok(secs.filter(|s| *s > 0.0 && s.is_finite()).map(Duration::from_secs_f64))
    }
}

pub struct Negotiation {
    id: String,
    buyer: AgentId,
    item: String,
    config: NegotiationConfig,
    responders: Vec<AgentId>,
    offers: Vec<Offer>,
    phase: Phase,
    token: Option<CorrelationToken>,
    issued: Vec<CorrelationToken>,
    awaiting: Vec<AgentId>,
    replied: HashSet<AgentId>,
    winner: Option<Winner>,
    outcome: Option<Outcome>,
    trace: NegotiationTrace,
}

impl Negotiation {
    /// Create a negotiation for `item` against `responders`.
    ///
    /// Duplicate responders are dropped, keeping the first occurrence, so the
    /// enumeration order used for tie-breaking is the discovery order.
    pub fn new(
        buyer: AgentId,
        item: impl Into<String>,
        responders: Vec<AgentId>,
        config: NegotiationConfig,
    ) -> Self {
        let item = item.into();
        let id = format!("neg_{}", Ulid::new());

        let mut seen = HashSet::new();
        let responders: Vec<AgentId> = responders
            .into_iter()
            .filter(|r| seen.insert(r.clone()))
            .collect();

        let trace = NegotiationTrace::new(&id, &item, config.trace_max_entries);
        Self {
            id,
            buyer,
            item,
            config,
            responders,
            offers: Vec::new(),
            phase: Phase::SendCfp,
            token: None,
            issued: Vec::new(),
            awaiting: Vec::new(),
            replied: HashSet::new(),
            winner: None,
            outcome: None,
            trace,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn buyer(&self) -> &AgentId {
        &self.buyer
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    pub fn responders(&self) -> &[AgentId] {
        &self.responders
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_token(&self) -> Option<&CorrelationToken> {
        self.token.as_ref()
    }

    /// Every token this negotiation has sent out, oldest first
    pub fn issued_tokens(&self) -> &[CorrelationToken] {
        &self.issued
    }

    pub fn winner(&self) -> Option<&Winner> {
        self.winner.as_ref()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn trace(&self) -> &NegotiationTrace {
        &self.trace
    }

    pub fn into_trace(self) -> NegotiationTrace {
        self.trace
    }

    /// Sellers whose reply the current phase is still waiting for
    pub fn pending(&self) -> Vec<AgentId> {
        if !self.phase.is_collecting() {
            return Vec::new();
        }
        self.awaiting
            .iter()
            .filter(|a| !self.replied.contains(*a))
            .cloned()
            .collect()
    }

    /// Template matching any reply to a token this negotiation issued.
    ///
    /// The driver uses it to pull both current and stale replies out of the
    /// mailbox; [`Negotiation::on_message`] then drops the stale ones.
    pub fn reply_template(&self) -> MessageTemplate {
        MessageTemplate::conversation_id(self.config.conversation_id.clone())
            .and(MessageTemplate::in_reply_to_any(self.issued.clone()))
    }

    /// Send the call for proposals. Only acts in the initial phase.
    pub fn start(&mut self) -> Vec<Message> {
        if self.phase != Phase::SendCfp {
            return Vec::new();
        }
        tracing::info!(
            negotiation = %self.id,
            buyer = %self.buyer,
            item = %self.item,
            sellers = self.responders.len(),
            "Trying to buy"
        );
        self.advance()
    }

    /// Feed one inbound message; returns the next phase's outgoing messages.
    ///
    /// Replies that do not carry the current phase's token, come from a
    /// seller not awaited in this phase, or repeat an earlier reply are
    /// dropped without touching any state but the trace.
    pub fn on_message(&mut self, message: Message) -> Vec<Message> {
        if !self.accepts(&message) {
            tracing::trace!(
                negotiation = %self.id,
                from = %message.sender,
                performative = %message.performative,
                "stray reply dropped"
            );
            self.trace.record_seller(
                TraceStage::Dropped,
                &message.sender,
                "stray reply dropped",
                Some(serde_json::json!({
                    "performative": message.performative,
                    "in_reply_to": message.in_reply_to,
                })),
            );
            return Vec::new();
        }

        self.replied.insert(message.sender.clone());
        match self.phase {
            Phase::CollectProposals => self.record_proposal(&message),
            Phase::CollectDiscounts => self.record_discount(&message),
            Phase::CollectConfirmation => {
                self.record_confirmation(message);
                return Vec::new();
            }
            _ => return Vec::new(),
        }
        self.advance()
    }

    /// The current phase's deadline expired.
    ///
    /// Missing proposals and discounts count as refusals and the machine moves
    /// on; a missing confirmation ends the negotiation.
    pub fn on_deadline(&mut self) -> Vec<Message> {
        if !self.phase.is_collecting() {
            return Vec::new();
        }

        let missing = self.pending();
        tracing::warn!(
            negotiation = %self.id,
            phase = ?self.phase,
            missing = missing.len(),
            "Phase deadline expired"
        );
        self.trace.record(
            TraceStage::Timeout,
            "phase deadline expired",
            Some(serde_json::json!({"phase": self.phase, "missing": missing})),
        );

        if self.phase == Phase::CollectConfirmation {
            if let Some(winner) = self.winner.clone() {
                self.finish(Outcome::NoConfirmation {
                    seller: winner.seller,
                });
            }
            return Vec::new();
        }

        self.replied.extend(missing);
        self.advance()
    }

    fn accepts(&self, message: &Message) -> bool {
        self.phase.is_collecting()
            && self.token.is_some()
            && message.in_reply_to == self.token
            && message.conversation_id.as_deref() == Some(self.config.conversation_id.as_str())
            && self.awaiting.contains(&message.sender)
            && !self.replied.contains(&message.sender)
    }

    fn offer_mut(&mut self, seller: &AgentId) -> Option<&mut Offer> {
        self.offers.iter_mut().find(|o| &o.seller == seller)
    }

    fn record_proposal(&mut self, message: &Message) {
        let seller = message.sender.clone();
        if message.performative != Performative::Propose {
            tracing::info!(
                negotiation = %self.id,
                seller = %seller,
                reason = %message.content,
                "Seller refused"
            );
            self.trace.record_seller(
                TraceStage::Proposal,
                &seller,
                "seller refused",
                Some(serde_json::json!({"reason": message.content})),
            );
            return;
        }

        match message.price() {
            Ok(price) => {
                tracing::debug!(negotiation = %self.id, seller = %seller, price, "proposal received");
                if let Some(offer) = self.offer_mut(&seller) {
                    offer.price = price;
                }
                self.trace.record_seller(
                    TraceStage::Proposal,
                    &seller,
                    "proposal received",
                    Some(serde_json::json!({"price": price})),
                );
            }
            Err(e) => {
                tracing::warn!(negotiation = %self.id, error = %e, "malformed proposal treated as refusal");
                self.trace.record_seller(
                    TraceStage::Proposal,
                    &seller,
                    "malformed proposal",
                    Some(serde_json::json!({"error": e.to_string()})),
                );
            }
        }
    }

    fn record_discount(&mut self, message: &Message) {
        let seller = message.sender.clone();
        if message.performative != Performative::Accept {
            tracing::info!(negotiation = %self.id, seller = %seller, "There will be no discount");
            self.trace.record_seller(
                TraceStage::Discount,
                &seller,
                "discount refused",
                Some(serde_json::json!({"reason": message.content})),
            );
            return;
        }

        match message.discount() {
            Ok(discount) => {
                tracing::info!(
                    negotiation = %self.id,
                    seller = %seller,
                    item = %self.item,
                    discount,
                    "Discount granted"
                );
                if let Some(offer) = self.offer_mut(&seller) {
                    offer.discount = discount;
                }
                self.trace.record_seller(
                    TraceStage::Discount,
                    &seller,
                    "discount granted",
                    Some(serde_json::json!({"discount": discount})),
                );
            }
            Err(e) => {
                tracing::warn!(negotiation = %self.id, error = %e, "malformed discount ignored");
                self.trace.record_seller(
                    TraceStage::Discount,
                    &seller,
                    "malformed discount",
                    Some(serde_json::json!({"error": e.to_string()})),
                );
            }
        }
    }

    fn record_confirmation(&mut self, message: Message) {
        let Some(winner) = self.winner.clone() else {
            return;
        };
        if message.performative == Performative::Confirmed {
            self.finish(Outcome::Purchased {
                seller: winner.seller,
                price: winner.price,
            });
        } else {
            self.finish(Outcome::AlreadySold {
                seller: winner.seller,
            });
        }
    }

    /// Run every immediate phase until the machine has to wait or is done
    fn advance(&mut self) -> Vec<Message> {
        let mut outgoing = Vec::new();
        loop {
            match self.phase {
                Phase::SendCfp => {
                    self.offers = self.responders.iter().cloned().map(Offer::new).collect();
                    let targets = self.responders.clone();
                    outgoing.extend(self.send_phase(
                        Performative::Cfp,
                        "cfp",
                        targets,
                        Phase::CollectProposals,
                    ));
                    self.trace.record(
                        TraceStage::Cfp,
                        "call for proposals sent",
                        Some(serde_json::json!({"sellers": self.responders})),
                    );
                }
                Phase::CollectProposals if self.pending().is_empty() => {
                    self.phase = Phase::SendDiscountRequest;
                }
                Phase::SendDiscountRequest => {
                    let targets: Vec<AgentId> = match self.config.discount_targets {
                        DiscountTargets::Proposers => self
                            .offers
                            .iter()
                            .filter(|o| o.has_proposal())
                            .map(|o| o.seller.clone())
                            .collect(),
                        DiscountTargets::AllResponders => self.responders.clone(),
                    };
                    outgoing.extend(self.send_phase(
                        Performative::Propose,
                        "discount",
                        targets,
                        Phase::CollectDiscounts,
                    ));
                }
                Phase::CollectDiscounts if self.pending().is_empty() => {
                    self.winner = select_winner(&self.offers);
                    self.trace.record(
                        TraceStage::Selection,
                        "winner selected",
                        Some(serde_json::json!({
                            "winner": self.winner,
                            "offers": self.offers,
                        })),
                    );
                    self.phase = Phase::SendAcceptance;
                }
                Phase::SendAcceptance => match self.winner.clone() {
                    Some(winner) => {
                        tracing::info!(
                            negotiation = %self.id,
                            seller = %winner.seller,
                            price = winner.price,
                            "Best offer selected, sending purchase order"
                        );
                        outgoing.extend(self.send_phase(
                            Performative::Accept,
                            "order",
                            vec![winner.seller.clone()],
                            Phase::CollectConfirmation,
                        ));
                        self.trace.record_seller(
                            TraceStage::Acceptance,
                            &winner.seller,
                            "purchase order sent",
                            None,
                        );
                    }
                    None => self.finish(Outcome::NoOffers),
                },
                _ => break,
            }
        }
        outgoing
    }

    /// Mint a fresh token, address `targets` and enter the collecting phase
    fn send_phase(
        &mut self,
        performative: Performative,
        prefix: &str,
        targets: Vec<AgentId>,
        next: Phase,
    ) -> Option<Message> {
        let token = CorrelationToken::fresh(prefix);
        self.issued.push(token.clone());
        self.token = Some(token.clone());
        self.awaiting = targets.clone();
        self.replied.clear();
        self.phase = next;

        if targets.is_empty() {
            return None;
        }
        Some(
            Message::new(performative, self.buyer.clone())
                .with_receivers(targets)
                .with_content(self.item.clone())
                .with_conversation_id(self.config.conversation_id.clone())
                .with_reply_with(token),
        )
    }

    fn finish(&mut self, outcome: Outcome) {
        match &outcome {
            Outcome::Purchased { seller, price } => tracing::info!(
                negotiation = %self.id,
                buyer = %self.buyer,
                item = %self.item,
                seller = %seller,
                price,
                "Book successfully purchased"
            ),
            Outcome::NoOffers => tracing::info!(
                negotiation = %self.id,
                item = %self.item,
                "Attempt failed: book not available for sale"
            ),
            Outcome::AlreadySold { seller } => tracing::info!(
                negotiation = %self.id,
                item = %self.item,
                seller = %seller,
                "Attempt failed: requested book already sold"
            ),
            Outcome::NoConfirmation { seller } => tracing::warn!(
                negotiation = %self.id,
                item = %self.item,
                seller = %seller,
                "Attempt failed: no confirmation received"
            ),
        }
        let data = serde_json::to_value(&outcome).ok();
        match outcome.seller() {
            Some(seller) => {
                self.trace
                    .record_seller(TraceStage::Outcome, seller, outcome.reason(), data)
            }
            None => self.trace.record(TraceStage::Outcome, outcome.reason(), data),
        }
        self.token = None;
        self.awaiting.clear();
        self.replied.clear();
        self.outcome = Some(outcome);
        self.phase = Phase::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str) -> AgentId {
        AgentId::from_string(name)
    }

    fn negotiation(sellers: &[&str]) -> Negotiation {
        Negotiation::new(
            agent("buyer"),
            "Dune",
            sellers.iter().map(|s| agent(s)).collect(),
            NegotiationConfig::default(),
        )
    }

    fn reply(to: &Message, from: &str, performative: Performative, content: &str) -> Message {
        to.create_reply(agent(from), performative).with_content(content)
    }

    #[test]
    fn test_start_sends_cfp_to_everyone_once() {
        let mut n = negotiation(&["s1", "s2", "s1"]);
        let out = n.start();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].performative, Performative::Cfp);
        assert_eq!(out[0].receivers, vec![agent("s1"), agent("s2")]);
        assert_eq!(out[0].content, "Dune");
        assert_eq!(n.phase(), Phase::CollectProposals);
        assert_eq!(n.offers().len(), 2);
        assert!(n.start().is_empty());
    }

    #[test]
    fn test_full_round_with_discount() {
        let mut n = negotiation(&["s1"]);
        let cfp = n.start().remove(0);

        let discount_req = n.on_message(reply(&cfp, "s1", Performative::Propose, "100")).remove(0);
        assert_eq!(discount_req.performative, Performative::Propose);
        assert_eq!(n.phase(), Phase::CollectDiscounts);
        assert_ne!(discount_req.reply_with, cfp.reply_with);

        let order = n.on_message(reply(&discount_req, "s1", Performative::Accept, "10")).remove(0);
        assert_eq!(order.performative, Performative::Accept);
        assert_eq!(order.receivers, vec![agent("s1")]);
        assert_eq!(n.winner().unwrap().price, 90);

        assert!(n.on_message(reply(&order, "s1", Performative::Confirmed, "")).is_empty());
        assert_eq!(
            n.outcome(),
            Some(&Outcome::Purchased {
                seller: agent("s1"),
                price: 90
            })
        );
        assert!(n.is_done());
    }

    #[test]
    fn test_all_refuse_ends_with_no_offers() {
        let mut n = negotiation(&["s1", "s2"]);
        let cfp = n.start().remove(0);

        assert!(n.on_message(reply(&cfp, "s1", Performative::Refuse, "not-available")).is_empty());
        let out = n.on_message(reply(&cfp, "s2", Performative::Refuse, "not-available"));

        assert!(out.is_empty());
        assert_eq!(n.outcome(), Some(&Outcome::NoOffers));
        assert_eq!(n.trace().count(TraceStage::Acceptance), 0);
    }

    #[test]
    fn test_stale_token_is_ignored() {
        let mut n = negotiation(&["s1", "s2"]);
        let cfp = n.start().remove(0);
        let stale = Message::new(Performative::Propose, agent("s1"))
            .with_receiver(agent("buyer"))
            .with_content("1")
            .with_conversation_id(BOOK_TRADE_CONVERSATION)
            .with_in_reply_to(CorrelationToken::fresh("cfp"));

        assert!(n.on_message(stale).is_empty());
        assert_eq!(n.phase(), Phase::CollectProposals);
        assert!(n.offers().iter().all(|o| o.price == 0));

        // an outsider's reply is dropped as well
        assert!(n.on_message(reply(&cfp, "intruder", Performative::Propose, "5")).is_empty());
        assert_eq!(n.pending(), vec![agent("s1"), agent("s2")]);
    }

    #[test]
    fn test_duplicate_reply_counts_once() {
        let mut n = negotiation(&["s1", "s2"]);
        let cfp = n.start().remove(0);

        n.on_message(reply(&cfp, "s1", Performative::Propose, "50"));
        n.on_message(reply(&cfp, "s1", Performative::Propose, "10"));

        assert_eq!(n.phase(), Phase::CollectProposals);
        assert_eq!(n.offers()[0].price, 50);
    }

    #[test]
    fn test_malformed_price_is_a_refusal() {
        let mut n = negotiation(&["s1", "s2"]);
        let cfp = n.start().remove(0);

        n.on_message(reply(&cfp, "s1", Performative::Propose, "lots"));
        let out = n.on_message(reply(&cfp, "s2", Performative::Propose, "70"));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].receivers, vec![agent("s2")]);
        assert_eq!(n.offers()[0].price, 0);
    }

    #[test]
    fn test_discount_to_all_responders() {
        let config = NegotiationConfig {
            discount_targets: DiscountTargets::AllResponders,
            ..Default::default()
        };
        let mut n = Negotiation::new(agent("buyer"), "Dune", vec![agent("s1"), agent("s2")], config);
        let cfp = n.start().remove(0);

        n.on_message(reply(&cfp, "s1", Performative::Refuse, "not-available"));
        let req = n.on_message(reply(&cfp, "s2", Performative::Propose, "80")).remove(0);
        assert_eq!(req.receivers, vec![agent("s1"), agent("s2")]);

        // a refusing seller reporting a discount still cannot win
        n.on_message(reply(&req, "s1", Performative::Accept, "50"));
        let order = n.on_message(reply(&req, "s2", Performative::Refuse, "discount not available"));
        assert_eq!(order[0].receivers, vec![agent("s2")]);
        assert_eq!(n.winner().unwrap().price, 80);
    }

    #[test]
    fn test_deadline_treats_missing_as_refusal() {
        let mut n = negotiation(&["s1", "s2"]);
        let cfp = n.start().remove(0);
        n.on_message(reply(&cfp, "s1", Performative::Propose, "100"));

        let req = n.on_deadline();
        assert_eq!(req.len(), 1);
        assert_eq!(req[0].receivers, vec![agent("s1")]);

        // a late proposal from s2 no longer matters
        assert!(n.on_message(reply(&cfp, "s2", Performative::Propose, "1")).is_empty());

        let order = n.on_deadline();
        assert_eq!(order[0].receivers, vec![agent("s1")]);
        assert_eq!(n.winner().unwrap().price, 100);

        assert!(n.on_deadline().is_empty());
        assert_eq!(
            n.outcome(),
            Some(&Outcome::NoConfirmation {
                seller: agent("s1")
            })
        );
    }

    #[test]
    fn test_terminal_negotiation_is_inert() {
        let mut n = negotiation(&[]);
        assert!(n.start().is_empty());
        assert_eq!(n.outcome(), Some(&Outcome::NoOffers));

        let trace_len = n.trace().events.len();
        let spurious = Message::new(Performative::Confirmed, agent("s1"))
            .with_conversation_id(BOOK_TRADE_CONVERSATION);
        assert!(n.start().is_empty());
        assert!(n.on_message(spurious).is_empty());
        assert!(n.on_deadline().is_empty());
        assert_eq!(n.phase(), Phase::Done);
        assert_eq!(n.outcome(), Some(&Outcome::NoOffers));
        assert_eq!(n.trace().events.len(), trace_len + 1);
    }

    #[test]
    fn test_config_deserializes_timeout_seconds() {
        let config: NegotiationConfig =
            serde_json::from_str(r#"{"phase_timeout": 2.5, "discount_targets": "all_responders"}"#)
                .unwrap();
        assert_eq!(config.phase_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.discount_targets, DiscountTargets::AllResponders);
        assert_eq!(config.conversation_id, BOOK_TRADE_CONVERSATION);

        let config: NegotiationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.phase_timeout, None);
    }
}
