//! Message templates used to select messages from a mailbox

use crate::types::{CorrelationToken, Message, Performative};

/// A predicate over messages, composable with [`MessageTemplate::and`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTemplate {
    Any,
    Performative(Performative),
    ConversationId(String),
    InReplyTo(CorrelationToken),
    /// Matches replies to any of the listed tokens
    InReplyToAny(Vec<CorrelationToken>),
    And(Box<MessageTemplate>, Box<MessageTemplate>),
}

impl MessageTemplate {
    pub fn performative(performative: Performative) -> Self {
        MessageTemplate::Performative(performative)
    }

    pub fn conversation_id(id: impl Into<String>) -> Self {
        MessageTemplate::ConversationId(id.into())
    }

    pub fn in_reply_to(token: CorrelationToken) -> Self {
        MessageTemplate::InReplyTo(token)
    }

    pub fn in_reply_to_any(tokens: Vec<CorrelationToken>) -> Self {
        MessageTemplate::InReplyToAny(tokens)
    }

    pub fn and(self, other: MessageTemplate) -> Self {
        MessageTemplate::And(Box::new(self), Box::new(other))
    }

    pub fn matches(&self, message: &Message) -> bool {
        match self {
            MessageTemplate::Any => true,
            MessageTemplate::Performative(p) => message.performative == *p,
            MessageTemplate::ConversationId(id) => {
                message.conversation_id.as_deref() == Some(id.as_str())
            }
            MessageTemplate::InReplyTo(token) => message.in_reply_to.as_ref() == Some(token),
            MessageTemplate::InReplyToAny(tokens) => message
                .in_reply_to
                .as_ref()
                .is_some_and(|t| tokens.contains(t)),
            MessageTemplate::And(a, b) => a.matches(message) && b.matches(message),
        }
    }
}
