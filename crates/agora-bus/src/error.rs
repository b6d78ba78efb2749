use agora_core::AgentId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("Message from {sender} has no receivers")]
    NoReceivers { sender: AgentId },

    #[error("Unknown recipients: {}", format_agents(.agents))]
    UnknownRecipients { agents: Vec<AgentId> },

    #[error("Agent {agent} already registered for {service_type}")]
    AlreadyRegistered { agent: AgentId, service_type: String },

    #[error("Agent {agent} is not registered")]
    NotRegistered { agent: AgentId },

    #[error("Directory unavailable: {reason}")]
    DirectoryUnavailable { reason: String },
}

fn format_agents(agents: &[AgentId]) -> String {
    agents
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, BusError>;
