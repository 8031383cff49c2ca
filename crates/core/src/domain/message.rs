use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::lead::LeadId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    Customer,
    Assistant,
}

impl SenderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for SenderRole {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "customer" => Ok(Self::Customer),
            "assistant" => Ok(Self::Assistant),
            other => Err(DomainError::UnknownSenderRole(other.to_string())),
        }
    }
}

/// Append-only audit-trail entry for one side of a conversation turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub lead_id: LeadId,
    pub sender: SenderRole,
    pub text: String,
    pub channel: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        lead_id: LeadId,
        sender: SenderRole,
        text: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            lead_id,
            sender,
            text: text.into(),
            channel: channel.into(),
            created_at: Utc::now(),
        }
    }
}
