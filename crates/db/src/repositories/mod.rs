use async_trait::async_trait;
use thiserror::Error;

use leadline_core::domain::lead::{Lead, LeadId};
use leadline_core::domain::message::Message;

pub mod lead;
pub mod memory;
pub mod message;

pub use lead::SqlLeadRepository;
pub use memory::{InMemoryLeadRepository, InMemoryMessageRepository};
pub use message::SqlMessageRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Store of one lead record per contact. `create` must be race-free per
/// contact key: at most one record ever exists for a given contact, even
/// under concurrent first messages.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn find_by_contact(&self, contact: &str) -> Result<Option<Lead>, RepositoryError>;
    async fn create(&self, contact: &str, channel: &str) -> Result<Lead, RepositoryError>;
    async fn save(&self, lead: &Lead) -> Result<(), RepositoryError>;
}

/// Append-only conversation audit trail, insertion order preserved.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, message: &Message) -> Result<(), RepositoryError>;
    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Message>, RepositoryError>;
}
