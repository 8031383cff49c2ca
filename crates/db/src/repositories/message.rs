use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use leadline_core::domain::lead::LeadId;
use leadline_core::domain::message::{Message, MessageId};

use super::{MessageRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMessageRepository {
    pool: DbPool,
}

impl SqlMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: String,
    lead_id: String,
    sender: String,
    text: String,
    channel: String,
    created_at: String,
}

impl TryFrom<MessageRow> for Message {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|error| RepositoryError::Decode(format!("message id: {error}")))?;
        let lead_id = Uuid::parse_str(&row.lead_id)
            .map_err(|error| RepositoryError::Decode(format!("message lead_id: {error}")))?;
        let sender = row
            .sender
            .parse()
            .map_err(|error| RepositoryError::Decode(format!("message sender: {error}")))?;
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|error| RepositoryError::Decode(format!("message created_at: {error}")))?;

        Ok(Message {
            id: MessageId(id),
            lead_id: LeadId(lead_id),
            sender,
            text: row.text,
            channel: row.channel,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl MessageRepository for SqlMessageRepository {
    async fn append(&self, message: &Message) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO messages (id, lead_id, sender, text, channel, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(message.id.0.to_string())
        .bind(message.lead_id.0.to_string())
        .bind(message.sender.as_str())
        .bind(&message.text)
        .bind(&message.channel)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Message>, RepositoryError> {
        // rowid keeps insertion order even when timestamps collide.
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, lead_id, sender, text, channel, created_at \
             FROM messages WHERE lead_id = ?1 ORDER BY rowid",
        )
        .bind(lead_id.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }
}
