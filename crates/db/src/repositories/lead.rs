use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use leadline_core::domain::lead::{Lead, LeadId, TravelSlots};

use super::{LeadRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct LeadRow {
    id: String,
    contact: String,
    channel: String,
    intent: Option<String>,
    stage: String,
    destination: Option<String>,
    travel_date: Option<String>,
    passengers: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<LeadRow> for Lead {
    type Error = RepositoryError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|error| RepositoryError::Decode(format!("lead id `{}`: {error}", row.id)))?;
        let intent = row
            .intent
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|error| RepositoryError::Decode(format!("lead intent: {error}")))?;
        let stage = row
            .stage
            .parse()
            .map_err(|error| RepositoryError::Decode(format!("lead stage: {error}")))?;

        Ok(Lead {
            id: LeadId(id),
            contact: row.contact,
            channel: row.channel,
            intent,
            stage,
            slots: TravelSlots {
                destination: row.destination,
                travel_date: row.travel_date,
                passengers: row.passengers,
            },
            created_at: parse_timestamp("created_at", &row.created_at)?,
            updated_at: parse_timestamp("updated_at", &row.updated_at)?,
        })
    }
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("lead {column} `{raw}`: {error}")))
}

const SELECT_BY_CONTACT: &str = "SELECT id, contact, channel, intent, stage, destination, \
     travel_date, passengers, created_at, updated_at FROM leads WHERE contact = ?1";

#[async_trait::async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn find_by_contact(&self, contact: &str) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query_as::<_, LeadRow>(SELECT_BY_CONTACT)
            .bind(contact)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Lead::try_from).transpose()
    }

    async fn create(&self, contact: &str, channel: &str) -> Result<Lead, RepositoryError> {
        let fresh = Lead::new(contact, channel);

        // Losing the insert race is fine: the conflict clause makes the
        // insert a no-op and the read below returns the winner's record.
        sqlx::query(
            "INSERT INTO leads (id, contact, channel, stage, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT (contact) DO NOTHING",
        )
        .bind(fresh.id.0.to_string())
        .bind(&fresh.contact)
        .bind(&fresh.channel)
        .bind(fresh.stage.as_str())
        .bind(fresh.created_at.to_rfc3339())
        .bind(fresh.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, LeadRow>(SELECT_BY_CONTACT)
            .bind(contact)
            .fetch_one(&self.pool)
            .await?;
        Lead::try_from(row)
    }

    async fn save(&self, lead: &Lead) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE leads SET intent = ?1, stage = ?2, destination = ?3, travel_date = ?4, \
             passengers = ?5, updated_at = ?6 WHERE id = ?7",
        )
        .bind(lead.intent.map(|intent| intent.as_str()))
        .bind(lead.stage.as_str())
        .bind(&lead.slots.destination)
        .bind(&lead.slots.travel_date)
        .bind(&lead.slots.passengers)
        .bind(lead.updated_at.to_rfc3339())
        .bind(lead.id.0.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
