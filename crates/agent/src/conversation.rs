use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use leadline_core::domain::lead::{Intent, Lead};
use leadline_core::domain::message::{Message, SenderRole};
use leadline_core::errors::ApplicationError;
use leadline_core::intent::classify_intent;
use leadline_db::repositories::{LeadRepository, MessageRepository, RepositoryError};

use crate::extractor::SlotExtractor;
use crate::guardrails::is_low_information;
use crate::reply::ReplyGenerator;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    pub lead: Lead,
    pub reply: String,
}

/// Orchestrates one conversation turn: load-or-create the lead, gate the
/// input, classify or collect, and reply.
///
/// Turns for the same contact are serialized through a keyed mutex held
/// from load until the lead is persisted; turns for different contacts run
/// independently. The first meaningful message only classifies intent;
/// slot extraction starts on the following turn.
pub struct ConversationController<L, M, X, R> {
    leads: L,
    messages: M,
    extractor: X,
    replier: R,
    channel: String,
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<L, M, X, R> ConversationController<L, M, X, R>
where
    L: LeadRepository,
    M: MessageRepository,
    X: SlotExtractor,
    R: ReplyGenerator,
{
    pub fn new(leads: L, messages: M, extractor: X, replier: R, channel: impl Into<String>) -> Self {
        Self {
            leads,
            messages,
            extractor,
            replier,
            channel: channel.into(),
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The audit-trail store, exposed for read-side surfaces.
    pub fn messages(&self) -> &M {
        &self.messages
    }

    pub async fn handle_turn(
        &self,
        contact: &str,
        text: &str,
    ) -> Result<TurnOutcome, ApplicationError> {
        let lock = self.contact_lock(contact).await;
        let _turn_guard = lock.lock().await;

        let mut lead = self.load_or_create(contact).await?;
        self.record(&lead, SenderRole::Customer, text).await?;

        if is_low_information(text) {
            tracing::info!(
                event_name = "conversation.turn.gated",
                contact = %contact,
                "low-information input; intent and slots untouched"
            );
        } else if lead.intent.is_none() {
            let intent = classify_intent(text);
            lead.qualify(intent)?;
            tracing::info!(
                event_name = "conversation.turn.qualified",
                contact = %contact,
                intent = intent.as_str(),
                "lead qualified"
            );
        } else if lead.intent == Some(Intent::Travel) && !lead.slots.is_complete() {
            match self.extractor.extract(text, &lead.slots).await {
                Ok(candidate) => {
                    let filled = lead.absorb_slots(&candidate);
                    tracing::info!(
                        event_name = "conversation.turn.slots_absorbed",
                        contact = %contact,
                        filled = filled.len(),
                        stage = lead.stage.as_str(),
                        "slot extraction merged"
                    );
                }
                // Soft failure: the customer still gets a reply asking for
                // the next missing detail, from unchanged slot state.
                Err(error) => {
                    tracing::warn!(
                        event_name = "conversation.extraction.failed",
                        contact = %contact,
                        error = %error,
                        "slot extraction failed; continuing with unchanged slots"
                    );
                }
            }
        }

        let reply = self.replier.reply(&lead).await;
        self.record(&lead, SenderRole::Assistant, &reply).await?;
        self.leads.save(&lead).await.map_err(persistence)?;

        debug_assert!(lead.invariants_hold());
        Ok(TurnOutcome { lead, reply })
    }

    /// Clears the lead's intent, slots, and stage. Idempotent: unknown or
    /// already-reset contacts succeed with no observable change, and no
    /// record is created for an unseen contact.
    pub async fn reset(&self, contact: &str) -> Result<Option<Lead>, ApplicationError> {
        let lock = self.contact_lock(contact).await;
        let _turn_guard = lock.lock().await;

        let Some(mut lead) = self.leads.find_by_contact(contact).await.map_err(persistence)?
        else {
            tracing::info!(
                event_name = "conversation.reset.unknown_contact",
                contact = %contact,
                "reset for unseen contact is a no-op"
            );
            return Ok(None);
        };

        lead.reset();
        self.leads.save(&lead).await.map_err(persistence)?;
        tracing::info!(
            event_name = "conversation.reset.done",
            contact = %contact,
            "lead state cleared"
        );
        Ok(Some(lead))
    }

    async fn load_or_create(&self, contact: &str) -> Result<Lead, ApplicationError> {
        if let Some(lead) = self.leads.find_by_contact(contact).await.map_err(persistence)? {
            return Ok(lead);
        }
        self.leads.create(contact, &self.channel).await.map_err(persistence)
    }

    async fn record(
        &self,
        lead: &Lead,
        sender: SenderRole,
        text: &str,
    ) -> Result<(), ApplicationError> {
        let message = Message::new(lead.id.clone(), sender, text, lead.channel.clone());
        self.messages.append(&message).await.map_err(persistence)
    }

    async fn contact_lock(&self, contact: &str) -> Arc<Mutex<()>> {
        let mut locks = self.turn_locks.lock().await;
        let lock = locks.entry(contact.to_string()).or_default().clone();
        // An entry referenced only by the map belongs to a contact with no
        // turn in flight; evicting it keeps the map bounded by the number
        // of concurrently active contacts instead of every contact seen.
        locks.retain(|_, entry| Arc::strong_count(entry) > 1);
        lock
    }
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}
