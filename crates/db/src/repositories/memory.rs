use std::collections::HashMap;

use tokio::sync::RwLock;

use leadline_core::domain::lead::{Lead, LeadId};
use leadline_core::domain::message::Message;

use super::{LeadRepository, MessageRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<HashMap<String, Lead>>,
}

#[async_trait::async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn find_by_contact(&self, contact: &str) -> Result<Option<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        Ok(leads.get(contact).cloned())
    }

    async fn create(&self, contact: &str, channel: &str) -> Result<Lead, RepositoryError> {
        let mut leads = self.leads.write().await;
        let lead = leads.entry(contact.to_string()).or_insert_with(|| Lead::new(contact, channel));
        Ok(lead.clone())
    }

    async fn save(&self, lead: &Lead) -> Result<(), RepositoryError> {
        let mut leads = self.leads.write().await;
        leads.insert(lead.contact.clone(), lead.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        messages.push(message.clone());
        Ok(())
    }

    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.iter().filter(|message| &message.lead_id == lead_id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use leadline_core::domain::lead::{Intent, Stage};
    use leadline_core::domain::message::{Message, SenderRole};

    use crate::repositories::{
        InMemoryLeadRepository, InMemoryMessageRepository, LeadRepository, MessageRepository,
    };

    #[tokio::test]
    async fn in_memory_lead_repo_create_then_find() {
        let repo = InMemoryLeadRepository::default();

        let created = repo.create("+15550001111", "whatsapp").await.expect("create");
        let again = repo.create("+15550001111", "whatsapp").await.expect("create again");
        assert_eq!(created.id, again.id, "one record per contact");

        let found = repo.find_by_contact("+15550001111").await.expect("find");
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn in_memory_lead_repo_save_overwrites_state() {
        let repo = InMemoryLeadRepository::default();

        let mut lead = repo.create("+15550001111", "whatsapp").await.expect("create");
        lead.qualify(Intent::Travel).expect("qualify");
        repo.save(&lead).await.expect("save");

        let found =
            repo.find_by_contact("+15550001111").await.expect("find").expect("lead exists");
        assert_eq!(found.stage, Stage::Qualified);
        assert_eq!(found.intent, Some(Intent::Travel));
    }

    #[tokio::test]
    async fn in_memory_message_repo_filters_by_lead() {
        let leads = InMemoryLeadRepository::default();
        let messages = InMemoryMessageRepository::default();

        let first = leads.create("+15550001111", "whatsapp").await.expect("create");
        let second = leads.create("+15550002222", "whatsapp").await.expect("create");

        messages
            .append(&Message::new(first.id.clone(), SenderRole::Customer, "hi there", "whatsapp"))
            .await
            .expect("append");
        messages
            .append(&Message::new(second.id.clone(), SenderRole::Customer, "hello!", "whatsapp"))
            .await
            .expect("append");

        let trail = messages.list_for_lead(&first.id).await.expect("list");
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].text, "hi there");
    }
}
