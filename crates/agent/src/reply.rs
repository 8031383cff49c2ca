use async_trait::async_trait;

use leadline_core::domain::lead::{Intent, Lead, SlotName};

/// Produces the assistant's reply for the lead's current state. Total:
/// implementations must always return text, falling back to a fixed
/// template if any external call fails.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn reply(&self, lead: &Lead) -> String;
}

/// Deterministic template replies: ask for the first unset required slot in
/// priority order, or close out once everything is collected.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateReplyGenerator;

impl TemplateReplyGenerator {
    pub fn render(lead: &Lead) -> String {
        match lead.intent {
            Some(Intent::Travel) => match lead.slots.next_missing() {
                Some(SlotName::Destination) => {
                    "Great! May I know your travel destination?".to_string()
                }
                Some(SlotName::TravelDate) => "What is your preferred travel date?".to_string(),
                Some(SlotName::Passengers) => {
                    "How many passengers will be travelling?".to_string()
                }
                None => "Thank you. I will prepare the best travel options for you.".to_string(),
            },
            Some(Intent::Health) => "Could you please describe your health concern?".to_string(),
            Some(Intent::General) | None => "How can I assist you today?".to_string(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for TemplateReplyGenerator {
    async fn reply(&self, lead: &Lead) -> String {
        Self::render(lead)
    }
}

#[cfg(test)]
mod tests {
    use leadline_core::domain::lead::{Intent, Lead, TravelSlots};

    use super::TemplateReplyGenerator;

    fn lead_with(intent: Option<Intent>, slots: TravelSlots) -> Lead {
        let mut lead = Lead::new("+15550001111", "whatsapp");
        if let Some(intent) = intent {
            lead.qualify(intent).expect("qualify");
        }
        lead.slots = slots;
        lead.advance_stage();
        lead
    }

    #[test]
    fn travel_replies_follow_slot_priority_order() {
        let lead = lead_with(Some(Intent::Travel), TravelSlots::default());
        assert_eq!(TemplateReplyGenerator::render(&lead), "Great! May I know your travel destination?");

        let lead = lead_with(
            Some(Intent::Travel),
            TravelSlots { destination: Some("Paris".to_string()), ..TravelSlots::default() },
        );
        assert_eq!(TemplateReplyGenerator::render(&lead), "What is your preferred travel date?");

        let lead = lead_with(
            Some(Intent::Travel),
            TravelSlots {
                destination: Some("Paris".to_string()),
                travel_date: Some("2026-09-01".to_string()),
                passengers: None,
            },
        );
        assert_eq!(
            TemplateReplyGenerator::render(&lead),
            "How many passengers will be travelling?"
        );
    }

    #[test]
    fn complete_travel_lead_gets_the_completion_message() {
        let lead = lead_with(
            Some(Intent::Travel),
            TravelSlots {
                destination: Some("Paris".to_string()),
                travel_date: Some("2026-09-01".to_string()),
                passengers: Some("2".to_string()),
            },
        );
        assert_eq!(
            TemplateReplyGenerator::render(&lead),
            "Thank you. I will prepare the best travel options for you."
        );
    }

    #[test]
    fn health_and_general_use_fixed_prompts() {
        let health = lead_with(Some(Intent::Health), TravelSlots::default());
        assert_eq!(
            TemplateReplyGenerator::render(&health),
            "Could you please describe your health concern?"
        );

        let general = lead_with(Some(Intent::General), TravelSlots::default());
        assert_eq!(TemplateReplyGenerator::render(&general), "How can I assist you today?");

        let unqualified = lead_with(None, TravelSlots::default());
        assert_eq!(TemplateReplyGenerator::render(&unqualified), "How can I assist you today?");
    }
}
