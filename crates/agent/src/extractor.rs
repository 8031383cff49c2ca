use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use leadline_core::domain::lead::TravelSlots;

use crate::llm::LlmClient;

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The model call itself failed (network, timeout, bad status).
    #[error("llm provider call failed: {0}")]
    Provider(String),
    /// The model answered, but not with the JSON shape we asked for.
    /// Distinct from an empty result: an empty mapping means "no
    /// information found" and is not an error.
    #[error("llm output was not valid slot json: {0}")]
    Malformed(String),
}

/// Best-effort structured extraction from one customer message. Returned
/// fields are candidates only; the controller decides which ones stick.
#[async_trait]
pub trait SlotExtractor: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        current: &TravelSlots,
    ) -> Result<TravelSlots, ExtractionError>;
}

pub struct LlmSlotExtractor<C> {
    client: C,
}

impl<C> LlmSlotExtractor<C>
where
    C: LlmClient,
{
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C> SlotExtractor for LlmSlotExtractor<C>
where
    C: LlmClient,
{
    async fn extract(
        &self,
        text: &str,
        current: &TravelSlots,
    ) -> Result<TravelSlots, ExtractionError> {
        let prompt = extraction_prompt(text, current);
        let raw = self
            .client
            .complete(&prompt)
            .await
            .map_err(|error| ExtractionError::Provider(error.to_string()))?;
        parse_slot_payload(&raw)
    }
}

fn extraction_prompt(text: &str, current: &TravelSlots) -> String {
    let known = |value: &Option<String>| match value {
        Some(value) => format!("already known: {value}"),
        None => "unknown".to_string(),
    };

    format!(
        "You extract travel details from a customer message.\n\
         Current state:\n\
         - destination: {}\n\
         - travel_date: {}\n\
         - passengers: {}\n\n\
         Customer message: \"{text}\"\n\n\
         Respond with ONLY a JSON object with the keys \"destination\", \
         \"travel_date\", and \"passengers\". Use null for anything the \
         message does not mention. Do not invent values.",
        known(&current.destination),
        known(&current.travel_date),
        known(&current.passengers),
    )
}

#[derive(Deserialize)]
struct SlotPayload {
    #[serde(default)]
    destination: Option<String>,
    #[serde(default)]
    travel_date: Option<String>,
    #[serde(default)]
    passengers: Option<String>,
}

/// Parses the model's answer, tolerating markdown code fences around the
/// JSON object. Anything else is malformed output.
fn parse_slot_payload(raw: &str) -> Result<TravelSlots, ExtractionError> {
    let stripped = strip_code_fences(raw.trim());
    let payload: SlotPayload = serde_json::from_str(stripped)
        .map_err(|error| ExtractionError::Malformed(error.to_string()))?;

    Ok(TravelSlots {
        destination: clean(payload.destination),
        travel_date: clean(payload.travel_date),
        passengers: clean(payload.passengers),
    })
}

fn strip_code_fences(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("```") else {
        return raw;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Models occasionally answer "null" or "NONE" as a string.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null") && !v.eq_ignore_ascii_case("none"))
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use leadline_core::domain::lead::TravelSlots;

    use super::{parse_slot_payload, ExtractionError, LlmSlotExtractor, SlotExtractor};
    use crate::llm::LlmClient;

    struct CannedLlm {
        answer: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            match self.answer {
                Ok(answer) => Ok(answer.to_string()),
                Err(error) => Err(anyhow!(error)),
            }
        }
    }

    #[test]
    fn parses_clean_json() {
        let slots = parse_slot_payload(
            r#"{"destination": "Paris", "travel_date": null, "passengers": null}"#,
        )
        .expect("parse");
        assert_eq!(slots.destination.as_deref(), Some("Paris"));
        assert_eq!(slots.travel_date, None);
        assert_eq!(slots.passengers, None);
    }

    #[test]
    fn parses_fenced_json() {
        let slots = parse_slot_payload(
            "```json\n{\"destination\": null, \"travel_date\": \"2026-09-01\", \"passengers\": \"2\"}\n```",
        )
        .expect("parse");
        assert_eq!(slots.travel_date.as_deref(), Some("2026-09-01"));
        assert_eq!(slots.passengers.as_deref(), Some("2"));
    }

    #[test]
    fn missing_keys_default_to_unset() {
        let slots = parse_slot_payload(r#"{"destination": "Rome"}"#).expect("parse");
        assert_eq!(slots.destination.as_deref(), Some("Rome"));
        assert_eq!(slots.travel_date, None);
    }

    #[test]
    fn string_null_and_none_values_are_treated_as_unset() {
        let slots = parse_slot_payload(
            r#"{"destination": "NONE", "travel_date": "null", "passengers": "  "}"#,
        )
        .expect("parse");
        assert!(slots.is_empty());
    }

    #[test]
    fn prose_is_malformed_not_empty() {
        let result = parse_slot_payload("The customer wants to go to Paris.");
        assert!(matches!(result, Err(ExtractionError::Malformed(_))));
    }

    #[tokio::test]
    async fn provider_failure_is_distinct_from_malformed() {
        let extractor = LlmSlotExtractor::new(CannedLlm { answer: Err("connection refused") });
        let result = extractor.extract("Paris next week", &TravelSlots::default()).await;
        assert!(matches!(result, Err(ExtractionError::Provider(_))));
    }

    #[tokio::test]
    async fn extractor_round_trip_through_stub_client() {
        let extractor = LlmSlotExtractor::new(CannedLlm {
            answer: Ok(r#"{"destination": "Paris", "travel_date": null, "passengers": null}"#),
        });
        let slots =
            extractor.extract("Paris please", &TravelSlots::default()).await.expect("extract");
        assert_eq!(slots.destination.as_deref(), Some("Paris"));
    }
}
