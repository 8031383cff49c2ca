use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Query parameters of the Cloud API verification handshake
/// (`GET /webhook?hub.mode=subscribe&hub.verify_token=...&hub.challenge=...`).
#[derive(Clone, Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Token matched: echo the challenge back verbatim.
    Accepted(String),
    Rejected,
}

pub fn verify_subscription(params: &VerifyParams, expected_token: &SecretString) -> VerifyOutcome {
    let subscribe = params.mode.as_deref() == Some("subscribe");
    let token_matches =
        params.verify_token.as_deref() == Some(expected_token.expose_secret());

    match (&params.challenge, subscribe && token_matches) {
        (Some(challenge), true) => VerifyOutcome::Accepted(challenge.clone()),
        _ => VerifyOutcome::Rejected,
    }
}

/// One inbound customer message, reduced to what the conversation runtime
/// needs. Also the body shape of the plain test endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundText {
    pub contact: String,
    pub text: String,
}

/// Cloud API change-notification payload, trimmed to the fields this
/// service reads. Unknown fields are ignored by serde.
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Change {
    pub value: ChangeValue,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    #[serde(default)]
    pub text: Option<TextBody>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

impl WebhookPayload {
    /// Flattens the notification into (contact, text) pairs, skipping
    /// non-text events (delivery statuses, reactions, media).
    pub fn inbound_texts(&self) -> Vec<InboundText> {
        self.entry
            .iter()
            .flat_map(|entry| &entry.changes)
            .flat_map(|change| &change.value.messages)
            .filter_map(|message| {
                message.text.as_ref().map(|text| InboundText {
                    contact: message.from.clone(),
                    text: text.body.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{verify_subscription, VerifyOutcome, VerifyParams, WebhookPayload};

    fn token() -> SecretString {
        String::from("hub-secret").into()
    }

    #[test]
    fn handshake_echoes_challenge_on_token_match() {
        let params = VerifyParams {
            mode: Some("subscribe".to_string()),
            verify_token: Some("hub-secret".to_string()),
            challenge: Some("1158201444".to_string()),
        };
        assert_eq!(
            verify_subscription(&params, &token()),
            VerifyOutcome::Accepted("1158201444".to_string())
        );
    }

    #[test]
    fn handshake_rejects_wrong_token_mode_or_missing_challenge() {
        let base = VerifyParams {
            mode: Some("subscribe".to_string()),
            verify_token: Some("hub-secret".to_string()),
            challenge: Some("1158201444".to_string()),
        };

        let wrong_token =
            VerifyParams { verify_token: Some("guess".to_string()), ..base.clone() };
        assert_eq!(verify_subscription(&wrong_token, &token()), VerifyOutcome::Rejected);

        let wrong_mode = VerifyParams { mode: Some("unsubscribe".to_string()), ..base.clone() };
        assert_eq!(verify_subscription(&wrong_mode, &token()), VerifyOutcome::Rejected);

        let no_challenge = VerifyParams { challenge: None, ..base };
        assert_eq!(verify_subscription(&no_challenge, &token()), VerifyOutcome::Rejected);
    }

    #[test]
    fn notification_payload_flattens_to_contact_text_pairs() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{
                "object": "whatsapp_business_account",
                "entry": [{
                    "id": "102290129340398",
                    "changes": [{
                        "field": "messages",
                        "value": {
                            "messaging_product": "whatsapp",
                            "messages": [{
                                "from": "15550001111",
                                "id": "wamid.HBgL",
                                "type": "text",
                                "text": { "body": "I want to travel" }
                            }]
                        }
                    }]
                }]
            }"#,
        )
        .expect("parse payload");

        let texts = payload.inbound_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].contact, "15550001111");
        assert_eq!(texts[0].text, "I want to travel");
    }

    #[test]
    fn status_only_notifications_yield_no_texts() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{
                "object": "whatsapp_business_account",
                "entry": [{
                    "changes": [{
                        "field": "messages",
                        "value": { "statuses": [{ "status": "delivered" }] }
                    }]
                }]
            }"#,
        )
        .expect("parse payload");
        assert!(payload.inbound_texts().is_empty());
    }
}
