use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde::Serialize;
use tracing::{error, info, warn};

use leadline_agent::conversation::{ConversationController, TurnOutcome};
use leadline_agent::extractor::SlotExtractor;
use leadline_agent::reply::ReplyGenerator;
use leadline_core::errors::ApplicationError;
use leadline_db::repositories::{LeadRepository, MessageRepository};
use leadline_whatsapp::outbound::DeliveryClient;
use leadline_whatsapp::webhook::{
    verify_subscription, InboundText, VerifyOutcome, VerifyParams, WebhookPayload,
};

pub struct WebhookState<L, M, X, R> {
    pub controller: Arc<ConversationController<L, M, X, R>>,
    pub delivery: Arc<dyn DeliveryClient>,
    pub verify_token: SecretString,
}

impl<L, M, X, R> Clone for WebhookState<L, M, X, R> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            delivery: self.delivery.clone(),
            verify_token: self.verify_token.clone(),
        }
    }
}

pub fn router<L, M, X, R>(state: WebhookState<L, M, X, R>) -> Router
where
    L: LeadRepository + 'static,
    M: MessageRepository + 'static,
    X: SlotExtractor + 'static,
    R: ReplyGenerator + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/webhook", get(verify::<L, M, X, R>).post(notify::<L, M, X, R>))
        .route("/webhook/test", post(turn_test::<L, M, X, R>))
        .route("/webhook/reset/{contact}", post(reset::<L, M, X, R>))
        .with_state(state)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
}

pub async fn root() -> Json<ServiceStatus> {
    Json(ServiceStatus { status: "leadline assistant running" })
}

/// Snapshot of the lead after one turn, in the shape the test endpoint
/// promises: flat slot fields plus the assistant's reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnResponse {
    pub status: &'static str,
    pub lead_id: String,
    pub contact: String,
    pub intent: Option<&'static str>,
    pub stage: &'static str,
    pub destination: Option<String>,
    pub travel_date: Option<String>,
    pub passengers: Option<String>,
    pub ai_reply: String,
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        let lead = outcome.lead;
        Self {
            status: "ok",
            lead_id: lead.id.0.to_string(),
            contact: lead.contact,
            intent: lead.intent.map(|intent| intent.as_str()),
            stage: lead.stage.as_str(),
            destination: lead.slots.destination,
            travel_date: lead.slots.travel_date,
            passengers: lead.slots.passengers,
            ai_reply: outcome.reply,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResetResponse {
    pub status: &'static str,
    pub contact: String,
}

pub async fn verify<L, M, X, R>(
    State(state): State<WebhookState<L, M, X, R>>,
    Query(params): Query<VerifyParams>,
) -> (StatusCode, String)
where
    L: LeadRepository + 'static,
    M: MessageRepository + 'static,
    X: SlotExtractor + 'static,
    R: ReplyGenerator + 'static,
{
    match verify_subscription(&params, &state.verify_token) {
        VerifyOutcome::Accepted(challenge) => {
            info!(event_name = "webhook.verify.accepted", "subscription handshake accepted");
            (StatusCode::OK, challenge)
        }
        VerifyOutcome::Rejected => {
            warn!(event_name = "webhook.verify.rejected", "subscription handshake rejected");
            (StatusCode::FORBIDDEN, "verification failed".to_string())
        }
    }
}

/// Cloud API change notification. Always acknowledged with 200 so the
/// provider does not re-deliver; per-message failures are logged.
pub async fn notify<L, M, X, R>(
    State(state): State<WebhookState<L, M, X, R>>,
    Json(payload): Json<WebhookPayload>,
) -> StatusCode
where
    L: LeadRepository + 'static,
    M: MessageRepository + 'static,
    X: SlotExtractor + 'static,
    R: ReplyGenerator + 'static,
{
    for inbound in payload.inbound_texts() {
        match state.controller.handle_turn(&inbound.contact, &inbound.text).await {
            Ok(outcome) => {
                if let Err(delivery_error) =
                    state.delivery.send(&inbound.contact, &outcome.reply).await
                {
                    warn!(
                        event_name = "webhook.delivery.failed",
                        contact = %inbound.contact,
                        error = %delivery_error,
                        "reply dispatch failed; not retried"
                    );
                }
            }
            Err(turn_error) => {
                error!(
                    event_name = "webhook.turn.failed",
                    contact = %inbound.contact,
                    error = %turn_error,
                    "inbound turn failed"
                );
            }
        }
    }

    StatusCode::OK
}

/// Plain `{contact, text}` turn endpoint. Returns the lead snapshot and
/// reply in the body and never dispatches outbound delivery.
pub async fn turn_test<L, M, X, R>(
    State(state): State<WebhookState<L, M, X, R>>,
    Json(inbound): Json<InboundText>,
) -> Result<Json<TurnResponse>, (StatusCode, Json<ErrorResponse>)>
where
    L: LeadRepository + 'static,
    M: MessageRepository + 'static,
    X: SlotExtractor + 'static,
    R: ReplyGenerator + 'static,
{
    state
        .controller
        .handle_turn(&inbound.contact, &inbound.text)
        .await
        .map(|outcome| Json(TurnResponse::from(outcome)))
        .map_err(error_response)
}

pub async fn reset<L, M, X, R>(
    State(state): State<WebhookState<L, M, X, R>>,
    Path(contact): Path<String>,
) -> Result<Json<ResetResponse>, (StatusCode, Json<ErrorResponse>)>
where
    L: LeadRepository + 'static,
    M: MessageRepository + 'static,
    X: SlotExtractor + 'static,
    R: ReplyGenerator + 'static,
{
    state.controller.reset(&contact).await.map_err(error_response)?;
    Ok(Json(ResetResponse { status: "reset", contact }))
}

fn error_response(error: ApplicationError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        ApplicationError::Domain(_) => StatusCode::BAD_REQUEST,
        ApplicationError::Persistence(_) | ApplicationError::Integration(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ApplicationError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { status: "error", message: error.to_string() }))
}
