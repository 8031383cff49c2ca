pub mod outbound;
pub mod webhook;

pub use outbound::{CloudApiClient, DeliveryClient, DeliveryError, NoopDeliveryClient};
pub use webhook::{verify_subscription, InboundText, VerifyOutcome, VerifyParams, WebhookPayload};
