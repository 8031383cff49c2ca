pub mod config;
pub mod domain;
pub mod errors;
pub mod intent;

pub use domain::lead::{Intent, Lead, LeadId, Stage, TravelSlots};
pub use domain::message::{Message, MessageId, SenderRole};
pub use errors::{ApplicationError, DomainError};
pub use intent::classify_intent;
