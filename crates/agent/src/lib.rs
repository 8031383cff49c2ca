//! Conversation runtime - the slot-filling state machine and its collaborators
//!
//! This crate is the "brain" of the leadline system:
//! - Guards input quality before anything touches the model (`guardrails`)
//! - Classifies intent and collects travel details turn by turn
//!   (`conversation`)
//! - Wraps the hosted language model behind a small trait (`llm`) so the
//!   state machine stays testable with deterministic stubs
//! - Extracts structured slot values from free text (`extractor`)
//! - Produces the reply for the current lead state (`reply`)
//!
//! # Safety principle
//!
//! The LLM is strictly an extractor. It never decides the conversation
//! stage, never overwrites a previously collected answer, and malformed
//! model output degrades to "ask for the next missing detail" instead of
//! dropping the customer's message.

pub mod conversation;
pub mod extractor;
pub mod guardrails;
pub mod llm;
pub mod reply;

pub use conversation::{ConversationController, TurnOutcome};
pub use extractor::{ExtractionError, LlmSlotExtractor, SlotExtractor};
pub use guardrails::is_low_information;
pub use llm::{ChatCompletionClient, LlmClient};
pub use reply::{ReplyGenerator, TemplateReplyGenerator};
