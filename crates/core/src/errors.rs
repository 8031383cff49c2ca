use thiserror::Error;

use crate::domain::lead::Intent;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("intent is already set to {0:?} and only reset may clear it")]
    IntentAlreadySet(Intent),
    #[error("unknown intent tag: {0}")]
    UnknownIntent(String),
    #[error("unknown stage tag: {0}")]
    UnknownStage(String),
    #[error("unknown sender role: {0}")]
    UnknownSenderRole(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use crate::domain::lead::Intent;
    use crate::errors::{ApplicationError, DomainError};

    #[test]
    fn domain_error_converts_into_application_error() {
        let error = ApplicationError::from(DomainError::IntentAlreadySet(Intent::Travel));
        assert!(matches!(error, ApplicationError::Domain(_)));
        assert!(error.to_string().contains("only reset may clear it"));
    }
}
