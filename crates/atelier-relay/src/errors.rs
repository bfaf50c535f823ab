use atelier_errors::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0:?}")]
pub struct RelayError(pub Box<ErrorObj>);

impl RelayError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn to_public(&self) -> PublicErrorView {
        self.0.to_public()
    }

    pub fn schema(detail: &str) -> Self {
        RelayError(Box::new(
            ErrorBuilder::new(codes::SCHEMA_VALIDATION)
                .user_msg("Messages required")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn provider_unavailable(detail: &str) -> Self {
        RelayError(Box::new(
            ErrorBuilder::new(codes::LLM_PROVIDER_UNAVAILABLE)
                .user_msg("Generation service is unavailable.")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn storage(detail: &str) -> Self {
        RelayError(Box::new(
            ErrorBuilder::new(codes::STORAGE_UNAVAILABLE)
                .user_msg("Conversation history is unavailable.")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn internal(detail: &str) -> Self {
        RelayError(Box::new(
            ErrorBuilder::new(codes::UNKNOWN_INTERNAL)
                .user_msg("Chat request failed.")
                .dev_msg(detail)
                .build(),
        ))
    }
}

impl From<RelayError> for ErrorObj {
    fn from(value: RelayError) -> Self {
        value.into_inner()
    }
}
