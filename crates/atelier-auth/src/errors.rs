use atelier_errors::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0:?}")]
pub struct AuthError(pub Box<ErrorObj>);

impl AuthError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn to_public(&self) -> PublicErrorView {
        self.0.to_public()
    }

    pub fn unauthenticated(detail: &str) -> Self {
        AuthError(Box::new(
            ErrorBuilder::new(codes::AUTH_UNAUTHENTICATED)
                .user_msg("Sign-in required.")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn forbidden(detail: &str) -> Self {
        AuthError(Box::new(
            ErrorBuilder::new(codes::AUTH_FORBIDDEN)
                .user_msg("You do not have access to this area.")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn provider_unreachable(detail: &str) -> Self {
        AuthError(Box::new(
            ErrorBuilder::new(codes::AUTH_PROVIDER_UNREACHABLE)
                .user_msg("Authorization service is unavailable.")
                .dev_msg(detail)
                .build(),
        ))
    }

    pub fn internal(detail: &str) -> Self {
        AuthError(Box::new(
            ErrorBuilder::new(codes::UNKNOWN_INTERNAL)
                .user_msg("Authorization check failed.")
                .dev_msg(detail)
                .build(),
        ))
    }
}

impl From<AuthError> for ErrorObj {
    fn from(value: AuthError) -> Self {
        value.into_inner()
    }
}
