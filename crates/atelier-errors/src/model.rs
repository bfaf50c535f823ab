use serde::Serialize;
use serde_json::json;

use crate::codes::Code;
use crate::retry::RetryClass;

/// The internal error envelope. `message_user` is safe to show to callers;
/// `message_dev` carries the dependency detail and stays in server logs.
#[derive(Clone, Debug)]
pub struct ErrorObj {
    pub code: Code,
    pub message_user: String,
    pub message_dev: Option<String>,
}

impl ErrorObj {
    pub fn to_public(&self) -> PublicErrorView {
        PublicErrorView {
            code: self.code.code,
            message: self.message_user.clone(),
        }
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status
    }

    pub fn retry(&self) -> RetryClass {
        self.code.retry
    }
}

impl std::fmt::Display for ErrorObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.code, self.message_user)?;
        if let Some(dev) = &self.message_dev {
            write!(f, " ({dev})")?;
        }
        Ok(())
    }
}

/// The caller-visible projection of an error. Never carries dev detail.
#[derive(Clone, Debug, Serialize)]
pub struct PublicErrorView {
    pub code: &'static str,
    pub message: String,
}

pub struct ErrorBuilder {
    code: Code,
    message_user: Option<String>,
    message_dev: Option<String>,
}

impl ErrorBuilder {
    pub fn new(code: Code) -> Self {
        Self {
            code,
            message_user: None,
            message_dev: None,
        }
    }

    pub fn user_msg(mut self, msg: impl Into<String>) -> Self {
        self.message_user = Some(msg.into());
        self
    }

    pub fn dev_msg(mut self, msg: impl Into<String>) -> Self {
        self.message_dev = Some(msg.into());
        self
    }

    pub fn build(self) -> ErrorObj {
        ErrorObj {
            code: self.code,
            message_user: self
                .message_user
                .unwrap_or_else(|| "Request failed.".to_string()),
            message_dev: self.message_dev,
        }
    }
}

/// Render an error as the JSON body edge handlers answer with.
pub fn to_http_response(err: &ErrorObj) -> (u16, serde_json::Value) {
    let public = err.to_public();
    (
        err.http_status(),
        json!({
            "error": public.code,
            "message": public.message,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;

    #[test]
    fn public_view_hides_dev_detail() {
        let err = ErrorBuilder::new(codes::LLM_PROVIDER_UNAVAILABLE)
            .user_msg("Generation service is unavailable.")
            .dev_msg("connect refused: 10.0.0.4:443")
            .build();
        let public = err.to_public();
        assert_eq!(public.code, "LLM.PROVIDER_UNAVAILABLE");
        assert!(!public.message.contains("10.0.0.4"));
    }

    #[test]
    fn http_response_uses_code_status() {
        let err = ErrorBuilder::new(codes::SCHEMA_VALIDATION)
            .user_msg("Messages required")
            .build();
        let (status, body) = to_http_response(&err);
        assert_eq!(status, 400);
        assert_eq!(body["error"], "SCHEMA.VALIDATION");
        assert_eq!(body["message"], "Messages required");
    }
}
