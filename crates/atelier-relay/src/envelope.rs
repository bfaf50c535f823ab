use serde::{Deserialize, Serialize};

use crate::errors::RelayError;

/// Terminal sentinel emitted as the last SSE data event of a completed
/// stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// The provider-independent wire shape each upstream fragment is reshaped
/// into: a generic chat-completion delta, so widget parsing stays stable
/// no matter which provider sits behind the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEnvelope {
    pub choices: Vec<DeltaChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaChoice {
    pub delta: DeltaContent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaContent {
    pub content: String,
}

impl DeltaEnvelope {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![DeltaChoice {
                delta: DeltaContent {
                    content: text.into(),
                },
            }],
        }
    }

    pub fn to_sse_json(&self) -> Result<String, RelayError> {
        serde_json::to_string(self)
            .map_err(|err| RelayError::internal(&format!("delta encode: {err}")))
    }
}
