use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::errors::RelayError;
use crate::turn::ChatTurn;

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};

/// Incremental text fragments from the upstream generation call, in
/// arrival order.
pub type GenerationStream = BoxStream<'static, Result<String, RelayError>>;

/// A streamed-completion provider. `stream_reply` establishes the upstream
/// call and fails there if the provider rejects it, so callers can answer
/// with a plain error response before any bytes have been streamed.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn stream_reply(&self, turns: &[ChatTurn]) -> Result<GenerationStream, RelayError>;
}
