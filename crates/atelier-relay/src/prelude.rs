pub use crate::envelope::{DeltaEnvelope, DONE_SENTINEL};
pub use crate::errors::RelayError;
pub use crate::persona::{preamble, SYSTEM_INSTRUCTION};
pub use crate::provider::{
    GeminiClient, GeminiConfig, GenerationClient, GenerationStream,
};
pub use crate::store::{
    ConversationStore, HttpConversationStore, HttpConversationStoreConfig,
    MemoryConversationStore,
};
pub use crate::turn::{ChatTurn, StoredTurn, TurnRole};
