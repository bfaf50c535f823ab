use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};

use crate::errors::RelayError;
use crate::turn::StoredTurn;

/// Read path over previously persisted conversations, keyed by the chat
/// session's correlation id. Writing is owned by an external process.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Turns for one conversation in chronological order. Unknown ids are
    /// an empty history, not an error.
    async fn history(&self, session_id: &str) -> Result<Vec<StoredTurn>, RelayError>;
}

#[derive(Clone, Debug)]
pub struct HttpConversationStoreConfig {
    pub base_url: Url,
    pub service_key: String,
    pub table: String,
    pub request_timeout: Duration,
}

impl HttpConversationStoreConfig {
    pub fn new(
        base_url: impl AsRef<str>,
        service_key: impl Into<String>,
    ) -> Result<Self, RelayError> {
        let mut base_url = Url::parse(base_url.as_ref())
            .map_err(|err| RelayError::internal(&format!("store base url parse failed: {err}")))?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path().trim_end_matches('/')));
        }
        Ok(Self {
            base_url,
            service_key: service_key.into(),
            table: "chat_messages".to_string(),
            request_timeout: Duration::from_secs(10),
        })
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// History reads against the hosted database's REST surface: a filtered
/// select ordered by insertion time.
pub struct HttpConversationStore {
    client: Client,
    rows_url: Url,
}

impl HttpConversationStore {
    pub fn new(config: HttpConversationStoreConfig) -> Result<Self, RelayError> {
        let mut headers = header::HeaderMap::new();
        let key_value = header::HeaderValue::from_str(&config.service_key)
            .map_err(|err| RelayError::internal(&format!("invalid store service key: {err}")))?;
        headers.insert("apikey", key_value);
        let bearer = format!("Bearer {}", config.service_key);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&bearer)
                .map_err(|err| RelayError::internal(&format!("invalid store service key: {err}")))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| RelayError::internal(&format!("store client build failed: {err}")))?;

        let rows_url = config
            .base_url
            .join(&format!("rest/v1/{}", config.table))
            .map_err(|err| RelayError::internal(&format!("store url join failed: {err}")))?;

        Ok(Self { client, rows_url })
    }
}

#[async_trait]
impl ConversationStore for HttpConversationStore {
    async fn history(&self, session_id: &str) -> Result<Vec<StoredTurn>, RelayError> {
        let filter = format!("eq.{session_id}");
        let response = self
            .client
            .get(self.rows_url.clone())
            .query(&[
                ("select", "role,content,created_at"),
                ("session_id", filter.as_str()),
                ("order", "created_at.asc"),
            ])
            .send()
            .await
            .map_err(|err| RelayError::storage(&format!("history request: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::storage(&format!("history returned {status}")));
        }

        response
            .json::<Vec<StoredTurn>>()
            .await
            .map_err(|err| RelayError::storage(&format!("history decode: {err}")))
    }
}

/// In-memory store for tests and local bring-up.
#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: HashMap<String, Vec<StoredTurn>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(
        mut self,
        session_id: impl Into<String>,
        turns: Vec<StoredTurn>,
    ) -> Self {
        self.conversations.insert(session_id.into(), turns);
        self
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn history(&self, session_id: &str) -> Result<Vec<StoredTurn>, RelayError> {
        Ok(self
            .conversations
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}
