use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use atelier_types::prelude::*;
use reqwest::{header, Client, Url};
use serde::Deserialize;

use crate::errors::AuthError;

/// Role labels the admin area recognizes. Unknown labels are preserved for
/// logging but never grant access. Wire values are the snake_case labels
/// handled by `from_label`/`as_label`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    Admin,
    Editor,
    Other(String),
}

impl Role {
    pub fn from_label(label: &str) -> Self {
        match label {
            "super_admin" => Role::SuperAdmin,
            "admin" => Role::Admin,
            "editor" => Role::Editor,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_label(&self) -> &str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Other(label) => label,
        }
    }

    /// Membership in the closed set the admin area accepts.
    pub fn permits_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin | Role::Editor)
    }
}

/// Fetches the authorization record for an authenticated subject. Fetched
/// fresh on every request; the gate deliberately holds no decision cache.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn role_for(&self, subject_id: &Id) -> Result<Option<Role>, AuthError>;
}

#[derive(Clone, Debug)]
pub struct HttpRoleStoreConfig {
    pub base_url: Url,
    pub service_key: String,
    pub table: String,
    pub request_timeout: Duration,
}

impl HttpRoleStoreConfig {
    pub fn new(base_url: impl AsRef<str>, service_key: impl Into<String>) -> Result<Self, AuthError> {
        let mut base_url = Url::parse(base_url.as_ref())
            .map_err(|err| AuthError::internal(&format!("role base url parse failed: {err}")))?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path().trim_end_matches('/')));
        }
        Ok(Self {
            base_url,
            service_key: service_key.into(),
            table: "admin_users".to_string(),
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

/// Role lookup against the hosted database's REST surface: a filtered
/// single-row select on the admin-users table.
pub struct HttpRoleStore {
    client: Client,
    rows_url: Url,
}

#[derive(Deserialize)]
struct RoleRow {
    role: String,
}

impl HttpRoleStore {
    pub fn new(config: HttpRoleStoreConfig) -> Result<Self, AuthError> {
        let mut headers = header::HeaderMap::new();
        let key_value = header::HeaderValue::from_str(&config.service_key)
            .map_err(|err| AuthError::internal(&format!("invalid role service key: {err}")))?;
        headers.insert("apikey", key_value);
        let bearer = format!("Bearer {}", config.service_key);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&bearer)
                .map_err(|err| AuthError::internal(&format!("invalid role service key: {err}")))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| AuthError::internal(&format!("role client build failed: {err}")))?;

        let rows_url = config
            .base_url
            .join(&format!("rest/v1/{}", config.table))
            .map_err(|err| AuthError::internal(&format!("role url join failed: {err}")))?;

        Ok(Self { client, rows_url })
    }
}

#[async_trait]
impl RoleStore for HttpRoleStore {
    async fn role_for(&self, subject_id: &Id) -> Result<Option<Role>, AuthError> {
        let filter = format!("eq.{}", subject_id.as_str());
        let response = self
            .client
            .get(self.rows_url.clone())
            .query(&[
                ("select", "role"),
                ("user_id", filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|err| AuthError::provider_unreachable(&format!("role lookup request: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::provider_unreachable(&format!(
                "role lookup returned {status}"
            )));
        }

        let rows: Vec<RoleRow> = response.json().await.map_err(|err| {
            AuthError::provider_unreachable(&format!("role payload decode: {err}"))
        })?;

        Ok(rows.into_iter().next().map(|row| Role::from_label(&row.role)))
    }
}

/// In-memory role store for tests and local bring-up.
#[derive(Default)]
pub struct MemoryRoleStore {
    roles: HashMap<String, Role>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, subject_id: impl Into<String>, role: Role) -> Self {
        self.roles.insert(subject_id.into(), role);
        self
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn role_for(&self, subject_id: &Id) -> Result<Option<Role>, AuthError> {
        Ok(self.roles.get(subject_id.as_str()).cloned())
    }
}
