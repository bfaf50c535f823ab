use std::env;
use std::sync::Arc;

use anyhow::Context;
use atelier_auth::prelude::*;
use atelier_relay::prelude::*;

use crate::config::EdgeConfig;
use crate::metrics::EdgeMetrics;

/// Everything the handlers need, built once at startup and injected via
/// axum state. Clients own their connections; nothing lives at module
/// scope.
#[derive(Clone)]
pub struct AppState {
    pub version: VersionInfo,
    pub gate: Arc<AccessGate>,
    pub generation: Arc<dyn GenerationClient>,
    pub conversations: Arc<dyn ConversationStore>,
    pub metrics: EdgeMetrics,
}

impl AppState {
    pub fn from_config(config: &EdgeConfig) -> anyhow::Result<Self> {
        let sessions_cfg = &config.gate.sessions;
        let mut verifier_config = HttpSessionVerifierConfig::new(
            &sessions_cfg.base_url,
            sessions_cfg.resolve_api_key()?,
        )
        .context("session verifier config")?;
        if let Some(timeout) = sessions_cfg.timeout() {
            verifier_config = verifier_config.with_timeout(timeout);
        }
        let verifier =
            HttpSessionVerifier::new(verifier_config).context("session verifier client")?;

        let roles_cfg = &config.gate.roles;
        let mut role_config =
            HttpRoleStoreConfig::new(&roles_cfg.base_url, roles_cfg.resolve_service_key()?)
                .context("role store config")?;
        if let Some(table) = roles_cfg.table.as_ref() {
            role_config = role_config.with_table(table);
        }
        if let Some(timeout) = roles_cfg.timeout() {
            role_config = role_config.with_timeout(timeout);
        }
        let roles = HttpRoleStore::new(role_config).context("role store client")?;

        let gate = AccessGate::new(Box::new(verifier), Box::new(roles));

        let provider_cfg = &config.relay.provider;
        let mut gemini_config =
            GeminiConfig::new(provider_cfg.resolve_api_key()?).context("provider config")?;
        if let Some(base_url) = provider_cfg.base_url.as_ref() {
            gemini_config = gemini_config
                .with_base_url(base_url)
                .context("provider base url")?;
        }
        if let Some(model) = provider_cfg.model.as_ref() {
            gemini_config = gemini_config.with_model(model);
        }
        if let Some(version) = provider_cfg.api_version.as_ref() {
            gemini_config = gemini_config.with_version(version);
        }
        if let Some(limit) = provider_cfg.max_output_tokens {
            gemini_config = gemini_config.with_max_output_tokens(limit);
        }
        if let Some(temperature) = provider_cfg.temperature {
            gemini_config = gemini_config.with_temperature(temperature);
        }
        if let Some(timeout) = provider_cfg.timeout_secs {
            gemini_config = gemini_config.with_timeout(std::time::Duration::from_secs(timeout));
        }
        if let Some(limit) = provider_cfg.max_concurrent_requests {
            gemini_config = gemini_config.with_max_concurrency(limit);
        }
        let generation = GeminiClient::new(gemini_config).context("generation client")?;

        let store_cfg = &config.relay.store;
        let mut store_config = HttpConversationStoreConfig::new(
            &store_cfg.base_url,
            store_cfg.resolve_service_key()?,
        )
        .context("conversation store config")?;
        if let Some(table) = store_cfg.table.as_ref() {
            store_config = store_config.with_table(table);
        }
        if let Some(timeout) = store_cfg.timeout() {
            store_config = store_config.with_timeout(timeout);
        }
        let conversations =
            HttpConversationStore::new(store_config).context("conversation store client")?;

        Ok(Self {
            version: VersionInfo::from_env(),
            gate: Arc::new(gate),
            generation: Arc::new(generation),
            conversations: Arc::new(conversations),
            metrics: EdgeMetrics::default(),
        })
    }
}

#[derive(Clone)]
pub struct VersionInfo {
    pub version: String,
    pub commit: Option<String>,
}

impl VersionInfo {
    pub fn from_env() -> Self {
        Self {
            version: env::var("EDGE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            commit: env::var("GIT_COMMIT_HASH").ok(),
        }
    }
}
