use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context};
use config::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub gate: GateBootstrap,
    pub relay: RelayBootstrap,
}

impl EdgeConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_file =
            env::var("EDGE_CONFIG_FILE").unwrap_or_else(|_| "config/edge.local.toml".to_string());

        let mut builder = Config::builder()
            .set_default("server.address", ServerConfig::default_address())?
            .set_default("server.port", ServerConfig::default_port())?;

        if Path::new(&config_file).exists() {
            builder = builder.add_source(config::File::from(Path::new(&config_file)));
        }

        builder = builder.add_source(config::Environment::with_prefix("EDGE").separator("__"));

        let config: EdgeConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_address")]
    pub address: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_address() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        4000
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: Self::default_address(),
            port: Self::default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateBootstrap {
    pub sessions: SessionServiceConfig,
    pub roles: RoleServiceConfig,
}

/// The hosted auth service the gate verifies cookies against.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionServiceConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl SessionServiceConfig {
    pub fn resolve_api_key(&self) -> anyhow::Result<String> {
        resolve_secret_source(
            &self.api_key,
            &self.api_key_env,
            &self.api_key_file,
            "gate.sessions.api_key",
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// The role table the gate consults for admin access.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleServiceConfig {
    pub base_url: String,
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default)]
    pub service_key_env: Option<String>,
    #[serde(default)]
    pub service_key_file: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl RoleServiceConfig {
    pub fn resolve_service_key(&self) -> anyhow::Result<String> {
        resolve_secret_source(
            &self.service_key,
            &self.service_key_env,
            &self.service_key_file,
            "gate.roles.service_key",
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayBootstrap {
    pub provider: ProviderConfig,
    pub store: ConversationStoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_concurrent_requests: Option<usize>,
}

impl ProviderConfig {
    pub fn resolve_api_key(&self) -> anyhow::Result<String> {
        resolve_secret_source(
            &self.api_key,
            &self.api_key_env,
            &self.api_key_file,
            "relay.provider.api_key",
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversationStoreConfig {
    pub base_url: String,
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default)]
    pub service_key_env: Option<String>,
    #[serde(default)]
    pub service_key_file: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConversationStoreConfig {
    pub fn resolve_service_key(&self) -> anyhow::Result<String> {
        resolve_secret_source(
            &self.service_key,
            &self.service_key_env,
            &self.service_key_file,
            "relay.store.service_key",
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn resolve_secret_source(
    literal: &Option<String>,
    env_key: &Option<String>,
    file_path: &Option<String>,
    field: &str,
) -> anyhow::Result<String> {
    if let Some(env_var) = env_key.as_ref() {
        let value = env::var(env_var)
            .with_context(|| format!("environment variable {env_var} for {field} not set"))?;
        return Ok(value);
    }
    if let Some(path) = file_path.as_ref() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read secret file {path} for {field}"))?;
        return Ok(contents.trim().to_string());
    }
    if let Some(value) = literal.as_ref() {
        if value.is_empty() {
            return Err(anyhow!("{field} literal secret cannot be empty"));
        }
        return Ok(value.clone());
    }
    Err(anyhow!("{field} secret must be provided via literal/env/file"))
}
