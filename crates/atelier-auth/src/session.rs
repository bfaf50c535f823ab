use std::time::Duration;

use async_trait::async_trait;
use atelier_types::prelude::*;
use reqwest::{header, Client, StatusCode, Url};
use serde::Deserialize;

use crate::errors::AuthError;

/// Verifies the opaque cookie material carried by a request against the
/// external session authority. `Ok(None)` means "no valid session";
/// `Err(_)` means the authority could not be consulted and callers must
/// fail closed.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, cookie_header: &str) -> Result<Option<Subject>, AuthError>;

    /// Best-effort reachability probe for the diagnostics page.
    async fn healthcheck(&self) -> Result<(), AuthError>;
}

#[derive(Clone, Debug)]
pub struct HttpSessionVerifierConfig {
    pub base_url: Url,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl HttpSessionVerifierConfig {
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self, AuthError> {
        let base_url = parse_base_url(base_url.as_ref())?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(10),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Session verification against a hosted auth service: the request's
/// cookies are relayed verbatim and the service answers with the session's
/// user record, or 401 when the cookies do not resolve to a session.
pub struct HttpSessionVerifier {
    client: Client,
    user_url: Url,
    health_url: Url,
}

#[derive(Deserialize)]
struct SessionUserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl HttpSessionVerifier {
    pub fn new(config: HttpSessionVerifierConfig) -> Result<Self, AuthError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "apikey",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|err| AuthError::internal(&format!("invalid auth api key: {err}")))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| AuthError::internal(&format!("auth client build failed: {err}")))?;

        let user_url = config
            .base_url
            .join("auth/v1/user")
            .map_err(|err| AuthError::internal(&format!("auth url join failed: {err}")))?;
        let health_url = config
            .base_url
            .join("auth/v1/health")
            .map_err(|err| AuthError::internal(&format!("auth url join failed: {err}")))?;

        Ok(Self {
            client,
            user_url,
            health_url,
        })
    }
}

#[async_trait]
impl SessionVerifier for HttpSessionVerifier {
    async fn verify(&self, cookie_header: &str) -> Result<Option<Subject>, AuthError> {
        if cookie_header.is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .get(self.user_url.clone())
            .header(header::COOKIE, cookie_header)
            .send()
            .await
            .map_err(|err| {
                AuthError::provider_unreachable(&format!("session verify request: {err}"))
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let payload: SessionUserPayload = response.json().await.map_err(|err| {
                    AuthError::provider_unreachable(&format!("session payload decode: {err}"))
                })?;
                Ok(Some(Subject {
                    subject_id: Id(payload.id),
                    email: payload.email,
                }))
            }
            status => Err(AuthError::provider_unreachable(&format!(
                "session verify returned {status}"
            ))),
        }
    }

    async fn healthcheck(&self) -> Result<(), AuthError> {
        let response = self
            .client
            .get(self.health_url.clone())
            .send()
            .await
            .map_err(|err| AuthError::provider_unreachable(&format!("auth health: {err}")))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(AuthError::provider_unreachable(&format!(
                "auth health returned {}",
                response.status()
            )))
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, AuthError> {
    let mut url = Url::parse(raw)
        .map_err(|err| AuthError::internal(&format!("auth base url parse failed: {err}")))?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path().trim_end_matches('/')));
    }
    Ok(url)
}
