use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{header, Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::errors::RelayError;
use crate::provider::{GenerationClient, GenerationStream};
use crate::turn::{ChatTurn, TurnRole};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
const DEFAULT_VERSION: &str = "v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 256;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: Url,
    pub api_version: String,
    pub model: String,
    pub request_timeout: Duration,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub max_concurrent_requests: usize,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, RelayError> {
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|err| RelayError::internal(&format!("gemini base url parse failed: {err}")))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url,
            api_version: DEFAULT_VERSION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(60),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            max_concurrent_requests: 8,
        })
    }

    pub fn with_base_url(mut self, base: impl AsRef<str>) -> Result<Self, RelayError> {
        self.base_url = Url::parse(base.as_ref())
            .map_err(|err| RelayError::internal(&format!("gemini base url parse failed: {err}")))?;
        if !self.base_url.path().ends_with('/') {
            self.base_url
                .set_path(&format!("{}/", self.base_url.path().trim_end_matches('/')));
        }
        Ok(self)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_output_tokens(mut self, limit: u32) -> Self {
        self.max_output_tokens = limit;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = limit.max(1);
        self
    }
}

/// Streaming client for the hosted generation API. One upstream call per
/// relay request, bounded by a shared concurrency limiter.
pub struct GeminiClient {
    client: Client,
    stream_url: Url,
    limiter: Arc<Semaphore>,
    max_output_tokens: u32,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, RelayError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|err| RelayError::internal(&format!("invalid gemini api key: {err}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| RelayError::internal(&format!("gemini client build failed: {err}")))?;

        let mut stream_url = config
            .base_url
            .join(&format!(
                "{}/models/{}:streamGenerateContent",
                config.api_version, config.model
            ))
            .map_err(|err| RelayError::internal(&format!("gemini url join failed: {err}")))?;
        stream_url.set_query(Some("alt=sse"));

        Ok(Self {
            client,
            stream_url,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<OutboundContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfigWire,
}

#[derive(Serialize)]
struct OutboundContent {
    role: &'static str,
    parts: Vec<OutboundPart>,
}

#[derive(Serialize)]
struct OutboundPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfigWire {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize, Default)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<StreamCandidate>,
}

#[derive(Deserialize, Default)]
struct StreamCandidate {
    #[serde(default)]
    content: Option<StreamContent>,
}

#[derive(Deserialize, Default)]
struct StreamContent {
    #[serde(default)]
    parts: Vec<StreamPart>,
}

#[derive(Deserialize, Default)]
struct StreamPart {
    #[serde(default)]
    text: Option<String>,
}

impl StreamChunk {
    fn text(self) -> String {
        let mut out = String::new();
        for candidate in self.candidates {
            let Some(content) = candidate.content else {
                continue;
            };
            for part in content.parts {
                if let Some(text) = part.text {
                    out.push_str(&text);
                }
            }
        }
        out
    }
}

fn build_request(turns: &[ChatTurn], max_output_tokens: u32, temperature: f32) -> GenerateRequest {
    let contents = turns
        .iter()
        .map(|turn| OutboundContent {
            role: match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "model",
            },
            parts: vec![OutboundPart {
                text: turn.content.clone(),
            }],
        })
        .collect();
    GenerateRequest {
        contents,
        generation_config: GenerationConfigWire {
            max_output_tokens,
            temperature,
        },
    }
}

fn map_http_error(status: StatusCode, detail: &str) -> RelayError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RelayError::provider_unavailable(&format!("gemini auth failed: {detail}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            RelayError::provider_unavailable(&format!("gemini rate limited: {detail}"))
        }
        StatusCode::BAD_REQUEST => {
            RelayError::provider_unavailable(&format!("gemini rejected request: {detail}"))
        }
        _ => RelayError::provider_unavailable(&format!(
            "gemini returned {}: {}",
            status.as_u16(),
            detail
        )),
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn stream_reply(&self, turns: &[ChatTurn]) -> Result<GenerationStream, RelayError> {
        let payload = build_request(turns, self.max_output_tokens, self.temperature);

        let permit = self
            .limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|err| RelayError::internal(&format!("gemini limiter closed: {err}")))?;

        let response = self
            .client
            .post(self.stream_url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|err| RelayError::provider_unavailable(&format!("gemini request: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            drop(permit);
            return Err(map_http_error(status, "stream init failed"));
        }

        // The permit moves into the stream so the slot stays taken for as
        // long as the upstream connection is open.
        let stream = try_stream! {
            let _permit = permit;
            let mut body = response.bytes_stream();
            let mut buffer = String::new();
            let mut data_buf = String::new();

            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|err| {
                    RelayError::provider_unavailable(&format!("gemini stream chunk: {err}"))
                })?;
                let chunk_str = std::str::from_utf8(&chunk).map_err(|err| {
                    RelayError::provider_unavailable(&format!("gemini stream utf8: {err}"))
                })?;
                buffer.push_str(chunk_str);

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim_end_matches('\r').to_string();
                    buffer = buffer[pos + 1..].to_string();

                    if let Some(data) = line.strip_prefix("data:") {
                        let data = data.trim_start_matches(' ');
                        if !data.is_empty() {
                            if !data_buf.is_empty() {
                                data_buf.push('\n');
                            }
                            data_buf.push_str(data);
                        }
                    } else if line.is_empty() && !data_buf.is_empty() {
                        let chunk: StreamChunk =
                            serde_json::from_str(&data_buf).map_err(|err| {
                                RelayError::provider_unavailable(&format!(
                                    "gemini stream decode: {err}"
                                ))
                            })?;
                        data_buf.clear();

                        let fragment = chunk.text();
                        if !fragment.is_empty() {
                            yield fragment;
                        }
                    }
                }
            }

            // A final frame without a trailing blank line still counts.
            if !data_buf.is_empty() {
                let chunk: StreamChunk = serde_json::from_str(&data_buf).map_err(|err| {
                    RelayError::provider_unavailable(&format!("gemini stream decode: {err}"))
                })?;
                let fragment = chunk.text();
                if !fragment.is_empty() {
                    yield fragment;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
