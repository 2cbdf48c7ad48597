//! Gemini model client with bounded retry.
//!
//! Sends one prompt per batch to the Gemini `generateContent` endpoint and
//! owns the retry policy for transient failures. Calls are sequential across
//! batches; the only suspension points are the retry cooldowns here.

use crate::error::{Result, ScreenError};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Gemini API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Maximum attempts per prompt, counting the first call
pub const MAX_ATTEMPTS: u32 = 3;

/// Cooldown after a rate-limit signal; constant, not exponential, so a
/// quota reset has time to land
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// Base delay for the exponential backoff on transient-unavailable errors
const BACKOFF_BASE_SECS: u64 = 2;

/// Model configuration, constructed once at process start and passed by
/// reference into the client. No ambient singletons.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl ModelConfig {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// Retry classification for a failed model call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryClass {
    /// 429 / RESOURCE_EXHAUSTED: constant cooldown, then retry
    RateLimit,
    /// 503 / SERVICE_UNAVAILABLE: exponential backoff, then retry
    Unavailable,
    /// Anything else: propagate immediately
    Fatal,
}

/// Classify an API failure from its status code and response body.
pub(crate) fn classify_failure(status: u16, body: &str) -> RetryClass {
    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        RetryClass::RateLimit
    } else if status == 503 || body.contains("SERVICE_UNAVAILABLE") {
        RetryClass::Unavailable
    } else {
        RetryClass::Fatal
    }
}

/// Backoff delay for transient-unavailable retries: 2s, 4s, 8s.
///
/// `attempt` counts completed attempts starting at 0; the exponent is never
/// negative.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(BACKOFF_BASE_SECS * 2u64.pow(attempt))
}

/// Gemini API response structures
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

/// Client for the Gemini generateContent API
pub struct ModelClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl ModelClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScreenError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Send one prompt, retrying transient failures up to [`MAX_ATTEMPTS`].
    ///
    /// Rate-limit errors wait a constant cooldown; unavailable errors back off
    /// exponentially; all other errors propagate immediately. On exhaustion
    /// the last error is returned.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            match self.call_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    attempt += 1;
                    let wait = match &err {
                        ScreenError::RateLimited(_) => RATE_LIMIT_COOLDOWN,
                        ScreenError::Unavailable(_) => backoff_delay(attempt - 1),
                        _ => return Err(err),
                    };
                    if attempt >= MAX_ATTEMPTS {
                        return Err(err);
                    }
                    warn!(
                        attempt = attempt,
                        wait_secs = wait.as_secs(),
                        error = %err,
                        "Model call failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// One generateContent request, no retries
    async fn call_once(&self, prompt: &str) -> Result<String> {
        let api_url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let request_body = serde_json::json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ]
        });

        debug!(model = %self.config.model, "Sending model request");

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{} - {}", status, body);
            return Err(match classify_failure(status.as_u16(), &body) {
                RetryClass::RateLimit => ScreenError::RateLimited(message),
                RetryClass::Unavailable => ScreenError::Unavailable(message),
                RetryClass::Fatal => ScreenError::Api {
                    code: status.as_u16() as i32,
                    message,
                },
            });
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ScreenError::Parse(format!("Failed to parse model response: {}", e)))?;

        Ok(api_response.text())
    }
}
