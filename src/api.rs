use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::events::Message;

/// Shown when the backend answered but carried no answer text.
pub const MISSING_ANSWER: &str = "⚠️ Không nhận được phản hồi từ máy chủ.";

/// Shown when the request failed outright or the body was not JSON.
pub const CONNECTION_ERROR: &str = "⚠️ Lỗi khi kết nối với server.";

/// Request body for one exchange.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub prompt: &'a str,
}

/// Response body for one exchange. Every field is absent-tolerant; the
/// fallback strings cover whatever the backend left out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub total_chunks: Option<usize>,
    #[serde(default)]
    pub sample_chunks: Option<String>,
}

/// Outcome of one exchange, reduced to what gets appended to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub text: String,
    pub chunks: String,
    pub total_chunks: Option<usize>,
}

impl BotReply {
    /// Collapse an exchange outcome into the bot message for this turn.
    /// Success and failure both land here, so the caller has a single exit
    /// path and every submission produces exactly one reply.
    pub fn from_outcome(outcome: Result<AskResponse>) -> Self {
        match outcome {
            Ok(body) => BotReply {
                // An empty answer counts as missing, matching the backend's
                // own web client.
                text: body
                    .response
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| MISSING_ANSWER.to_string()),
                chunks: body.sample_chunks.unwrap_or_default(),
                total_chunks: body.total_chunks,
            },
            Err(err) => {
                log::error!("exchange failed: {err:#}");
                BotReply {
                    text: CONNECTION_ERROR.to_string(),
                    chunks: String::new(),
                    total_chunks: None,
                }
            }
        }
    }

    pub fn into_message(self) -> Message {
        Message::bot(self.text, self.chunks, self.total_chunks)
    }
}

/// HTTP client for the StudyBuddy backend.
#[derive(Clone)]
pub struct BackendClient {
    server_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        // No request timeout: a hung backend keeps the pending row visible,
        // it does not produce a spurious error turn.
        Self {
            server_url: config.server_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Perform one exchange: POST the prompt, decode the JSON body.
    ///
    /// Non-2xx statuses are not treated as transport failures; an error body
    /// that parses but lacks `response` falls through to [`MISSING_ANSWER`].
    pub async fn ask(&self, prompt: &str) -> Result<AskResponse> {
        log::info!("POST {} ({} prompt chars)", self.server_url, prompt.chars().count());
        let response = self
            .client
            .post(&self.server_url)
            .json(&AskRequest { prompt })
            .send()
            .await
            .context("request to backend failed")?;

        log::info!("backend answered with HTTP {}", response.status());
        response
            .json()
            .await
            .context("backend body was not valid JSON")
    }
}
