use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info};

use super::messages::{ReplyRequest, ReplyResponse};
use crate::error::ReplyError;

/// Shown to the user when the reply endpoint fails
pub const FALLBACK_REPLY: &str =
    "There was an error connecting to the AI service. Please try again later.";

/// Used when the endpoint answers without any text
pub const EMPTY_REPLY: &str = "Sorry, I couldn't understand that.";

/// Source of assistant replies
#[async_trait]
pub trait ReplyClient: Send + Sync {
    /// Produce a reply for one user query
    async fn reply(&self, query: &str) -> Result<String, ReplyError>;

    /// Client name for logging
    fn name(&self) -> &str;
}

/// Ask `client` for a reply, mapping any failure to [`FALLBACK_REPLY`]
pub async fn reply_or_fallback(client: &dyn ReplyClient, query: &str) -> String {
    match client.reply(query).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("{} reply failed: {}", client.name(), e);
            FALLBACK_REPLY.to_string()
        }
    }
}

/// JSON-over-HTTP reply endpoint (`{query}` in, `{reply}` out)
pub struct HttpReplyClient {
    http: reqwest::Client,
    url: String,
}

impl HttpReplyClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ReplyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReplyError::Transport(e.to_string()))?;

        let url = url.into();
        info!("Reply endpoint: {}", url);

        Ok(Self { http, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReplyClient for HttpReplyClient {
    async fn reply(&self, query: &str) -> Result<String, ReplyError> {
        debug!("POST {} ({} chars)", self.url, query.len());

        let response = self
            .http
            .post(&self.url)
            .json(&ReplyRequest {
                query: query.to_string(),
            })
            .send()
            .await
            .map_err(|e| ReplyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReplyError::Status(status.as_u16()));
        }

        let body: ReplyResponse = response
            .json()
            .await
            .map_err(|e| ReplyError::Decode(e.to_string()))?;

        Ok(body
            .reply
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }

    fn name(&self) -> &str {
        "http"
    }
}
