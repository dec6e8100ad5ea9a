use serde::{Deserialize, Serialize};

/// Body posted to the reply endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub query: String,
}

/// Body returned by the reply endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyResponse {
    /// Missing or empty when the model produced nothing
    #[serde(default)]
    pub reply: Option<String>,
}
