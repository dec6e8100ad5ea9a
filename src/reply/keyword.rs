// Offline triage replies
//
// Rule-based stand-in for the remote model, used when no endpoint is
// reachable (console `--offline` mode) and in tests.

use async_trait::async_trait;

use super::client::ReplyClient;
use crate::error::ReplyError;

pub const URGENT_CARE_REPLY: &str =
    "Your symptom suggests urgent care. Please see cardiology or emergency.";
pub const GENERAL_PRACTICE_REPLY: &str =
    "Seems like a common symptom. Consider visiting a general practitioner.";
pub const ACKNOWLEDGE_REPLY: &str =
    "Thank you for describing your symptoms. Please wait for medical assessment.";

/// Keyword-matching triage rules
#[derive(Debug, Clone, Default)]
pub struct KeywordReplyClient;

impl KeywordReplyClient {
    pub fn new() -> Self {
        Self
    }

    pub fn triage(query: &str) -> &'static str {
        let query = query.to_lowercase();
        if query.contains("chest pain") {
            URGENT_CARE_REPLY
        } else if query.contains("cough") {
            GENERAL_PRACTICE_REPLY
        } else {
            ACKNOWLEDGE_REPLY
        }
    }
}

#[async_trait]
impl ReplyClient for KeywordReplyClient {
    async fn reply(&self, query: &str) -> Result<String, ReplyError> {
        Ok(Self::triage(query).to_string())
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triage_rules() {
        assert_eq!(KeywordReplyClient::triage("I have CHEST PAIN"), URGENT_CARE_REPLY);
        assert_eq!(KeywordReplyClient::triage("dry cough for a week"), GENERAL_PRACTICE_REPLY);
        assert_eq!(KeywordReplyClient::triage("hello"), ACKNOWLEDGE_REPLY);
    }

    #[test]
    fn test_chest_pain_takes_priority() {
        assert_eq!(
            KeywordReplyClient::triage("cough and chest pain"),
            URGENT_CARE_REPLY
        );
    }
}
