use std::time::Duration;

use super::language::VoiceLanguage;

/// Configuration for a voice turn controller
#[derive(Debug, Clone)]
pub struct VoiceTurnConfig {
    /// Speech languages for the current UI locale
    pub language: VoiceLanguage,

    /// Pause before capture is re-acquired after the engine or playback ends
    /// Default: 300ms
    pub restart_delay: Duration,

    /// Upper bound on a reply request
    /// Default: 20 seconds
    pub reply_timeout: Duration,

    /// Submit automatically as soon as a final transcript arrives
    pub auto_submit: bool,
}

impl Default for VoiceTurnConfig {
    fn default() -> Self {
        Self {
            language: VoiceLanguage::ENGLISH,
            restart_delay: Duration::from_millis(300),
            reply_timeout: Duration::from_secs(20),
            auto_submit: true,
        }
    }
}
