use serde::Serialize;

/// Where the controller is in the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    Idle,
    Listening,
    Submitting,
    Speaking,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::Idle => "idle",
            TurnPhase::Listening => "listening",
            TurnPhase::Submitting => "submitting",
            TurnPhase::Speaking => "speaking",
        }
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speech recognition status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    /// Never started in this turn
    Idle,
    Listening,
    /// Ended by the user, the engine or an error
    Stopped,
}

/// Speech synthesis status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Speaking,
}

/// Transient state of one voice turn, owned by a single controller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceTurnState {
    pub phase: TurnPhase,
    pub capture: CaptureState,
    pub playback: PlaybackState,

    /// Recognised text of the current turn (interim or final)
    pub transcript: String,

    /// Set when the user stopped capture; cleared only by a fresh start
    pub manual_stop: bool,

    /// A capture error happened since the last start
    pub capture_failed: bool,

    /// Capture was running when the turn was submitted and should come
    /// back once the reply has been spoken
    pub resume_capture: bool,
}

impl Default for VoiceTurnState {
    fn default() -> Self {
        Self {
            phase: TurnPhase::Idle,
            capture: CaptureState::Idle,
            playback: PlaybackState::Idle,
            transcript: String::new(),
            manual_stop: false,
            capture_failed: false,
            resume_capture: false,
        }
    }
}

impl VoiceTurnState {
    /// Auto-restart is allowed only while nothing suppresses it
    pub fn may_auto_restart(&self) -> bool {
        !self.manual_stop && !self.capture_failed && self.playback == PlaybackState::Idle
    }

    /// Capture and playback never overlap
    pub fn is_exclusive(&self) -> bool {
        !(self.capture == CaptureState::Listening && self.playback == PlaybackState::Speaking)
    }
}
