//! Voice turn coordination
//!
//! This module provides the `VoiceTurnController` that manages:
//! - Speech capture with interim/final transcripts
//! - Reply submission with a bounded wait
//! - Spoken playback of replies, never overlapping capture
//! - Auto-restart of capture after engine end or playback end

mod config;
mod controller;
mod engine;
mod event;
mod language;
mod state;

pub use config::VoiceTurnConfig;
pub use controller::VoiceTurnController;
pub use engine::{CaptureEngine, PlaybackEngine, UnsupportedCapture, UnsupportedPlayback};
pub use event::{CaptureEvent, CaptureSink, PlaybackEvent, PlaybackSink, VoiceEvent, VoiceNotice};
pub use language::VoiceLanguage;
pub use state::{CaptureState, PlaybackState, TurnPhase, VoiceTurnState};
