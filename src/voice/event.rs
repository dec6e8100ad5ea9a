// Voice controller inbox
//
// User intents and engine callbacks are both delivered as `VoiceEvent`s on a
// single unbounded channel, so the controller sees them in emission order and
// handles them one at a time. Engine events carry the generation of the
// resource that produced them; events from a released resource are dropped.

use tokio::sync::mpsc;

use super::state::TurnPhase;
use crate::error::{ReplyError, VoiceError};

/// Events emitted by a speech recognition engine
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Interim(String),
    Final(String),
    /// The engine stopped on its own (silence, timeout, ...)
    Ended,
    Error(String),
}

/// Events emitted by a speech synthesis engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Ended,
    Error(String),
}

/// Everything the controller reacts to
#[derive(Debug)]
pub enum VoiceEvent {
    StartCapture,
    StopCapture { keep_transcript: bool },
    /// Submit the current transcript
    Submit,
    /// Submit typed text
    SubmitText(String),
    StopPlayback,
    Cancel,
    /// Cancel everything and stop processing
    Shutdown,

    Capture { generation: u64, event: CaptureEvent },
    Playback { generation: u64, event: PlaybackEvent },
    Reply { turn: u64, result: Result<String, ReplyError> },
    RestartCapture { generation: u64 },
}

/// Updates published to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceNotice {
    PhaseChanged(TurnPhase),
    Transcript { text: String, is_final: bool },
    Submitted(String),
    Reply(String),
    Error(VoiceError),
}

/// Handle given to a capture engine for reporting results
#[derive(Debug, Clone)]
pub struct CaptureSink {
    generation: u64,
    tx: mpsc::UnboundedSender<VoiceEvent>,
}

impl CaptureSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<VoiceEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, event: CaptureEvent) {
        // Closed inbox means the controller is gone
        let _ = self.tx.send(VoiceEvent::Capture {
            generation: self.generation,
            event,
        });
    }

    pub fn interim(&self, text: impl Into<String>) {
        self.emit(CaptureEvent::Interim(text.into()));
    }

    pub fn final_result(&self, text: impl Into<String>) {
        self.emit(CaptureEvent::Final(text.into()));
    }

    pub fn ended(&self) {
        self.emit(CaptureEvent::Ended);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(CaptureEvent::Error(message.into()));
    }
}

/// Handle given to a playback engine for reporting completion
#[derive(Debug, Clone)]
pub struct PlaybackSink {
    generation: u64,
    tx: mpsc::UnboundedSender<VoiceEvent>,
}

impl PlaybackSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<VoiceEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, event: PlaybackEvent) {
        let _ = self.tx.send(VoiceEvent::Playback {
            generation: self.generation,
            event,
        });
    }

    pub fn ended(&self) {
        self.emit(PlaybackEvent::Ended);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(PlaybackEvent::Error(message.into()));
    }
}
