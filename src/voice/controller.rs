use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::VoiceTurnConfig;
use super::engine::{CaptureEngine, PlaybackEngine};
use super::event::{CaptureEvent, CaptureSink, PlaybackEvent, PlaybackSink, VoiceEvent, VoiceNotice};
use super::state::{CaptureState, PlaybackState, TurnPhase, VoiceTurnState};
use crate::error::{Capability, ReplyError, VoiceError};
use crate::history::normalize_input;
use crate::reply::{ReplyClient, FALLBACK_REPLY};

/// Coordinates speech capture, reply submission and spoken playback
///
/// The controller is the single owner of its capture and playback resources.
/// All input (user intents and engine callbacks) arrives through one inbox and
/// is handled sequentially; the public methods apply the same transitions
/// directly for callers that drive the controller themselves.
pub struct VoiceTurnController {
    config: VoiceTurnConfig,
    state: VoiceTurnState,

    capture: Box<dyn CaptureEngine>,
    playback: Box<dyn PlaybackEngine>,
    replies: Arc<dyn ReplyClient>,

    /// Ordered inbox and a sender for tasks we spawn
    inbox: mpsc::UnboundedReceiver<VoiceEvent>,
    sender: mpsc::UnboundedSender<VoiceEvent>,

    /// Updates for the UI
    notices: mpsc::UnboundedSender<VoiceNotice>,

    capture_held: bool,
    playback_held: bool,

    /// Bumped on every acquire/release; stale engine events are dropped
    capture_generation: u64,
    playback_generation: u64,

    /// Bumped per submission and on cancel; stale replies are dropped
    turn: u64,

    restart_task: Option<JoinHandle<()>>,
    reply_task: Option<JoinHandle<()>>,

    /// Capabilities already reported as unavailable
    reported: HashSet<Capability>,
}

impl VoiceTurnController {
    /// Create a controller and the receiver for its UI notices
    pub fn new(
        config: VoiceTurnConfig,
        capture: Box<dyn CaptureEngine>,
        playback: Box<dyn PlaybackEngine>,
        replies: Arc<dyn ReplyClient>,
    ) -> (Self, mpsc::UnboundedReceiver<VoiceNotice>) {
        let (sender, inbox) = mpsc::unbounded_channel();
        let (notices, notice_rx) = mpsc::unbounded_channel();

        info!(
            "Voice controller created (capture: {}, playback: {}, replies: {}, language: {})",
            capture.name(),
            playback.name(),
            replies.name(),
            config.language.recognition
        );

        let controller = Self {
            config,
            state: VoiceTurnState::default(),
            capture,
            playback,
            replies,
            inbox,
            sender,
            notices,
            capture_held: false,
            playback_held: false,
            capture_generation: 0,
            playback_generation: 0,
            turn: 0,
            restart_task: None,
            reply_task: None,
            reported: HashSet::new(),
        };

        (controller, notice_rx)
    }

    /// Sender for posting events into this controller's inbox
    pub fn handle(&self) -> mpsc::UnboundedSender<VoiceEvent> {
        self.sender.clone()
    }

    pub fn state(&self) -> &VoiceTurnState {
        &self.state
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.phase
    }

    pub fn transcript(&self) -> &str {
        &self.state.transcript
    }

    pub fn holds_capture(&self) -> bool {
        self.capture_held
    }

    pub fn holds_playback(&self) -> bool {
        self.playback_held
    }

    /// Probe a capability, reporting it once if unavailable
    pub fn supports(&mut self, capability: Capability) -> bool {
        let supported = match capability {
            Capability::Capture => self.capture.is_supported(),
            Capability::Playback => self.playback.is_supported(),
        };
        if !supported {
            self.report_unavailable(capability);
        }
        supported
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Process inbox events until shutdown
    pub async fn run(mut self) {
        info!("Voice controller running");
        while self.step().await {}
        info!("Voice controller stopped");
    }

    /// Wait for and handle one event. Returns false after shutdown.
    pub async fn step(&mut self) -> bool {
        match self.inbox.recv().await {
            Some(event) => self.dispatch(event).await,
            None => false,
        }
    }

    /// Handle every event already queued, without waiting
    pub async fn process_pending(&mut self) -> bool {
        while let Ok(event) = self.inbox.try_recv() {
            if !self.dispatch(event).await {
                return false;
            }
        }
        true
    }

    async fn dispatch(&mut self, event: VoiceEvent) -> bool {
        let result = match event {
            VoiceEvent::Shutdown => {
                self.cancel().await;
                return false;
            }
            VoiceEvent::StartCapture => self.start_capture().await,
            VoiceEvent::StopCapture { keep_transcript } => {
                self.stop_capture(keep_transcript).await;
                Ok(())
            }
            VoiceEvent::Submit => self.submit().await,
            VoiceEvent::SubmitText(text) => self.submit_text(&text).await,
            VoiceEvent::StopPlayback => {
                self.stop_playback().await;
                Ok(())
            }
            VoiceEvent::Cancel => {
                self.cancel().await;
                Ok(())
            }
            VoiceEvent::Capture { generation, event } => {
                self.on_capture(generation, event).await;
                Ok(())
            }
            VoiceEvent::Playback { generation, event } => {
                self.on_playback(generation, event).await;
                Ok(())
            }
            VoiceEvent::Reply { turn, result } => {
                self.on_reply(turn, result).await;
                Ok(())
            }
            VoiceEvent::RestartCapture { generation } => {
                self.on_restart(generation).await;
                Ok(())
            }
        };

        match result {
            // Already published when they happened
            Err(VoiceError::CapabilityUnavailable(_)) | Err(VoiceError::Engine { .. }) => {}
            Err(e) => {
                debug!("Rejected voice event: {}", e);
                self.notify(VoiceNotice::Error(e));
            }
            Ok(()) => {}
        }
        true
    }

    // ------------------------------------------------------------------
    // User intents
    // ------------------------------------------------------------------

    /// Begin a fresh capture, interrupting playback if needed
    pub async fn start_capture(&mut self) -> Result<(), VoiceError> {
        if self.state.phase == TurnPhase::Submitting {
            return Err(VoiceError::InvalidTransition {
                phase: TurnPhase::Submitting.as_str(),
                action: "start capture",
            });
        }

        if !self.supports(Capability::Capture) {
            return Err(VoiceError::CapabilityUnavailable(Capability::Capture));
        }

        self.cancel_restart();
        self.release_playback().await;
        self.release_capture().await;

        self.state.transcript.clear();
        self.state.manual_stop = false;
        self.state.capture_failed = false;
        self.state.resume_capture = false;

        self.acquire_capture().await
    }

    /// Stop capture at the user's request; suppresses any auto-restart
    pub async fn stop_capture(&mut self, keep_transcript: bool) {
        self.state.manual_stop = true;
        self.state.resume_capture = false;
        self.cancel_restart();
        self.release_capture().await;

        if !keep_transcript {
            self.state.transcript.clear();
        }

        if self.state.phase == TurnPhase::Listening {
            self.set_phase(TurnPhase::Idle);
        }
    }

    /// Submit the current transcript
    pub async fn submit(&mut self) -> Result<(), VoiceError> {
        let transcript = self.state.transcript.clone();
        self.submit_text(&transcript).await
    }

    /// Submit text (spoken or typed) to the reply endpoint
    pub async fn submit_text(&mut self, text: &str) -> Result<(), VoiceError> {
        if self.state.phase == TurnPhase::Submitting {
            return Err(VoiceError::InvalidTransition {
                phase: TurnPhase::Submitting.as_str(),
                action: "submit",
            });
        }

        let query = normalize_input(text).ok_or(VoiceError::EmptyTranscript)?;

        // Capture that was live (or about to restart) comes back after the reply
        // Talking over a spoken reply keeps the pending resume
        let was_capturing = self.capture_held
            || self.restart_task.is_some()
            || (self.state.phase == TurnPhase::Speaking && self.state.resume_capture);
        self.state.resume_capture = was_capturing && !self.state.manual_stop;

        self.cancel_restart();
        self.release_capture().await;
        self.release_playback().await;

        self.turn += 1;
        let turn = self.turn;
        let replies = Arc::clone(&self.replies);
        let tx = self.sender.clone();
        let limit = self.config.reply_timeout;
        let request = query.clone();

        self.reply_task = Some(tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, replies.reply(&request)).await {
                Ok(result) => result,
                Err(_) => Err(ReplyError::Timeout(limit)),
            };
            let _ = tx.send(VoiceEvent::Reply { turn, result });
        }));

        info!("Submitted turn {} ({} chars)", turn, query.chars().count());

        self.set_phase(TurnPhase::Submitting);
        self.notify(VoiceNotice::Submitted(query));
        Ok(())
    }

    /// Cut spoken playback short
    pub async fn stop_playback(&mut self) {
        if !self.playback_held {
            return;
        }

        self.state.resume_capture = false;
        self.release_playback().await;
        self.set_phase(TurnPhase::Idle);
    }

    /// Release every resource and return to idle. No-op when already idle.
    pub async fn cancel(&mut self) {
        let busy = self.state.phase != TurnPhase::Idle
            || self.capture_held
            || self.playback_held
            || self.restart_task.is_some()
            || self.reply_task.is_some();
        if !busy {
            return;
        }

        info!("Cancelling voice turn ({})", self.state.phase);

        self.state.manual_stop = true;
        self.state.resume_capture = false;
        self.cancel_restart();

        if let Some(task) = self.reply_task.take() {
            task.abort();
        }
        // Any reply still in flight belongs to an abandoned turn
        self.turn += 1;

        self.release_capture().await;
        self.release_playback().await;
        self.set_phase(TurnPhase::Idle);
    }

    // ------------------------------------------------------------------
    // Engine and task events
    // ------------------------------------------------------------------

    async fn on_capture(&mut self, generation: u64, event: CaptureEvent) {
        if generation != self.capture_generation || !self.capture_held {
            debug!("Dropping stale capture event {:?}", event);
            return;
        }

        match event {
            CaptureEvent::Interim(text) => {
                self.state.transcript = text.clone();
                self.notify(VoiceNotice::Transcript {
                    text,
                    is_final: false,
                });
            }
            CaptureEvent::Final(text) => {
                self.state.transcript = text.clone();
                self.notify(VoiceNotice::Transcript {
                    text,
                    is_final: true,
                });

                if self.config.auto_submit {
                    if let Err(e) = self.submit().await {
                        debug!("Final transcript not submitted: {}", e);
                    }
                }
            }
            CaptureEvent::Ended => {
                // The engine already let go of the resource
                self.capture_held = false;
                self.capture_generation += 1;
                self.state.capture = CaptureState::Stopped;
                self.set_phase(TurnPhase::Idle);

                if self.state.may_auto_restart() {
                    debug!("Capture ended by engine; scheduling restart");
                    self.schedule_restart();
                }
            }
            CaptureEvent::Error(message) => {
                self.fail_capture(message).await;
            }
        }
    }

    async fn on_playback(&mut self, generation: u64, event: PlaybackEvent) {
        if generation != self.playback_generation || !self.playback_held {
            debug!("Dropping stale playback event {:?}", event);
            return;
        }

        self.playback_held = false;
        self.playback_generation += 1;
        self.state.playback = PlaybackState::Idle;

        match event {
            PlaybackEvent::Ended => {
                self.set_phase(TurnPhase::Idle);
                self.resume_after_reply();
            }
            PlaybackEvent::Error(message) => {
                error!("Playback error: {}", message);
                self.state.resume_capture = false;
                self.set_phase(TurnPhase::Idle);
                self.notify(VoiceNotice::Error(VoiceError::Engine {
                    capability: Capability::Playback,
                    message,
                }));
            }
        }
    }

    async fn on_reply(&mut self, turn: u64, result: Result<String, ReplyError>) {
        if turn != self.turn || self.state.phase != TurnPhase::Submitting {
            debug!("Dropping reply for abandoned turn {}", turn);
            return;
        }
        self.reply_task = None;

        match result {
            Ok(text) => {
                self.notify(VoiceNotice::Reply(text.clone()));
                self.begin_playback(text).await;
            }
            Err(e) => {
                warn!("Reply for turn {} failed: {}", turn, e);
                self.state.resume_capture = false;
                self.notify(VoiceNotice::Reply(FALLBACK_REPLY.to_string()));
                self.notify(VoiceNotice::Error(VoiceError::RemoteReply(e)));
                self.set_phase(TurnPhase::Idle);
            }
        }
    }

    async fn on_restart(&mut self, generation: u64) {
        if generation != self.capture_generation {
            debug!("Dropping superseded capture restart");
            return;
        }
        self.restart_task = None;

        if self.state.phase != TurnPhase::Idle || self.capture_held || !self.state.may_auto_restart() {
            debug!("Capture restart suppressed");
            return;
        }

        info!("Restarting capture");
        // Failures are reported by acquire_capture
        let _ = self.acquire_capture().await;
    }

    // ------------------------------------------------------------------
    // Resource handling
    // ------------------------------------------------------------------

    async fn acquire_capture(&mut self) -> Result<(), VoiceError> {
        self.capture_generation += 1;
        let sink = CaptureSink::new(self.capture_generation, self.sender.clone());

        match self.capture.start(self.config.language.recognition, sink).await {
            Ok(()) => {
                self.capture_held = true;
                self.state.capture = CaptureState::Listening;
                self.set_phase(TurnPhase::Listening);
                Ok(())
            }
            Err(e) => {
                let message = format!("{:#}", e);
                self.fail_capture(message.clone()).await;
                Err(VoiceError::Engine {
                    capability: Capability::Capture,
                    message,
                })
            }
        }
    }

    /// Stop the turn after a capture failure; no automatic retry
    async fn fail_capture(&mut self, message: String) {
        error!("Capture error: {}", message);

        self.state.manual_stop = true;
        self.state.capture_failed = true;
        self.state.resume_capture = false;
        self.cancel_restart();
        self.release_capture().await;
        self.state.capture = CaptureState::Stopped;
        self.set_phase(TurnPhase::Idle);

        self.notify(VoiceNotice::Error(VoiceError::Engine {
            capability: Capability::Capture,
            message,
        }));
    }

    async fn release_capture(&mut self) {
        if !self.capture_held {
            return;
        }

        self.capture_held = false;
        self.capture_generation += 1;
        if let Err(e) = self.capture.stop().await {
            warn!("Failed to stop {} capture: {}", self.capture.name(), e);
        }
        self.state.capture = CaptureState::Stopped;
    }

    async fn begin_playback(&mut self, text: String) {
        if !self.supports(Capability::Playback) {
            // Text-only: the reply has already been published
            self.set_phase(TurnPhase::Idle);
            self.resume_after_reply();
            return;
        }

        self.cancel_restart();
        self.release_capture().await;
        self.release_playback().await;

        self.playback_generation += 1;
        let sink = PlaybackSink::new(self.playback_generation, self.sender.clone());

        match self
            .playback
            .speak(&text, self.config.language.synthesis, sink)
            .await
        {
            Ok(()) => {
                self.playback_held = true;
                self.state.playback = PlaybackState::Speaking;
                self.set_phase(TurnPhase::Speaking);
            }
            Err(e) => {
                let message = format!("{:#}", e);
                error!("Playback error: {}", message);
                self.state.resume_capture = false;
                self.set_phase(TurnPhase::Idle);
                self.notify(VoiceNotice::Error(VoiceError::Engine {
                    capability: Capability::Playback,
                    message,
                }));
            }
        }
    }

    async fn release_playback(&mut self) {
        if !self.playback_held {
            return;
        }

        self.playback_held = false;
        self.playback_generation += 1;
        if let Err(e) = self.playback.stop().await {
            warn!("Failed to stop {} playback: {}", self.playback.name(), e);
        }
        self.state.playback = PlaybackState::Idle;
    }

    fn resume_after_reply(&mut self) {
        let resume = std::mem::take(&mut self.state.resume_capture);
        if resume && self.state.may_auto_restart() {
            debug!("Resuming capture after reply");
            self.schedule_restart();
        }
    }

    fn schedule_restart(&mut self) {
        self.cancel_restart();

        let generation = self.capture_generation;
        let delay = self.config.restart_delay;
        let tx = self.sender.clone();

        self.restart_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(VoiceEvent::RestartCapture { generation });
        }));
    }

    fn cancel_restart(&mut self) {
        if let Some(task) = self.restart_task.take() {
            task.abort();
        }
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    fn set_phase(&mut self, phase: TurnPhase) {
        debug_assert!(self.state.is_exclusive(), "capture and playback overlap");

        if self.state.phase == phase {
            return;
        }
        debug!("Voice phase {} -> {}", self.state.phase, phase);
        self.state.phase = phase;
        self.notify(VoiceNotice::PhaseChanged(phase));
    }

    fn report_unavailable(&mut self, capability: Capability) {
        if self.reported.insert(capability) {
            warn!("{} unavailable; continuing text-only", capability);
            self.notify(VoiceNotice::Error(VoiceError::CapabilityUnavailable(capability)));
        }
    }

    fn notify(&self, notice: VoiceNotice) {
        // Nobody listening is fine
        let _ = self.notices.send(notice);
    }
}

impl Drop for VoiceTurnController {
    fn drop(&mut self) {
        if let Some(task) = self.restart_task.take() {
            task.abort();
        }
        if let Some(task) = self.reply_task.take() {
            task.abort();
        }
    }
}
