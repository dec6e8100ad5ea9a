use anyhow::Result;

use super::event::{CaptureSink, PlaybackSink};

/// Speech recognition engine trait
///
/// Implementations wrap whatever the runtime provides (browser speech API,
/// native recogniser, remote STT). Results are reported through the sink
/// handed to `start`; an engine holds at most one live recognition.
#[async_trait::async_trait]
pub trait CaptureEngine: Send + Sync {
    /// Probe whether recognition is available at all
    fn is_supported(&self) -> bool;

    /// Begin recognising speech in `language` (BCP 47 tag)
    async fn start(&mut self, language: &str, sink: CaptureSink) -> Result<()>;

    /// Stop the live recognition, if any
    async fn stop(&mut self) -> Result<()>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}

/// Speech synthesis engine trait
#[async_trait::async_trait]
pub trait PlaybackEngine: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Begin speaking `text`; completion is reported through the sink
    async fn speak(&mut self, text: &str, language: &str, sink: PlaybackSink) -> Result<()>;

    /// Cancel speech immediately
    async fn stop(&mut self) -> Result<()>;

    fn name(&self) -> &str;
}

/// Capture engine for environments without speech recognition
#[derive(Debug, Default)]
pub struct UnsupportedCapture;

#[async_trait::async_trait]
impl CaptureEngine for UnsupportedCapture {
    fn is_supported(&self) -> bool {
        false
    }

    async fn start(&mut self, _language: &str, _sink: CaptureSink) -> Result<()> {
        anyhow::bail!("Speech recognition is not available")
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}

/// Playback engine for environments without speech synthesis
#[derive(Debug, Default)]
pub struct UnsupportedPlayback;

#[async_trait::async_trait]
impl PlaybackEngine for UnsupportedPlayback {
    fn is_supported(&self) -> bool {
        false
    }

    async fn speak(&mut self, _text: &str, _language: &str, _sink: PlaybackSink) -> Result<()> {
        anyhow::bail!("Speech synthesis is not available")
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}
