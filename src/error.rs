//! Error types shared by the playback controller, renderer and frame loop.

/// Failures reported by the media element or the audio-capture pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    /// The browser refused to start playback or resume the device without a
    /// prior user gesture.
    #[error("blocked by autoplay policy: {0}")]
    PolicyRejection(String),
    /// The capture pipeline could not be constructed.
    #[error("audio pipeline unavailable: {0}")]
    PipelineUnavailable(String),
    #[error("media error: {0}")]
    Media(String),
}

impl AudioError {
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, Self::PolicyRejection(_))
    }
}

/// Errors raised while painting a frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// ACTIVE mode was painted without a frequency sample to read from.
    #[error("no frequency sample available for active frame")]
    MissingSample,
    #[error("surface operation `{op}` failed: {detail}")]
    Surface { op: &'static str, detail: String },
}

/// Errors raised when requesting the next animation frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("animation frame request failed: {0}")]
pub struct FrameError(pub String);

/// Invalid configuration overrides.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse overrides: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("bar count must be at least 1")]
    ZeroBars,
    #[error("fft size {0} must be a power of two between 32 and 32768")]
    InvalidFftSize(u32),
    #[error("smoothing constant {0} must lie in [0, 1]")]
    InvalidSmoothing(f64),
    #[error("shadow blur {0} must not be negative")]
    NegativeBlur(f64),
}
