//! Seams to the media element and the audio-capture pipeline.
//!
//! The browser implementations live in the `wasm` module; tests supply fakes.

use std::cell::OnceCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::config::AnalyserSettings;
use crate::error::AudioError;

/// The element that plays the background track.
pub trait MediaElement {
    /// Current playback position in seconds.
    fn position(&self) -> f64;

    fn seek(&self, seconds: f64);

    /// Start playback. Resolves once the environment has accepted the request.
    fn play(&self) -> LocalBoxFuture<'_, Result<(), AudioError>>;

    fn pause(&self) -> Result<(), AudioError>;
}

/// Builds the capture pipeline (device context plus analysis node) for the
/// media element.
pub trait AudioBackend {
    type Pipeline: AudioPipeline;

    fn connect(&self, settings: &AnalyserSettings) -> Result<Self::Pipeline, AudioError>;
}

/// A live capture pipeline.
pub trait AudioPipeline {
    /// Whether the output device is suspended (e.g. by autoplay policy or
    /// because the page was backgrounded).
    fn is_suspended(&self) -> bool;

    fn resume(&self) -> LocalBoxFuture<'_, Result<(), AudioError>>;

    /// Number of values in one frequency sample.
    fn bin_count(&self) -> usize;

    /// Overwrite `out` with the current frequency magnitudes.
    fn frequency_data(&self, out: &mut [u8]);
}

/// Single-assignment holder for the pipeline, shared between the controller
/// that builds it and the painter that samples it every frame.
pub struct PipelineSlot<P>(Rc<OnceCell<P>>);

impl<P> PipelineSlot<P> {
    pub fn new() -> Self {
        Self(Rc::new(OnceCell::new()))
    }

    pub fn get(&self) -> Option<&P> {
        self.0.get()
    }

    pub fn is_filled(&self) -> bool {
        self.0.get().is_some()
    }

    /// Store the pipeline. Returns it back if the slot was already filled.
    pub(crate) fn fill(&self, pipeline: P) -> Result<(), P> {
        self.0.set(pipeline)
    }
}

impl<P: AudioPipeline> PipelineSlot<P> {
    /// Copy the current sample into `buf`, resizing it to the bin count.
    /// Returns `false` when no pipeline exists yet.
    pub fn sample_into(&self, buf: &mut Vec<u8>) -> bool {
        let Some(pipeline) = self.get() else {
            return false;
        };
        buf.resize(pipeline.bin_count(), 0);
        pipeline.frequency_data(buf);
        true
    }
}

impl<P> Clone for PipelineSlot<P> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<P> Default for PipelineSlot<P> {
    fn default() -> Self {
        Self::new()
    }
}
