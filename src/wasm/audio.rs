use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::Promise;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AnalyserNode, AudioContext, AudioContextState, DomException, HtmlMediaElement, MediaElementAudioSourceNode};

use crate::audio::{AudioBackend, AudioPipeline, MediaElement};
use crate::config::AnalyserSettings;
use crate::error::AudioError;

/// A rejected promise or thrown value. Browsers report autoplay refusals as
/// `NotAllowedError`.
impl From<JsValue> for AudioError {
    fn from(value: JsValue) -> Self {
        match value.dyn_ref::<DomException>() {
            Some(exc) if exc.name() == "NotAllowedError" => AudioError::PolicyRejection(exc.message()),
            Some(exc) => AudioError::Media(format!("{}: {}", exc.name(), exc.message())),
            None => AudioError::Media(format!("{value:?}")),
        }
    }
}

fn settle(promise: Result<Promise, JsValue>) -> LocalBoxFuture<'static, Result<(), AudioError>> {
    async move {
        let promise = promise.map_err(AudioError::from)?;
        JsFuture::from(promise).await.map_err(AudioError::from)?;
        Ok(())
    }
    .boxed_local()
}

pub struct WebMedia(HtmlMediaElement);

impl WebMedia {
    pub fn new(element: HtmlMediaElement) -> Self {
        Self(element)
    }
}

impl MediaElement for WebMedia {
    fn position(&self) -> f64 {
        self.0.current_time()
    }

    fn seek(&self, seconds: f64) {
        self.0.set_current_time(seconds);
    }

    fn play(&self) -> LocalBoxFuture<'_, Result<(), AudioError>> {
        settle(self.0.play())
    }

    fn pause(&self) -> Result<(), AudioError> {
        self.0.pause().map_err(AudioError::from)
    }
}

pub struct WebAudioBackend {
    media: HtmlMediaElement,
}

impl WebAudioBackend {
    pub fn new(media: HtmlMediaElement) -> Self {
        Self { media }
    }
}

impl AudioBackend for WebAudioBackend {
    type Pipeline = WebAudioPipeline;

    fn connect(&self, settings: &AnalyserSettings) -> Result<WebAudioPipeline, AudioError> {
        let unavailable = |value: JsValue| AudioError::PipelineUnavailable(format!("{value:?}"));

        let context = AudioContext::new().map_err(unavailable)?;
        let analyser = context.create_analyser().map_err(unavailable)?;
        let source = context
            .create_media_element_source(&self.media)
            .map_err(unavailable)?;
        source.connect_with_audio_node(&analyser).map_err(unavailable)?;
        analyser
            .connect_with_audio_node(&context.destination())
            .map_err(unavailable)?;

        analyser.set_fft_size(settings.fft_size);
        analyser.set_smoothing_time_constant(settings.smoothing);
        analyser.set_min_decibels(settings.min_decibels);
        analyser.set_max_decibels(settings.max_decibels);

        Ok(WebAudioPipeline {
            context,
            analyser,
            _source: source,
        })
    }
}

pub struct WebAudioPipeline {
    context: AudioContext,
    analyser: AnalyserNode,
    _source: MediaElementAudioSourceNode,
}

impl AudioPipeline for WebAudioPipeline {
    fn is_suspended(&self) -> bool {
        self.context.state() == AudioContextState::Suspended
    }

    fn resume(&self) -> LocalBoxFuture<'_, Result<(), AudioError>> {
        settle(self.context.resume())
    }

    fn bin_count(&self) -> usize {
        self.analyser.frequency_bin_count() as usize
    }

    fn frequency_data(&self, out: &mut [u8]) {
        self.analyser.get_byte_frequency_data(out);
    }
}
