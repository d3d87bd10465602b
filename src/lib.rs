//! Audio-reactive bar visualizer and playback controller for the greeting page.
//!
//! Everything outside the `wasm` module is target-independent and runs under
//! host tests. The `wasm` module binds it to the page: canvas, `<audio>`
//! element, Web Audio analyser and `requestAnimationFrame`.

#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

pub mod audio;
pub mod bars;
pub mod config;
pub mod error;
pub mod frame_loop;
pub mod palette;
pub mod playback;
pub mod renderer;
pub mod surface;
pub mod wave;

pub use audio::{AudioBackend, AudioPipeline, MediaElement, PipelineSlot};
pub use bars::{Band, Bar, EnergyTier};
pub use config::{ConfigOverrides, DeviceClass, DeviceProbe, RenderConfig};
pub use error::{AudioError, ConfigError, FrameError, RenderError};
pub use frame_loop::{FrameHandle, FrameLoop, FramePainter, FrameScheduler, ModeSwitch, RenderMode};
pub use playback::{AutoplayTrigger, PlaybackController, PlaybackState, START_OFFSET_SECS};
pub use renderer::{VisualizerPainter, VisualizerRenderer};
pub use surface::{Paint, Rect, Surface};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;

    pub(crate) mod audio;
    pub(crate) mod page;
    pub(crate) mod render;

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let config = page::resolve_config(&window, &document);
        match serde_json::to_string(&config) {
            Ok(json) => log::info!("visualizer config: {json}"),
            Err(err) => log::warn!("could not serialise config: {err}"),
        }

        let canvas = document
            .get_element_by_id(page::CANVAS_ID)
            .ok_or("canvas not found")?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;
        let media = document
            .get_element_by_id(page::AUDIO_ID)
            .ok_or("audio element not found")?
            .dyn_into::<web_sys::HtmlMediaElement>()?;

        let slot = crate::PipelineSlot::new();
        let frames = render::start(canvas, &config, slot.clone())?;
        let controller: Rc<page::WebController> = Rc::new(crate::PlaybackController::new(
            audio::WebMedia::new(media.clone()),
            audio::WebAudioBackend::new(media),
            frames,
            &config,
            slot,
        ));
        page::wire(&window, &document, &controller)?;

        controller.set_mode(crate::RenderMode::Idle);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::page::{resolve_config, wire, AUDIO_ID, CANVAS_ID, CONFIG_ID, TOGGLE_ID};
#[cfg(target_arch = "wasm32")]
pub use wasm::render::CanvasSurface;
