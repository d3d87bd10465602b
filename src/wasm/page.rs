//! Page wiring: element ids, device probe, and DOM event listeners.

use std::rc::Rc;

use log::{info, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{AddEventListenerOptions, Document, Element, Event, EventTarget, Node, VisibilityState, Window};

use super::audio::{WebAudioBackend, WebMedia};
use super::render::WebFrameLoop;
use crate::audio::{AudioBackend, MediaElement};
use crate::config::{ConfigOverrides, DeviceProbe, RenderConfig};
use crate::frame_loop::ModeSwitch;
use crate::playback::{AutoplayTrigger, PlaybackController, PlaybackState};

pub const CANVAS_ID: &str = "visualizer-canvas";
pub const AUDIO_ID: &str = "background-music";
pub const TOGGLE_ID: &str = "audio-toggle";
pub const CONFIG_ID: &str = "visualizer-config";

const PLAYING_CLASS: &str = "playing";
const AUTOPLAY_DELAY_MS: i32 = 500;
const INTERACTION_EVENTS: [&str; 3] = ["pointerdown", "touchstart", "keydown"];

pub type WebController = PlaybackController<WebMedia, WebAudioBackend, Rc<WebFrameLoop>>;

pub fn resolve_config(window: &Window, document: &Document) -> RenderConfig {
    let probe = DeviceProbe {
        user_agent: window.navigator().user_agent().unwrap_or_default(),
        viewport_width: window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(f64::INFINITY),
        device_pixel_ratio: window.device_pixel_ratio(),
    };
    let config = RenderConfig::resolve(&probe);
    info!("device class: {:?}", config.device);

    let Some(text) = document
        .get_element_by_id(CONFIG_ID)
        .and_then(|el| el.text_content())
    else {
        return config;
    };
    match ConfigOverrides::from_json(&text).and_then(|overrides| config.clone().with_overrides(&overrides)) {
        Ok(overridden) => overridden,
        Err(err) => {
            warn!("ignoring #{CONFIG_ID}: {err}");
            config
        }
    }
}

fn listen(target: &EventTarget, event: &str, handler: impl FnMut() + 'static) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// Removed by the browser after its first dispatch.
fn listen_once(target: &EventTarget, event: &str, handler: impl FnOnce(Event) + 'static) -> Result<(), JsValue> {
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    let callback = Closure::once_into_js(handler);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        event,
        callback.unchecked_ref(),
        &options,
    )
}

/// Whether `event` started on `toggle` or inside it.
fn from_toggle(event: &Event, toggle: Option<&Element>) -> bool {
    let (Some(toggle), Some(target)) = (toggle, event.target()) else {
        return false;
    };
    target.dyn_ref::<Node>().is_some_and(|node| toggle.contains(Some(node)))
}

fn schedule_autoplay<M, B, L>(window: &Window, controller: &Rc<PlaybackController<M, B, L>>) -> Result<(), JsValue>
where
    M: MediaElement + 'static,
    B: AudioBackend + 'static,
    B::Pipeline: 'static,
    L: ModeSwitch + 'static,
{
    let controller = Rc::clone(controller);
    let attempt = Closure::once_into_js(move || {
        spawn_local(async move { controller.try_autoplay(AutoplayTrigger::PageReady).await });
    });
    window.set_timeout_with_callback_and_timeout_and_arguments_0(attempt.unchecked_ref(), AUTOPLAY_DELAY_MS)?;
    Ok(())
}

/// Attach the controller to the toggle control, the audio element and the
/// page lifecycle events.
pub fn wire<M, B, L>(window: &Window, document: &Document, controller: &Rc<PlaybackController<M, B, L>>) -> Result<(), JsValue>
where
    M: MediaElement + 'static,
    B: AudioBackend + 'static,
    B::Pipeline: 'static,
    L: ModeSwitch + 'static,
{
    let toggle = document.get_element_by_id(TOGGLE_ID);
    match &toggle {
        Some(button) => {
            let classes = button.class_list();
            controller.on_state_change(move |state| {
                if let Err(err) = classes.toggle_with_force(PLAYING_CLASS, state == PlaybackState::Playing) {
                    warn!("could not update toggle class: {err:?}");
                }
            });
            let ctrl = Rc::clone(controller);
            listen(button, "click", move || {
                let ctrl = Rc::clone(&ctrl);
                spawn_local(async move { ctrl.toggle().await });
            })?;
        }
        None => warn!("toggle control #{TOGGLE_ID} not found"),
    }

    // presses on the toggle belong to its own click handler
    for event in INTERACTION_EVENTS {
        let ctrl = Rc::clone(controller);
        let toggle = toggle.clone();
        listen_once(document, event, move |event| {
            if from_toggle(&event, toggle.as_ref()) {
                return;
            }
            spawn_local(async move { ctrl.try_autoplay(AutoplayTrigger::Interaction).await });
        })?;
    }

    if let Some(media) = document.get_element_by_id(AUDIO_ID) {
        let ctrl = Rc::clone(controller);
        listen(&media, "ended", move || ctrl.on_ended())?;
    }

    {
        let ctrl = Rc::clone(controller);
        let doc = document.clone();
        listen(document, "visibilitychange", move || {
            let visible = doc.visibility_state() == VisibilityState::Visible;
            let ctrl = Rc::clone(&ctrl);
            spawn_local(async move { ctrl.on_visibility_change(visible).await });
        })?;
    }

    if document.ready_state() == "complete" {
        schedule_autoplay(window, controller)?;
    } else {
        let ctrl = Rc::clone(controller);
        let win = window.clone();
        listen(window, "load", move || {
            if let Err(err) = schedule_autoplay(&win, &ctrl) {
                warn!("could not schedule autoplay: {err:?}");
            }
        })?;
    }
    Ok(())
}
