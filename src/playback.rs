//! Playback state machine.
//!
//! [`PlaybackController`] is the only writer of [`PlaybackState`] and the only
//! owner of the capture pipeline. Every state change is mirrored onto the frame
//! loop through [`ModeSwitch`], so the drawing mode always matches the state.

use std::cell::{Cell, RefCell};
use std::fmt;

use log::{debug, error, info, warn};

use crate::audio::{AudioBackend, AudioPipeline, MediaElement, PipelineSlot};
use crate::config::{AnalyserSettings, RenderConfig};
use crate::error::AudioError;
use crate::frame_loop::{ModeSwitch, RenderMode};

/// Position playback starts from whenever it begins at zero.
pub const START_OFFSET_SECS: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

impl PlaybackState {
    pub fn render_mode(self) -> RenderMode {
        match self {
            PlaybackState::Idle => RenderMode::Idle,
            PlaybackState::Playing => RenderMode::Active,
        }
    }
}

/// What prompted an automatic playback attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayTrigger {
    PageReady,
    /// First pointer, touch or key interaction with the page.
    Interaction,
}

impl fmt::Display for AutoplayTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoplayTrigger::PageReady => f.write_str("autoplay(load)"),
            AutoplayTrigger::Interaction => f.write_str("autoplay(interaction)"),
        }
    }
}

// Who asked for a transition. A request may take over a pending one of lower
// rank; only a gesture lets the audio device start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    PageReady,
    Interaction,
    Toggle,
}

impl Origin {
    fn has_gesture(self) -> bool {
        self != Origin::PageReady
    }
}

impl From<AutoplayTrigger> for Origin {
    fn from(trigger: AutoplayTrigger) -> Self {
        match trigger {
            AutoplayTrigger::PageReady => Origin::PageReady,
            AutoplayTrigger::Interaction => Origin::Interaction,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    id: u64,
    origin: Origin,
}

// Marks a transition as pending. Dropping it clears the mark unless a later
// request has taken the transition over.
struct InFlight<'a> {
    slot: &'a Cell<Option<Transition>>,
    id: u64,
    origin: Origin,
}

impl InFlight<'_> {
    fn is_current(&self) -> bool {
        self.slot.get().map(|t| t.id) == Some(self.id)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.is_current() {
            self.slot.set(None);
        }
    }
}

enum Step {
    Started,
    Superseded,
}

type StateListener = Box<dyn Fn(PlaybackState)>;

pub struct PlaybackController<M, B: AudioBackend, L> {
    media: M,
    backend: B,
    frames: L,
    settings: AnalyserSettings,
    resume_on_visible: bool,
    pipeline: PipelineSlot<B::Pipeline>,
    pipeline_failed: Cell<bool>,
    state: Cell<PlaybackState>,
    transition: Cell<Option<Transition>>,
    next_transition: Cell<u64>,
    torn_down: Cell<bool>,
    user_toggled: Cell<bool>,
    page_ready_fired: Cell<bool>,
    interaction_fired: Cell<bool>,
    listener: RefCell<Option<StateListener>>,
}

impl<M, B, L> PlaybackController<M, B, L>
where
    M: MediaElement,
    B: AudioBackend,
    L: ModeSwitch,
{
    /// `pipeline` is the slot the frame painter samples from; the controller
    /// fills it on [`initialize`](Self::initialize).
    pub fn new(media: M, backend: B, frames: L, config: &RenderConfig, pipeline: PipelineSlot<B::Pipeline>) -> Self {
        Self {
            media,
            backend,
            frames,
            settings: config.analyser,
            resume_on_visible: config.resume_on_visible,
            pipeline,
            pipeline_failed: Cell::new(false),
            state: Cell::new(PlaybackState::Idle),
            transition: Cell::new(None),
            next_transition: Cell::new(0),
            torn_down: Cell::new(false),
            user_toggled: Cell::new(false),
            page_ready_fired: Cell::new(false),
            interaction_fired: Cell::new(false),
            listener: RefCell::new(None),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.pipeline.is_filled()
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn frames(&self) -> &L {
        &self.frames
    }

    /// Register a callback run after every state change.
    pub fn on_state_change(&self, listener: impl Fn(PlaybackState) + 'static) {
        *self.listener.borrow_mut() = Some(Box::new(listener));
    }

    /// Build the capture pipeline. Runs at most once; a failed construction
    /// is remembered and never retried. Returns whether a pipeline exists.
    pub fn initialize(&self) -> bool {
        if self.pipeline.is_filled() {
            return true;
        }
        if self.pipeline_failed.get() {
            return false;
        }
        match self.backend.connect(&self.settings) {
            Ok(pipeline) => {
                let bins = pipeline.bin_count();
                if self.pipeline.fill(pipeline).is_err() {
                    warn!("audio pipeline slot already filled, dropping duplicate");
                }
                info!("audio pipeline ready ({bins} frequency bins)");
                true
            }
            Err(err) => {
                self.pipeline_failed.set(true);
                error!("{err}; visualizer stays idle");
                false
            }
        }
    }

    /// Switch the frame loop to `mode`.
    pub fn set_mode(&self, mode: RenderMode) {
        self.frames.switch_to(mode);
    }

    /// Copy the latest frequency sample into `buf`.
    pub fn sample_frequencies(&self, buf: &mut Vec<u8>) -> bool {
        self.pipeline.sample_into(buf)
    }

    /// Explicit play/pause from the toggle control. Takes over a pending
    /// automatic attempt, which may be stuck waiting for a gesture.
    pub async fn toggle(&self) {
        let Some(guard) = self.begin("toggle", Origin::Toggle) else {
            return;
        };
        self.user_toggled.set(true);
        match self.state.get() {
            PlaybackState::Playing => self.enter_idle("toggle"),
            PlaybackState::Idle => {
                let result = self.start_playback(&guard).await;
                self.finish("toggle", &guard, result);
            }
        }
    }

    /// Automatic playback attempt. Each trigger fires at most once, and none
    /// fire after the user has toggled or once playback is running. An
    /// interaction takes over a pending page-ready attempt.
    pub async fn try_autoplay(&self, trigger: AutoplayTrigger) {
        if self.user_toggled.get() || self.state.get() == PlaybackState::Playing {
            debug!("{trigger}: suppressed");
            return;
        }
        let origin = Origin::from(trigger);
        // a later interaction may still retry, so leave its latch untouched
        if self.transition.get().is_some_and(|current| current.origin >= origin) {
            debug!("{trigger}: ignored, transition in flight");
            return;
        }
        let latch = match trigger {
            AutoplayTrigger::PageReady => &self.page_ready_fired,
            AutoplayTrigger::Interaction => &self.interaction_fired,
        };
        if latch.replace(true) {
            debug!("{trigger}: already attempted");
            return;
        }
        let context = trigger.to_string();
        let Some(guard) = self.begin(&context, origin) else {
            return;
        };
        let result = self.start_playback(&guard).await;
        self.finish(&context, &guard, result);
    }

    /// The media source reached its end.
    pub fn on_ended(&self) {
        self.media.seek(START_OFFSET_SECS);
        self.set_state(PlaybackState::Idle);
        info!("playback ended, rewound to {START_OFFSET_SECS}s");
    }

    /// Repair a device the environment suspended while the page was hidden.
    /// Only enabled for configs that ask for it; never changes state.
    pub async fn on_visibility_change(&self, visible: bool) {
        if !self.resume_on_visible || !visible {
            return;
        }
        let Some(pipeline) = self.pipeline.get() else {
            return;
        };
        if !pipeline.is_suspended() {
            return;
        }
        match pipeline.resume().await {
            Ok(()) => info!("visibility: audio device resumed"),
            Err(err) => warn!(
                "visibility: resume failed while in {:?} mode: {err}",
                self.frames.mode()
            ),
        }
    }

    /// Stop drawing and playback. Transitions still pending are abandoned
    /// and later ones are refused.
    pub fn teardown(&self) {
        self.torn_down.set(true);
        self.transition.set(None);
        self.frames.halt();
        if self.state.get() == PlaybackState::Playing {
            if let Err(err) = self.media.pause() {
                warn!("teardown: {err}");
            }
            self.state.set(PlaybackState::Idle);
            self.notify(PlaybackState::Idle);
        }
    }

    fn begin(&self, context: &str, origin: Origin) -> Option<InFlight<'_>> {
        if self.torn_down.get() {
            debug!("{context}: ignored after teardown");
            return None;
        }
        if let Some(current) = self.transition.get() {
            if current.origin >= origin {
                debug!("{context}: ignored, transition in flight");
                return None;
            }
            info!("{context}: taking over pending {:?} attempt", current.origin);
        }
        let id = self.next_transition.get() + 1;
        self.next_transition.set(id);
        self.transition.set(Some(Transition { id, origin }));
        Some(InFlight {
            slot: &self.transition,
            id,
            origin,
        })
    }

    // Resume the device, seek if starting fresh, then play. Nothing switches
    // to ACTIVE until every step has succeeded. Without a gesture a suspended
    // device cannot start, and its resume would stay pending, so that case
    // fails straight away.
    async fn start_playback(&self, guard: &InFlight<'_>) -> Result<Step, AudioError> {
        if !self.initialize() {
            return Err(AudioError::PipelineUnavailable(
                "pipeline construction failed earlier".into(),
            ));
        }
        if let Some(pipeline) = self.pipeline.get() {
            if pipeline.is_suspended() {
                if !guard.origin.has_gesture() {
                    return Err(AudioError::PolicyRejection(
                        "audio device suspended until the user interacts".into(),
                    ));
                }
                pipeline.resume().await?;
                if !guard.is_current() {
                    return Ok(Step::Superseded);
                }
            }
        }
        if self.media.position() == 0.0 {
            self.media.seek(START_OFFSET_SECS);
        }
        self.media.play().await?;
        if !guard.is_current() {
            self.release_stale_playback();
            return Ok(Step::Superseded);
        }
        self.set_state(PlaybackState::Playing);
        Ok(Step::Started)
    }

    fn finish(&self, context: &str, guard: &InFlight<'_>, result: Result<Step, AudioError>) {
        match result {
            Ok(Step::Started) => {}
            Ok(Step::Superseded) => debug!("{context}: superseded"),
            Err(err) if guard.is_current() => self.fall_back_to_idle(context, &err),
            Err(err) => debug!("{context}: superseded attempt failed: {err}"),
        }
    }

    // A superseded play that still went through must not keep sounding once
    // the controller has settled on IDLE.
    fn release_stale_playback(&self) {
        if self.transition.get().is_none() && self.state.get() == PlaybackState::Idle {
            if let Err(err) = self.media.pause() {
                warn!("stopping superseded playback: {err}");
            }
        }
    }

    fn enter_idle(&self, context: &str) {
        if let Err(err) = self.media.pause() {
            warn!("{context}: {err}");
        }
        self.set_state(PlaybackState::Idle);
    }

    fn fall_back_to_idle(&self, context: &str, err: &AudioError) {
        if err.is_policy_rejection() {
            info!("{context}: {err}; waiting for user interaction");
        } else {
            error!("{context}: entering {:?} failed: {err}", RenderMode::Active);
        }
        self.set_state(PlaybackState::Idle);
    }

    // Mirrors the state onto the frame loop, which cancels any pending frame
    // of the other mode before scheduling.
    fn set_state(&self, state: PlaybackState) {
        if self.torn_down.get() {
            return;
        }
        let previous = self.state.replace(state);
        self.frames.switch_to(state.render_mode());
        if previous != state {
            debug!("playback {previous:?} -> {state:?}");
            self.notify(state);
        }
    }

    fn notify(&self, state: PlaybackState) {
        if let Some(listener) = self.listener.borrow().as_ref() {
            listener(state);
        }
    }
}
