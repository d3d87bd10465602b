//! Fakes shared by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use greeting_visualizer::config::AnalyserSettings;
use greeting_visualizer::palette::{ColorStop, Rgba};
use greeting_visualizer::{
    AudioBackend, AudioError, AudioPipeline, FrameError, FrameHandle, FrameLoop, FramePainter, FrameScheduler,
    MediaElement, Paint, PipelineSlot, PlaybackController, Rect, RenderConfig, RenderError, RenderMode, Surface,
};

// ==================== Surface ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Rgba),
    Linear {
        from: (f64, f64),
        to: (f64, f64),
        stops: Vec<ColorStop>,
    },
    Radial {
        center: (f64, f64),
        radius: f64,
        stops: Vec<ColorStop>,
    },
}

impl From<&Paint<'_>> for Fill {
    fn from(paint: &Paint<'_>) -> Self {
        match *paint {
            Paint::Solid(color) => Fill::Solid(color),
            Paint::Linear { from, to, stops } => Fill::Linear {
                from,
                to,
                stops: stops.to_vec(),
            },
            Paint::Radial { center, radius, stops } => Fill::Radial {
                center,
                radius,
                stops: stops.to_vec(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Rect(Rect, Fill),
    RoundedRect(Rect, f64, Fill),
    Shadow(f64, Rgba),
}

/// Records every drawing call instead of painting.
pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<Op>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn bars(&self) -> Vec<(Rect, Fill)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::RoundedRect(rect, _, fill) => Some((*rect, fill.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn rects(&self) -> Vec<(Rect, Fill)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Rect(rect, fill) => Some((*rect, fill.clone())),
                _ => None,
            })
            .collect()
    }

    /// Shadows set with a non-zero blur.
    pub fn glows(&self) -> Vec<(f64, Rgba)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Shadow(blur, color) if *blur > 0.0 => Some((*blur, *color)),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint<'_>) -> Result<(), RenderError> {
        self.ops.push(Op::Rect(rect, paint.into()));
        Ok(())
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, paint: &Paint<'_>) -> Result<(), RenderError> {
        self.ops.push(Op::RoundedRect(rect, radius, paint.into()));
        Ok(())
    }

    fn set_shadow(&mut self, blur: f64, color: Rgba) {
        self.ops.push(Op::Shadow(blur, color));
    }
}

// ==================== Frames ====================

/// Hands out frame handles and remembers which are still outstanding.
#[derive(Default)]
pub struct FakeScheduler {
    next: Cell<i32>,
    live: RefCell<Vec<FrameHandle>>,
    pub cancelled: RefCell<Vec<FrameHandle>>,
    pub failing: Cell<bool>,
}

impl FakeScheduler {
    pub fn live(&self) -> Vec<FrameHandle> {
        self.live.borrow().clone()
    }
}

impl FrameScheduler for FakeScheduler {
    fn request(&self) -> Result<FrameHandle, FrameError> {
        if self.failing.get() {
            return Err(FrameError("no display".into()));
        }
        let handle = FrameHandle(self.next.get());
        self.next.set(self.next.get() + 1);
        self.live.borrow_mut().push(handle);
        Ok(handle)
    }

    fn cancel(&self, handle: FrameHandle) {
        self.live.borrow_mut().retain(|h| *h != handle);
        self.cancelled.borrow_mut().push(handle);
    }
}

/// Fire every outstanding request once, as the next display refresh would.
/// Returns how many ticks ran.
pub fn fire<P: FramePainter>(frames: &FrameLoop<FakeScheduler, P>, now_ms: f64) -> usize {
    let due: Vec<FrameHandle> = frames.scheduler().live.borrow_mut().drain(..).collect();
    for _ in &due {
        frames.tick(now_ms);
    }
    due.len()
}

#[derive(Default)]
pub struct RecordingPainter {
    pub frames: Vec<(RenderMode, f64)>,
    pub fail: bool,
}

impl FramePainter for RecordingPainter {
    fn paint(&mut self, mode: RenderMode, now_ms: f64) -> Result<(), RenderError> {
        self.frames.push((mode, now_ms));
        if self.fail {
            Err(RenderError::MissingSample)
        } else {
            Ok(())
        }
    }
}

pub type TestLoop = FrameLoop<FakeScheduler, RecordingPainter>;

pub fn test_loop() -> TestLoop {
    FrameLoop::new(FakeScheduler::default(), RecordingPainter::default())
}

// ==================== Audio ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Resume,
    Seek(f64),
    Play,
    Pause,
}

/// State shared by the fake media element, backend and pipeline.
#[derive(Default)]
pub struct Env {
    pub calls: RefCell<Vec<Call>>,
    pub position: Cell<f64>,
    pub playing: Cell<bool>,
    pub play_error: RefCell<Option<AudioError>>,
    /// When set, the next `play()` stays pending until the sender fires.
    pub play_gate: RefCell<Option<oneshot::Receiver<()>>>,
    pub pause_error: RefCell<Option<AudioError>>,
    pub suspended: Cell<bool>,
    pub resume_error: RefCell<Option<AudioError>>,
    /// When set, the next `resume()` stays pending until the sender fires.
    pub resume_gate: RefCell<Option<oneshot::Receiver<()>>>,
    pub connect_error: RefCell<Option<AudioError>>,
    pub level: Cell<u8>,
}

impl Env {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

pub struct FakeMedia(pub Rc<Env>);

impl MediaElement for FakeMedia {
    fn position(&self) -> f64 {
        self.0.position.get()
    }

    fn seek(&self, seconds: f64) {
        self.0.record(Call::Seek(seconds));
        self.0.position.set(seconds);
    }

    fn play(&self) -> LocalBoxFuture<'_, Result<(), AudioError>> {
        self.0.record(Call::Play);
        let gate = self.0.play_gate.borrow_mut().take();
        let env = Rc::clone(&self.0);
        async move {
            if let Some(gate) = gate {
                gate.await.ok();
            }
            let outcome = env.play_error.borrow().clone();
            match outcome {
                Some(err) => Err(err),
                None => {
                    env.playing.set(true);
                    Ok(())
                }
            }
        }
        .boxed_local()
    }

    fn pause(&self) -> Result<(), AudioError> {
        self.0.record(Call::Pause);
        self.0.playing.set(false);
        match self.0.pause_error.borrow().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub struct FakeBackend(pub Rc<Env>);

impl AudioBackend for FakeBackend {
    type Pipeline = FakePipeline;

    fn connect(&self, settings: &AnalyserSettings) -> Result<FakePipeline, AudioError> {
        self.0.record(Call::Connect);
        if let Some(err) = self.0.connect_error.borrow().clone() {
            return Err(err);
        }
        Ok(FakePipeline {
            env: Rc::clone(&self.0),
            bins: settings.bin_count(),
        })
    }
}

pub struct FakePipeline {
    env: Rc<Env>,
    bins: usize,
}

impl AudioPipeline for FakePipeline {
    fn is_suspended(&self) -> bool {
        self.env.suspended.get()
    }

    fn resume(&self) -> LocalBoxFuture<'_, Result<(), AudioError>> {
        self.env.record(Call::Resume);
        let gate = self.env.resume_gate.borrow_mut().take();
        let env = Rc::clone(&self.env);
        async move {
            if let Some(gate) = gate {
                gate.await.ok();
            }
            let outcome = env.resume_error.borrow().clone();
            match outcome {
                Some(err) => Err(err),
                None => {
                    env.suspended.set(false);
                    Ok(())
                }
            }
        }
        .boxed_local()
    }

    fn bin_count(&self) -> usize {
        self.bins
    }

    fn frequency_data(&self, out: &mut [u8]) {
        out.fill(self.env.level.get());
    }
}

pub type TestController = PlaybackController<FakeMedia, FakeBackend, TestLoop>;

pub fn controller(config: &RenderConfig) -> (TestController, Rc<Env>) {
    controller_with_slot(config, PipelineSlot::new())
}

pub fn controller_with_slot(config: &RenderConfig, slot: PipelineSlot<FakePipeline>) -> (TestController, Rc<Env>) {
    let env = Rc::new(Env::default());
    let controller = PlaybackController::new(
        FakeMedia(Rc::clone(&env)),
        FakeBackend(Rc::clone(&env)),
        test_loop(),
        config,
        slot,
    );
    (controller, env)
}

/// The policy rejection browsers give for autoplay without a gesture.
pub fn not_allowed() -> AudioError {
    AudioError::PolicyRejection("play() failed because the user didn't interact with the document first".into())
}
