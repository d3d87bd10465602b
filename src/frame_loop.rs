//! The per-frame render task.
//!
//! One [`FrameLoop`] exists per page. It keeps at most one animation-frame
//! request outstanding; every mode switch cancels that request before issuing
//! a new one, so only one mode ever draws in a given frame.

use std::cell::{Cell, RefCell, RefMut};
use std::rc::Rc;

use log::{debug, error, info, warn};

use crate::error::{FrameError, RenderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Audio-reactive bars.
    Active,
    /// Synthetic ambient wave.
    Idle,
}

/// Identifier of an outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Source of animation frames. A request must eventually call
/// [`FrameLoop::tick`] once unless cancelled first.
pub trait FrameScheduler {
    fn request(&self) -> Result<FrameHandle, FrameError>;
    fn cancel(&self, handle: FrameHandle);
}

pub trait FramePainter {
    fn paint(&mut self, mode: RenderMode, now_ms: f64) -> Result<(), RenderError>;
}

/// The controller's handle on whichever loop draws the visualizer.
pub trait ModeSwitch {
    fn switch_to(&self, mode: RenderMode);
    /// Stop drawing altogether.
    fn halt(&self);
    fn mode(&self) -> Option<RenderMode>;
}

impl<T: ModeSwitch + ?Sized> ModeSwitch for Rc<T> {
    fn switch_to(&self, mode: RenderMode) {
        (**self).switch_to(mode)
    }

    fn halt(&self) {
        (**self).halt()
    }

    fn mode(&self) -> Option<RenderMode> {
        (**self).mode()
    }
}

pub struct FrameLoop<S, P> {
    scheduler: S,
    painter: RefCell<P>,
    mode: Cell<Option<RenderMode>>,
    pending: Cell<Option<FrameHandle>>,
    // set while frames keep failing so the log is not flooded
    failing: Cell<bool>,
}

impl<S: FrameScheduler, P: FramePainter> FrameLoop<S, P> {
    pub fn new(scheduler: S, painter: P) -> Self {
        Self {
            scheduler,
            painter: RefCell::new(painter),
            mode: Cell::new(None),
            pending: Cell::new(None),
            failing: Cell::new(false),
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn painter_mut(&self) -> RefMut<'_, P> {
        self.painter.borrow_mut()
    }

    /// The request that will run the next tick, if any.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending.get()
    }

    /// Run one frame: re-request the next one, then paint the current mode.
    pub fn tick(&self, now_ms: f64) {
        // the request that got us here has fired
        self.pending.set(None);
        let Some(mode) = self.mode.get() else {
            return;
        };
        self.schedule(mode);

        let result = match self.painter.try_borrow_mut() {
            Ok(mut painter) => painter.paint(mode, now_ms),
            Err(_) => {
                warn!("painter already borrowed, skipping {mode:?} frame");
                return;
            }
        };
        match result {
            Ok(()) => {
                if self.failing.replace(false) {
                    info!("{mode:?} frames recovered");
                }
            }
            Err(err) => {
                if !self.failing.replace(true) {
                    error!("{mode:?} frame failed: {err}");
                }
            }
        }
    }

    fn schedule(&self, mode: RenderMode) {
        match self.scheduler.request() {
            Ok(handle) => self.pending.set(Some(handle)),
            Err(err) => {
                self.pending.set(None);
                error!("{err}; {mode:?} rendering stopped");
            }
        }
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl<S: FrameScheduler, P: FramePainter> ModeSwitch for FrameLoop<S, P> {
    fn switch_to(&self, mode: RenderMode) {
        self.cancel_pending();
        self.mode.set(Some(mode));
        self.failing.set(false);
        self.schedule(mode);
        debug!("render mode -> {mode:?}");
    }

    fn halt(&self) {
        self.cancel_pending();
        self.mode.set(None);
        debug!("render loop halted");
    }

    fn mode(&self) -> Option<RenderMode> {
        self.mode.get()
    }
}
