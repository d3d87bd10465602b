use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::warn;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement};

use super::audio::WebAudioPipeline;
use crate::config::RenderConfig;
use crate::error::{FrameError, RenderError};
use crate::frame_loop::{FrameHandle, FrameLoop, FrameScheduler};
use crate::palette::{ColorStop, Rgba};
use crate::renderer::{VisualizerPainter, VisualizerRenderer};
use crate::surface::{Paint, Rect, Surface};
use crate::PipelineSlot;

pub type WebFrameLoop = FrameLoop<RafScheduler, VisualizerPainter<CanvasSurface, WebAudioPipeline>>;

fn canvas_error(op: &'static str) -> impl Fn(JsValue) -> RenderError {
    move |value| RenderError::Surface {
        op,
        detail: format!("{value:?}"),
    }
}

/// A 2D canvas addressed in CSS pixels; the backing store is scaled by the
/// configured pixel ratio.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pixel_ratio: f64,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, pixel_ratio: f64) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("2D canvas not supported")?
            .dyn_into()?;
        let mut surface = Self {
            canvas,
            ctx,
            pixel_ratio,
            width: 0.0,
            height: 0.0,
        };
        surface.resize()?;
        Ok(surface)
    }

    /// Match the backing store to the element's on-screen box.
    pub fn resize(&mut self) -> Result<(), JsValue> {
        let rect = self.canvas.get_bounding_client_rect();
        self.width = rect.width();
        self.height = rect.height();
        self.canvas.set_width((self.width * self.pixel_ratio).round() as u32);
        self.canvas.set_height((self.height * self.pixel_ratio).round() as u32);
        // resizing resets the transform, so scale from identity again
        self.ctx
            .set_transform(self.pixel_ratio, 0.0, 0.0, self.pixel_ratio, 0.0, 0.0)
    }

    fn add_stops(gradient: &CanvasGradient, stops: &[ColorStop]) -> Result<(), RenderError> {
        for stop in stops {
            gradient
                .add_color_stop(stop.offset as f32, &stop.color.to_string())
                .map_err(canvas_error("addColorStop"))?;
        }
        Ok(())
    }

    fn apply_fill(&self, paint: &Paint<'_>) -> Result<(), RenderError> {
        match *paint {
            Paint::Solid(color) => self.ctx.set_fill_style_str(&color.to_string()),
            Paint::Linear { from, to, stops } => {
                let gradient = self.ctx.create_linear_gradient(from.0, from.1, to.0, to.1);
                Self::add_stops(&gradient, stops)?;
                self.ctx.set_fill_style_canvas_gradient(&gradient);
            }
            Paint::Radial {
                center,
                radius,
                stops,
            } => {
                let gradient = self
                    .ctx
                    .create_radial_gradient(center.0, center.1, 0.0, center.0, center.1, radius)
                    .map_err(canvas_error("createRadialGradient"))?;
                Self::add_stops(&gradient, stops)?;
                self.ctx.set_fill_style_canvas_gradient(&gradient);
            }
        }
        Ok(())
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint<'_>) -> Result<(), RenderError> {
        self.apply_fill(paint)?;
        self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, paint: &Paint<'_>) -> Result<(), RenderError> {
        self.apply_fill(paint)?;
        let Rect { x, y, width, height } = rect;
        let r = radius.min(width / 2.0).min(height).max(0.0);
        let arc = canvas_error("arcTo");

        self.ctx.begin_path();
        self.ctx.move_to(x, y + height);
        self.ctx.line_to(x, y + r);
        self.ctx.arc_to(x, y, x + r, y, r).map_err(&arc)?;
        self.ctx.line_to(x + width - r, y);
        self.ctx.arc_to(x + width, y, x + width, y + r, r).map_err(&arc)?;
        self.ctx.line_to(x + width, y + height);
        self.ctx.close_path();
        self.ctx.fill();
        Ok(())
    }

    fn set_shadow(&mut self, blur: f64, color: Rgba) {
        self.ctx.set_shadow_blur(blur);
        self.ctx.set_shadow_color(&color.to_string());
    }
}

/// `requestAnimationFrame` driving a single shared tick closure.
#[derive(Default)]
pub struct RafScheduler {
    // installed after the loop exists, since the closure points back at it
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl RafScheduler {
    fn install(&self, callback: Closure<dyn FnMut(f64)>) {
        *self.callback.borrow_mut() = Some(callback);
    }
}

impl FrameScheduler for RafScheduler {
    fn request(&self) -> Result<FrameHandle, FrameError> {
        let callback = self.callback.borrow();
        let callback = callback
            .as_ref()
            .ok_or_else(|| FrameError("frame callback not installed".into()))?;
        let window = window().ok_or_else(|| FrameError("no window".into()))?;
        window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map(FrameHandle)
            .map_err(|err| FrameError(format!("{err:?}")))
    }

    fn cancel(&self, handle: FrameHandle) {
        let Some(window) = window() else {
            return;
        };
        if let Err(err) = window.cancel_animation_frame(handle.0) {
            warn!("cancelAnimationFrame({}) failed: {err:?}", handle.0);
        }
    }
}

/// Build the frame loop for `canvas`. Nothing is drawn until a mode is set.
pub fn start(
    canvas: HtmlCanvasElement,
    config: &RenderConfig,
    pipeline: PipelineSlot<WebAudioPipeline>,
) -> Result<Rc<WebFrameLoop>, JsValue> {
    let surface = CanvasSurface::new(canvas, config.pixel_ratio)?;
    let painter = VisualizerPainter::new(VisualizerRenderer::new(config.clone()), surface, pipeline);
    let frames = Rc::new(FrameLoop::new(RafScheduler::default(), painter));

    // The closure holds only a weak handle so the loop can still be dropped.
    let weak: Weak<WebFrameLoop> = Rc::downgrade(&frames);
    frames.scheduler().install(Closure::wrap(Box::new(move |now: f64| {
        if let Some(frames) = weak.upgrade() {
            frames.tick(now);
        }
    }) as Box<dyn FnMut(f64)>));

    // Resize canvas to fit its box
    let resize_closure = {
        let weak = Rc::downgrade(&frames);
        Closure::wrap(Box::new(move || {
            let Some(frames) = weak.upgrade() else {
                return;
            };
            if let Err(err) = frames.painter_mut().surface_mut().resize() {
                warn!("canvas resize failed: {err:?}");
            }
        }) as Box<dyn FnMut()>)
    };
    window()
        .ok_or("no window")?
        .add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref())?;
    resize_closure.forget();

    Ok(frames)
}
