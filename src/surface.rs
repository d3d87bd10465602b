//! The immediate-mode 2D drawing interface the renderer paints onto.

use crate::error::RenderError;
use crate::palette::{ColorStop, Rgba};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint<'a> {
    Solid(Rgba),
    /// Linear gradient from `from` to `to`, stops in offset order.
    Linear {
        from: (f64, f64),
        to: (f64, f64),
        stops: &'a [ColorStop],
    },
    /// Radial gradient centred at `center`, growing from radius 0 to `radius`.
    Radial {
        center: (f64, f64),
        radius: f64,
        stops: &'a [ColorStop],
    },
}

/// A drawing surface addressed in logical (device-independent) pixels.
pub trait Surface {
    /// Logical width and height.
    fn size(&self) -> (f64, f64);

    fn fill_rect(&mut self, rect: Rect, paint: &Paint<'_>) -> Result<(), RenderError>;

    /// Fill `rect` with its top two corners rounded by `radius`.
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, paint: &Paint<'_>) -> Result<(), RenderError>;

    fn set_shadow(&mut self, blur: f64, color: Rgba);

    fn clear_shadow(&mut self) {
        self.set_shadow(0.0, Rgba::TRANSPARENT);
    }

    /// Paint the whole surface with `color`.
    fn clear(&mut self, color: Rgba) -> Result<(), RenderError> {
        let (width, height) = self.size();
        self.fill_rect(Rect::new(0.0, 0.0, width, height), &Paint::Solid(color))
    }
}
