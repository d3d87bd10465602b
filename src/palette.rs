//! Colours and gradient stops used by both render modes.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 1.0)
    }

    pub const fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }
}

/// Formats as a CSS `rgba()` colour, the form canvas APIs accept.
impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Rgba,
}

const fn stop(offset: f64, color: Rgba) -> ColorStop {
    ColorStop { offset, color }
}

const PINK: Rgba = Rgba::hex(0xec4899);

pub const HIGH_ENERGY: [ColorStop; 4] = [
    stop(0.0, Rgba::hex(0xfbbf24)),
    stop(0.3, Rgba::hex(0xf472b6)),
    stop(0.6, PINK),
    stop(1.0, Rgba::hex(0xdb2777)),
];

pub const MEDIUM_ENERGY: [ColorStop; 3] = [
    stop(0.0, Rgba::hex(0xf9a8d4)),
    stop(0.5, PINK),
    stop(1.0, Rgba::hex(0xdb2777)),
];

pub const LOW_ENERGY: [ColorStop; 3] = [
    stop(0.0, Rgba::hex(0xf472b6)),
    stop(0.5, PINK),
    stop(1.0, Rgba::hex(0xbe185d)),
];

pub const IDLE_WAVE: [ColorStop; 3] = [
    stop(0.0, Rgba::new(244, 114, 182, 0.5)),
    stop(0.5, Rgba::new(236, 72, 153, 0.4)),
    stop(1.0, Rgba::new(219, 39, 119, 0.5)),
];

pub const REFLECTION: [ColorStop; 2] = [
    stop(0.0, PINK.with_alpha(0.3)),
    stop(1.0, PINK.with_alpha(0.0)),
];

pub const ACTIVE_AMBIENT: [ColorStop; 2] = [
    stop(0.0, PINK.with_alpha(0.1)),
    stop(1.0, PINK.with_alpha(0.0)),
];

pub const IDLE_AMBIENT: [ColorStop; 2] = [
    stop(0.0, PINK.with_alpha(0.08)),
    stop(1.0, PINK.with_alpha(0.0)),
];

pub const GLOW_STRONG: Rgba = PINK.with_alpha(0.8);
pub const GLOW_SOFT: Rgba = PINK.with_alpha(0.4);
pub const GLOW_IDLE: Rgba = PINK.with_alpha(0.3);

/// Opaque clear used by ACTIVE frames.
pub const CLEAR_OPAQUE: Rgba = Rgba::new(0, 0, 0, 1.0);
/// Translucent clear used by IDLE frames so motion leaves a short trail.
pub const CLEAR_TRAIL: Rgba = Rgba::new(0, 0, 0, 0.15);
