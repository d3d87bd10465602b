//! Bar-chart rendering for both visualizer modes.

use crate::audio::{AudioPipeline, PipelineSlot};
use crate::bars;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::frame_loop::{FramePainter, RenderMode};
use crate::palette::{self, ColorStop};
use crate::surface::{Paint, Rect, Surface};
use crate::wave;

/// Bars above this energy get the strong glow.
pub const GLOW_THRESHOLD: f64 = 0.6;
/// Bars taller than this share of the surface get a reflection strip.
pub const REFLECTION_MIN_SHARE: f64 = 0.3;
pub const REFLECTION_HEIGHT: f64 = 8.0;

/// Draws one frame at a time. Holds no per-frame state.
#[derive(Debug, Clone)]
pub struct VisualizerRenderer {
    config: RenderConfig,
}

impl VisualizerRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Width of one bar slot and the filled width inside it.
    fn bar_geometry(&self, width: f64) -> (f64, f64) {
        let slot = width / self.config.bar_count.max(1) as f64;
        (slot, (slot - self.config.bar_gap).max(0.0))
    }

    /// ACTIVE frame: audio-reactive bars over an opaque clear.
    pub fn draw_active<S: Surface + ?Sized>(&self, surface: &mut S, sample: &[u8]) -> Result<(), RenderError> {
        let (width, height) = surface.size();
        let (slot, bar_width) = self.bar_geometry(width);

        surface.clear_shadow();
        surface.clear(palette::CLEAR_OPAQUE)?;

        for bar in bars::layout(sample, self.config.bar_count, height) {
            let x = bar.index as f64 * slot;
            let rect = Rect::new(x, height - bar.height, bar_width, bar.height);

            if self.config.shadow_blur > 0.0 {
                let glow = if bar.energy > GLOW_THRESHOLD {
                    palette::GLOW_STRONG
                } else {
                    palette::GLOW_SOFT
                };
                surface.set_shadow(self.config.shadow_blur, glow);
            }
            let fill = Paint::Linear {
                from: (0.0, rect.y),
                to: (0.0, height),
                stops: bar.tier.stops(),
            };
            surface.fill_rounded_rect(rect, self.config.corner_radius, &fill)?;
            surface.clear_shadow();

            if self.config.reflections && bar.height > height * REFLECTION_MIN_SHARE {
                let strip = Rect::new(x, height - REFLECTION_HEIGHT, bar_width, REFLECTION_HEIGHT);
                let fade = Paint::Linear {
                    from: (0.0, height),
                    to: (0.0, height - REFLECTION_HEIGHT),
                    stops: &palette::REFLECTION,
                };
                surface.fill_rect(strip, &fade)?;
            }
        }

        if self.config.ambient_glow {
            self.ambient(surface, &palette::ACTIVE_AMBIENT)?;
        }
        Ok(())
    }

    /// IDLE frame: a slow synthetic wave over a translucent clear.
    pub fn draw_idle<S: Surface + ?Sized>(&self, surface: &mut S, now_ms: f64) -> Result<(), RenderError> {
        let (width, height) = surface.size();
        let (slot, bar_width) = self.bar_geometry(width);

        surface.clear_shadow();
        surface.clear(palette::CLEAR_TRAIL)?;

        for i in 0..self.config.bar_count {
            let wave_height = wave::idle_height(i, now_ms, &self.config.wave);
            let rect = Rect::new(i as f64 * slot, height - wave_height, bar_width, wave_height);
            if self.config.idle_shadow_blur > 0.0 {
                surface.set_shadow(self.config.idle_shadow_blur, palette::GLOW_IDLE);
            }
            let fill = Paint::Linear {
                from: (0.0, rect.y),
                to: (0.0, height),
                stops: &palette::IDLE_WAVE,
            };
            surface.fill_rounded_rect(rect, self.config.corner_radius, &fill)?;
            surface.clear_shadow();
        }

        if self.config.ambient_glow {
            self.ambient(surface, &palette::IDLE_AMBIENT)?;
        }
        Ok(())
    }

    // Radial glow rising from the bottom centre.
    fn ambient<S: Surface + ?Sized>(&self, surface: &mut S, stops: &[ColorStop]) -> Result<(), RenderError> {
        let (width, height) = surface.size();
        let glow = Paint::Radial {
            center: (width / 2.0, height),
            radius: width / 2.0,
            stops,
        };
        surface.fill_rect(Rect::new(0.0, 0.0, width, height), &glow)
    }
}

/// Frame painter that feeds the renderer from the shared capture pipeline.
pub struct VisualizerPainter<S, P> {
    renderer: VisualizerRenderer,
    surface: S,
    pipeline: PipelineSlot<P>,
    sample: Vec<u8>,
}

impl<S: Surface, P: AudioPipeline> VisualizerPainter<S, P> {
    pub fn new(renderer: VisualizerRenderer, surface: S, pipeline: PipelineSlot<P>) -> Self {
        let sample = vec![0; renderer.config().analyser.bin_count()];
        Self {
            renderer,
            surface,
            pipeline,
            sample,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

impl<S: Surface, P: AudioPipeline> FramePainter for VisualizerPainter<S, P> {
    fn paint(&mut self, mode: RenderMode, now_ms: f64) -> Result<(), RenderError> {
        match mode {
            RenderMode::Active => {
                if !self.pipeline.sample_into(&mut self.sample) {
                    return Err(RenderError::MissingSample);
                }
                self.renderer.draw_active(&mut self.surface, &self.sample)
            }
            RenderMode::Idle => self.renderer.draw_idle(&mut self.surface, now_ms),
        }
    }
}
