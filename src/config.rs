//! Device classification and render configuration.
//!
//! The configuration is resolved once at startup from a [`DeviceProbe`]. Mobile
//! and desktop differ only in the values carried here; drawing code never asks
//! which class it runs on.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Viewports at or below this width are treated as mobile.
pub const MOBILE_MAX_VIEWPORT: f64 = 768.0;

const MOBILE_UA_TOKENS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

/// Snapshot of the capabilities reported by the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProbe {
    pub user_agent: String,
    pub viewport_width: f64,
    pub device_pixel_ratio: f64,
}

impl DeviceProbe {
    pub fn classify(&self) -> DeviceClass {
        let ua = self.user_agent.to_ascii_lowercase();
        let mobile_ua = MOBILE_UA_TOKENS.iter().any(|token| ua.contains(token));
        if mobile_ua || self.viewport_width <= MOBILE_MAX_VIEWPORT {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}

/// Backing-store scale for a reported device pixel ratio, capped at 2.
/// Nonsense readings fall back to 1.
fn backing_scale(device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(2.0)
    } else {
        1.0
    }
}

/// Settings applied to the spectral analysis node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyserSettings {
    pub fft_size: u32,
    pub smoothing: f64,
    pub min_decibels: f64,
    pub max_decibels: f64,
}

impl AnalyserSettings {
    /// Length of one frequency sample.
    pub fn bin_count(&self) -> usize {
        (self.fft_size / 2) as usize
    }
}

/// Idle-mode wave synthesis. These are visual tuning values, not contracts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveSettings {
    /// How many of the three oscillators are summed (1..=3).
    pub oscillators: usize,
    /// Constant height added under the wave, in logical pixels.
    pub baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub device: DeviceClass,
    pub bar_count: usize,
    /// Horizontal gap between bars, in logical pixels.
    pub bar_gap: f64,
    /// Radius of the rounded top corners of each bar.
    pub corner_radius: f64,
    pub analyser: AnalyserSettings,
    /// Glow blur in ACTIVE mode; 0 disables the glow.
    pub shadow_blur: f64,
    /// Glow blur in IDLE mode; 0 disables the glow.
    pub idle_shadow_blur: f64,
    pub pixel_ratio: f64,
    pub reflections: bool,
    pub ambient_glow: bool,
    pub wave: WaveSettings,
    /// Re-resume the audio device when the page becomes visible again.
    pub resume_on_visible: bool,
}

impl RenderConfig {
    pub fn desktop(device_pixel_ratio: f64) -> Self {
        Self {
            device: DeviceClass::Desktop,
            bar_count: 50,
            bar_gap: 1.5,
            corner_radius: 3.0,
            analyser: AnalyserSettings {
                fft_size: 512,
                smoothing: 0.75,
                min_decibels: -85.0,
                max_decibels: -20.0,
            },
            shadow_blur: 15.0,
            idle_shadow_blur: 8.0,
            pixel_ratio: backing_scale(device_pixel_ratio),
            reflections: true,
            ambient_glow: true,
            wave: WaveSettings {
                oscillators: 3,
                baseline: 15.0,
            },
            resume_on_visible: false,
        }
    }

    pub fn mobile() -> Self {
        Self {
            device: DeviceClass::Mobile,
            bar_count: 32,
            bar_gap: 1.5,
            corner_radius: 3.0,
            analyser: AnalyserSettings {
                fft_size: 256,
                smoothing: 0.8,
                min_decibels: -85.0,
                max_decibels: -20.0,
            },
            shadow_blur: 6.0,
            idle_shadow_blur: 4.0,
            pixel_ratio: 1.0,
            reflections: false,
            ambient_glow: false,
            wave: WaveSettings {
                oscillators: 2,
                baseline: 12.0,
            },
            resume_on_visible: true,
        }
    }

    pub fn resolve(probe: &DeviceProbe) -> Self {
        match probe.classify() {
            DeviceClass::Mobile => Self::mobile(),
            DeviceClass::Desktop => Self::desktop(probe.device_pixel_ratio),
        }
    }

    /// Apply validated startup overrides.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        overrides.validate()?;
        if let Some(bar_count) = overrides.bar_count {
            self.bar_count = bar_count;
        }
        if let Some(fft_size) = overrides.fft_size {
            self.analyser.fft_size = fft_size;
        }
        if let Some(smoothing) = overrides.smoothing {
            self.analyser.smoothing = smoothing;
        }
        if let Some(blur) = overrides.shadow_blur {
            self.shadow_blur = blur;
        }
        if let Some(reflections) = overrides.reflections {
            self.reflections = reflections;
        }
        if let Some(ambient) = overrides.ambient_glow {
            self.ambient_glow = ambient;
        }
        Ok(self)
    }
}

/// Optional page-supplied tweaks, read once from an inline JSON block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub bar_count: Option<usize>,
    pub fft_size: Option<u32>,
    pub smoothing: Option<f64>,
    pub shadow_blur: Option<f64>,
    pub reflections: Option<bool>,
    pub ambient_glow: Option<bool>,
}

impl ConfigOverrides {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let overrides: Self = serde_json::from_str(text)?;
        overrides.validate()?;
        Ok(overrides)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bar_count == Some(0) {
            return Err(ConfigError::ZeroBars);
        }
        if let Some(fft) = self.fft_size {
            if !fft.is_power_of_two() || !(32..=32768).contains(&fft) {
                return Err(ConfigError::InvalidFftSize(fft));
            }
        }
        if let Some(smoothing) = self.smoothing {
            if !(0.0..=1.0).contains(&smoothing) {
                return Err(ConfigError::InvalidSmoothing(smoothing));
            }
        }
        if let Some(blur) = self.shadow_blur {
            if blur < 0.0 || blur.is_nan() {
                return Err(ConfigError::NegativeBlur(blur));
            }
        }
        Ok(())
    }
}
