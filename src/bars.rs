//! Mapping from a frequency sample to per-bar heights and energy tiers.

use crate::palette::{self, ColorStop};

/// Fraction of the spectrum the bars cover; the top bins are mostly noise.
pub const SPECTRUM_COVERAGE: f64 = 0.7;
/// Exponent applied to the bar position to spend more bars on low frequencies.
pub const WARP_EXPONENT: f64 = 1.5;
/// Share of the surface height a full-energy bar reaches.
pub const HEADROOM: f64 = 0.85;

const BASS_END: f64 = 0.2;
const MID_END: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Bass,
    Mid,
    Treble,
}

impl Band {
    pub fn of(bar: usize, bar_count: usize) -> Self {
        let i = bar as f64;
        let b = bar_count as f64;
        if i < b * BASS_END {
            Band::Bass
        } else if i < b * MID_END {
            Band::Mid
        } else {
            Band::Treble
        }
    }

    pub fn gain(self) -> f64 {
        match self {
            Band::Bass => 1.3,
            // mids dominate perceived loudness
            Band::Mid => 1.5,
            Band::Treble => 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnergyTier {
    Low,
    Medium,
    High,
}

impl EnergyTier {
    pub fn of(energy: f64) -> Self {
        if energy > 0.7 {
            EnergyTier::High
        } else if energy > 0.4 {
            EnergyTier::Medium
        } else {
            EnergyTier::Low
        }
    }

    pub fn stops(self) -> &'static [ColorStop] {
        match self {
            EnergyTier::High => &palette::HIGH_ENERGY,
            EnergyTier::Medium => &palette::MEDIUM_ENERGY,
            EnergyTier::Low => &palette::LOW_ENERGY,
        }
    }
}

/// Sample index read by bar `bar` out of `bar_count`, for a sample of `bins`
/// values. Non-decreasing in `bar` and always below `bins` when `bins > 0`.
pub fn sample_index(bar: usize, bar_count: usize, bins: usize) -> usize {
    if bar_count == 0 || bins == 0 {
        return 0;
    }
    let percent = bar as f64 / bar_count as f64;
    let warped = percent.powf(WARP_EXPONENT);
    let index = (warped * bins as f64 * SPECTRUM_COVERAGE).floor() as usize;
    index.min(bins - 1)
}

/// One bar of an ACTIVE frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub index: usize,
    pub sample_index: usize,
    pub magnitude: u8,
    pub band: Band,
    /// Gain-adjusted magnitude normalized to `[0, 1]`.
    pub energy: f64,
    /// Height in logical pixels.
    pub height: f64,
    pub tier: EnergyTier,
}

impl Bar {
    pub fn measure(index: usize, bar_count: usize, sample: &[u8], surface_height: f64) -> Self {
        let sample_index = sample_index(index, bar_count, sample.len());
        let magnitude = sample.get(sample_index).copied().unwrap_or(0);
        let band = Band::of(index, bar_count);
        let energy = (magnitude as f64 * band.gain() / 255.0).clamp(0.0, 1.0);
        Self {
            index,
            sample_index,
            magnitude,
            band,
            energy,
            height: energy * surface_height * HEADROOM,
            tier: EnergyTier::of(energy),
        }
    }
}

/// Measure every bar of a frame.
pub fn layout(sample: &[u8], bar_count: usize, surface_height: f64) -> impl Iterator<Item = Bar> + '_ {
    (0..bar_count).map(move |i| Bar::measure(i, bar_count, sample, surface_height))
}
