//! Synthetic ambient wave shown while nothing is playing.

use crate::config::WaveSettings;

/// Converts milliseconds of wall-clock time into oscillator phase.
pub const TIME_SCALE: f64 = 0.0015;

struct Oscillator {
    speed: f64,
    spread: f64,
    amplitude: f64,
}

const OSCILLATORS: [Oscillator; 3] = [
    Oscillator { speed: 1.0, spread: 0.2, amplitude: 6.0 },
    Oscillator { speed: 1.5, spread: 0.15, amplitude: 4.0 },
    Oscillator { speed: 0.8, spread: 0.25, amplitude: 3.0 },
];

/// Height of idle bar `bar` at `now_ms`, in logical pixels.
pub fn idle_height(bar: usize, now_ms: f64, wave: &WaveSettings) -> f64 {
    let t = now_ms * TIME_SCALE;
    let i = bar as f64;
    let swing: f64 = OSCILLATORS
        .iter()
        .take(wave.oscillators.min(OSCILLATORS.len()))
        .map(|osc| (t * osc.speed + i * osc.spread).sin() * osc.amplitude)
        .sum();
    (swing + wave.baseline).max(0.0)
}

/// Largest height the wave can reach for the given settings.
pub fn peak_height(wave: &WaveSettings) -> f64 {
    let swing: f64 = OSCILLATORS
        .iter()
        .take(wave.oscillators.min(OSCILLATORS.len()))
        .map(|osc| osc.amplitude)
        .sum();
    wave.baseline + swing
}
