//! Time utilities for the duel simulation

use std::time::Instant;

/// Default tick rate for the real-time runner
pub const SIMULATION_TPS: u32 = 60;

/// Largest step the simulation will integrate in one tick (seconds)
pub const MAX_STEP: f32 = 0.05;

/// Delta time for a fixed tick rate (in seconds)
pub fn tick_delta(tps: u32) -> f32 {
    1.0 / tps.max(1) as f32
}

/// Clamp an externally supplied step into `[0, MAX_STEP]`
pub fn clamp_step(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_STEP)
    } else {
        0.0
    }
}

/// Format an optional latency in seconds as whole milliseconds ("—" when unknown)
pub fn format_latency(secs: Option<f32>) -> String {
    match secs {
        Some(s) if s.is_finite() => format!("{}ms", (s * 1000.0).round() as i64),
        _ => "—".to_string(),
    }
}

/// A simple wall-clock timer for measuring runner durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
