//! Environmental velocity perturbation (temperature / humidity drift)
//!
//! The perturbation is a function of a clock, not of ball state. The default
//! reads the wall clock; batch runs and tests swap in a simulated clock or a
//! calm sky so results replay exactly.

use bevy::prelude::Vec3;
use std::time::{SystemTime, UNIX_EPOCH};

const TEMPERATURE_RATE: f64 = 0.0001;
const TEMPERATURE_AMPLITUDE: f32 = 0.008;
const HUMIDITY_RATE: f64 = 0.0002;
const HUMIDITY_AMPLITUDE: f32 = 0.005;

/// Velocity nudge for a clock reading in milliseconds
pub fn climate_perturbation(time_ms: f64) -> Vec3 {
    let temperature = (time_ms * TEMPERATURE_RATE).sin() as f32 * TEMPERATURE_AMPLITUDE;
    let humidity = (time_ms * HUMIDITY_RATE).cos() as f32 * HUMIDITY_AMPLITUDE;
    Vec3::new(temperature, 0.0, humidity)
}

/// Source of the per-tick environmental perturbation
pub trait Weather: Send + Sync {
    /// Perturbation to add to the ball velocity this tick
    fn perturbation(&mut self, dt: f32) -> Vec3;
}

/// Reads the system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClockWeather;

impl Weather for WallClockWeather {
    fn perturbation(&mut self, _dt: f32) -> Vec3 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        climate_perturbation(now_ms)
    }
}

/// Advances its own clock by the tick delta
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedWeather {
    pub elapsed_ms: f64,
}

impl Weather for SimulatedWeather {
    fn perturbation(&mut self, dt: f32) -> Vec3 {
        self.elapsed_ms += dt as f64 * 1000.0;
        climate_perturbation(self.elapsed_ms)
    }
}

/// No perturbation at all
#[derive(Debug, Default, Clone, Copy)]
pub struct CalmWeather;

impl Weather for CalmWeather {
    fn perturbation(&mut self, _dt: f32) -> Vec3 {
        Vec3::ZERO
    }
}
