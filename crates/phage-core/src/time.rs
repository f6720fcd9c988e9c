//! Frame time for the Phage engine
//!
//! Turns raw wall-clock deltas into clamped, scaled game deltas and a
//! fixed-step cadence for the frame driver.

use serde::{Deserialize, Serialize};

/// Configuration for game time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// How many in-game seconds pass per real second
    pub time_scale: f32,
    /// Length of one fixed frame step (in seconds)
    pub fixed_timestep: f32,
    /// Maximum raw delta accepted per call, to prevent a spiral of death
    pub max_delta_time: f32,
    /// Upper bound on fixed steps run for a single raw delta
    pub max_steps_per_frame: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            fixed_timestep: 1.0 / 60.0,
            max_delta_time: 0.25,
            max_steps_per_frame: 8,
        }
    }
}

/// Game time tracking
#[derive(Debug, Clone, Default)]
pub struct GameTime {
    /// Configuration
    pub config: TimeConfig,
    /// Scaled time since start in seconds
    pub total_time: f64,
    /// Scaled delta for the last raw update (clamped)
    pub delta_time: f32,
    /// Unscaled, clamped delta for the last raw update
    pub unscaled_delta_time: f32,
    /// Number of fixed steps handed out so far
    pub frame_count: u64,
    /// Whether the game is paused
    pub paused: bool,
    fixed_accumulator: f32,
}

impl GameTime {
    /// Create a new game time with custom config
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Feed the raw delta from the previous host frame
    pub fn update(&mut self, raw_delta: f32) {
        self.unscaled_delta_time = raw_delta.clamp(0.0, self.config.max_delta_time);

        if self.paused {
            self.delta_time = 0.0;
            return;
        }

        self.delta_time = self.unscaled_delta_time * self.config.time_scale;
        self.total_time += self.delta_time as f64;
        self.fixed_accumulator += self.delta_time;
    }

    /// Number of fixed steps due since the last call, capped by the config
    pub fn fixed_steps(&mut self) -> u32 {
        let step = self.config.fixed_timestep;
        if step <= 0.0 {
            return 0;
        }
        let mut steps = 0;
        while self.fixed_accumulator >= step && steps < self.config.max_steps_per_frame {
            self.fixed_accumulator -= step;
            steps += 1;
        }
        if steps == self.config.max_steps_per_frame {
            // drop the backlog rather than carrying it into the next frame
            self.fixed_accumulator = self.fixed_accumulator.min(step);
        }
        self.frame_count += steps as u64;
        steps
    }

    /// Interpolation factor between the last and the next fixed step
    pub fn fixed_interpolation(&self) -> f32 {
        if self.config.fixed_timestep <= 0.0 {
            return 0.0;
        }
        self.fixed_accumulator / self.config.fixed_timestep
    }

    /// Stop the clock. Deltas read as zero until resumed.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Restart a paused clock.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_steps_accumulate() {
        let mut time = GameTime::new(TimeConfig {
            fixed_timestep: 0.1,
            ..Default::default()
        });
        time.update(0.25);
        assert_eq!(time.fixed_steps(), 2);
        assert!((time.fixed_interpolation() - 0.5).abs() < 1e-4);
        time.update(0.06);
        assert_eq!(time.fixed_steps(), 1);
        assert_eq!(time.frame_count, 3);
    }

    #[test]
    fn test_delta_clamped_and_scaled() {
        let mut time = GameTime::default();
        time.set_time_scale(2.0);
        time.update(10.0);
        assert_eq!(time.unscaled_delta_time, 0.25);
        assert_eq!(time.delta_time, 0.5);
    }

    #[test]
    fn test_pause_freezes() {
        let mut time = GameTime::default();
        time.pause();
        time.update(0.016);
        assert_eq!(time.delta_time, 0.0);
        assert_eq!(time.fixed_steps(), 0);
        time.resume();
        time.update(0.02);
        assert!(time.delta_time > 0.0);
    }

    #[test]
    fn test_step_cap_drops_backlog() {
        let mut time = GameTime::new(TimeConfig {
            fixed_timestep: 0.01,
            max_steps_per_frame: 3,
            ..Default::default()
        });
        time.update(0.2);
        assert_eq!(time.fixed_steps(), 3);
        assert!(time.fixed_steps() <= 1);
    }
}
