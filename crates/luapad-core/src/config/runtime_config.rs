use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a binding does with an argument of the wrong shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarshalPolicy {
    /// Substitute the parameter's default and carry on
    #[default]
    Permissive,
    /// Raise a Lua error naming the binding and parameter
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Render ticks per second (default: 60)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Multiplier applied to sprite velocities by `updateSprites` (default: 1.0)
    #[serde(default = "default_sprite_step")]
    pub sprite_step: f64,

    #[serde(default)]
    pub marshalling: MarshalPolicy,

    /// Fixed seed for `random`/`rnd`; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,

    /// Frame-rate aggregation window in milliseconds (default: 500ms)
    #[serde(default = "default_fps_window")]
    pub fps_window_ms: u64,
}

fn default_frame_rate() -> u32 {
    60
}

fn default_sprite_step() -> f64 {
    1.0
}

fn default_fps_window() -> u64 {
    500
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            sprite_step: default_sprite_step(),
            marshalling: MarshalPolicy::default(),
            seed: None,
            fps_window_ms: default_fps_window(),
        }
    }
}

impl RuntimeConfig {
    /// Interval between render ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }

    pub fn fps_window(&self) -> Duration {
        Duration::from_millis(self.fps_window_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parses_lowercase() {
        let config: RuntimeConfig = toml::from_str("marshalling = \"strict\"").unwrap();
        assert_eq!(config.marshalling, MarshalPolicy::Strict);
        assert_eq!(config.frame_rate, 60);
    }

    #[test]
    fn test_zero_frame_rate_does_not_divide_by_zero() {
        let config = RuntimeConfig {
            frame_rate: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }
}
