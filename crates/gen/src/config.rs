use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors raised while loading or validating a [`GeneratorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must lie in [0, 1], got {value}")]
    NotUnit { field: &'static str, value: f32 },
    #[error("{what}: min {min} exceeds max {max}")]
    InvertedRange {
        what: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },
}

/// Generator tuning. Immutable once a scheduler has been built from it.
///
/// Angles are in degrees, distances in world units, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Length of one segment along the road.
    pub segment_length: f32,
    /// Segments built before the first tick.
    pub initial_segments: u32,
    /// Observer distance to the spawn point below which a segment is built.
    pub trigger_distance: f32,
    /// Vertical offset of road pieces.
    pub road_height: f32,
    /// Vertical offset of terrain pieces.
    pub terrain_height: f32,
    /// Lateral distance of each terrain piece from the road centre line.
    pub terrain_offset: f32,
    /// Seconds a segment lives before its container is destroyed.
    pub segment_lifetime: f32,
    /// Half-width of the uniform per-segment curvature change.
    pub normal_curve_change: f32,
    /// Bound on the accumulated curvature.
    pub max_total_curve: f32,
    /// Probability that a segment starts a sharp turn.
    pub sharp_turn_chance: f32,
    pub sharp_angle_min: f32,
    pub sharp_angle_max: f32,
    /// Segments a sharp turn is spread across.
    pub sharp_ease_min: u32,
    pub sharp_ease_max: u32,
    pub min_sub_segments: u32,
    pub max_sub_segments: u32,
    /// Longitudinal overlap between consecutive sub-pieces.
    pub sub_overlap_z: f32,
    /// 0 = maximal lag, 1 = near-instant heading tracking.
    pub sub_smoothing: f32,
    /// Simulated time the heading filter advances per sub-piece.
    pub smoothing_time_step: f32,
    /// RNG seed. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            segment_length: 50.0,
            initial_segments: 5,
            trigger_distance: 30.0,
            road_height: 0.01,
            terrain_height: 0.0,
            terrain_offset: 25.0,
            segment_lifetime: 1200.0,
            normal_curve_change: 1.2,
            max_total_curve: 60.0,
            sharp_turn_chance: 0.07,
            sharp_angle_min: 18.0,
            sharp_angle_max: 40.0,
            sharp_ease_min: 3,
            sharp_ease_max: 7,
            min_sub_segments: 4,
            max_sub_segments: 12,
            sub_overlap_z: 0.3,
            sub_smoothing: 0.7,
            smoothing_time_step: 1.0 / 60.0,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// The degenerate fixed-step generator: no sharp turns, one piece per
    /// segment, heading snaps to the target.
    pub fn fixed_step() -> Self {
        Self {
            sharp_turn_chance: 0.0,
            min_sub_segments: 1,
            max_sub_segments: 1,
            sub_smoothing: 1.0,
            ..Self::default()
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&data)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Damping time handed to the heading filter.
    pub fn damping_time(&self) -> f32 {
        1.0 - self.sub_smoothing
    }

    /// Reject configurations that would produce degenerate geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("segment_length", self.segment_length),
            ("trigger_distance", self.trigger_distance),
            ("road_height", self.road_height),
            ("terrain_height", self.terrain_height),
            ("terrain_offset", self.terrain_offset),
            ("segment_lifetime", self.segment_lifetime),
            ("normal_curve_change", self.normal_curve_change),
            ("max_total_curve", self.max_total_curve),
            ("sharp_turn_chance", self.sharp_turn_chance),
            ("sharp_angle_min", self.sharp_angle_min),
            ("sharp_angle_max", self.sharp_angle_max),
            ("sub_overlap_z", self.sub_overlap_z),
            ("sub_smoothing", self.sub_smoothing),
            ("smoothing_time_step", self.smoothing_time_step),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }

        for (field, value) in [
            ("segment_length", self.segment_length),
            ("trigger_distance", self.trigger_distance),
            ("segment_lifetime", self.segment_lifetime),
            ("smoothing_time_step", self.smoothing_time_step),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        for (field, value) in [
            ("terrain_offset", self.terrain_offset),
            ("normal_curve_change", self.normal_curve_change),
            ("max_total_curve", self.max_total_curve),
            ("sharp_angle_min", self.sharp_angle_min),
            ("sub_overlap_z", self.sub_overlap_z),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        for (field, value) in [
            ("sharp_turn_chance", self.sharp_turn_chance),
            ("sub_smoothing", self.sub_smoothing),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::NotUnit { field, value });
            }
        }

        if self.sharp_angle_min > self.sharp_angle_max {
            return Err(ConfigError::InvertedRange {
                what: "sharp_angle",
                min: self.sharp_angle_min,
                max: self.sharp_angle_max,
            });
        }
        if self.sharp_ease_min == 0 {
            return Err(ConfigError::ZeroCount {
                field: "sharp_ease_min",
            });
        }
        if self.sharp_ease_min > self.sharp_ease_max {
            return Err(ConfigError::InvertedRange {
                what: "sharp_ease",
                min: self.sharp_ease_min as f32,
                max: self.sharp_ease_max as f32,
            });
        }
        if self.min_sub_segments == 0 {
            return Err(ConfigError::ZeroCount {
                field: "min_sub_segments",
            });
        }
        if self.min_sub_segments > self.max_sub_segments {
            return Err(ConfigError::InvertedRange {
                what: "sub_segments",
                min: self.min_sub_segments as f32,
                max: self.max_sub_segments as f32,
            });
        }
        Ok(())
    }
}
