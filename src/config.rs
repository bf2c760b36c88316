use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Tunable flocking parameters as the user supplies them. Distances are in
/// world units (unsquared); the squared forms the kernel consumes are
/// derived in [`SimulationParameters::build`](crate::params::SimulationParameters::build).
///
/// Population count is deliberately not part of the config: it is fixed at
/// [`initialize`](crate::controller::SimulationController::initialize) and
/// cannot be changed by a parameter update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Radius inside which other boids are seen at all.
    pub alignment_distance: f32,
    /// Radius inside which the separation force applies. Must be strictly
    /// smaller than `alignment_distance`.
    pub separation_distance: f32,
    pub separation_weight: f32,
    /// Half-angle of the sight cone, in degrees, 0 to 180.
    pub sight_angle_deg: f32,
    pub max_velocity_magnitude: f32,
    pub speed: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alignment_distance: 10.0,
            separation_distance: 5.0,
            separation_weight: 1.0,
            sight_angle_deg: 90.0,
            max_velocity_magnitude: 5.0,
            speed: 2.0,
        }
    }
}

impl SimulationConfig {
    /// Validates every documented constraint. Run at initialization and at
    /// every parameter update; the kernel itself never checks its inputs.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let fields = [
            ("alignment_distance", self.alignment_distance),
            ("separation_distance", self.separation_distance),
            ("separation_weight", self.separation_weight),
            ("sight_angle_deg", self.sight_angle_deg),
            ("max_velocity_magnitude", self.max_velocity_magnitude),
            ("speed", self.speed),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SimulationError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
            if value < 0.0 {
                return Err(SimulationError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        if self.separation_distance >= self.alignment_distance {
            return Err(SimulationError::InvalidConfig(format!(
                "separation_distance ({}) must be strictly less than alignment_distance ({})",
                self.separation_distance, self.alignment_distance
            )));
        }

        if self.sight_angle_deg > 180.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "sight_angle_deg must be within [0, 180], got {}",
                self.sight_angle_deg
            )));
        }

        Ok(())
    }

    /// Loads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}
