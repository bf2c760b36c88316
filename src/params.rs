use bytemuck::{Pod, Zeroable};

use crate::config::SimulationConfig;
use crate::error::SimulationError;

/// Expected byte size of [`SimulationParameters`].
pub const SIM_PARAMS_SIZE: usize = 32;

/// The constant block every kernel invocation reads. Lives in a uniform
/// buffer, so its size must be a multiple of 16 bytes; `_pad` exists only to
/// reach 32. Distances are stored squared so the kernel compares against
/// `dot(offset, offset)` without a square root.
///
/// `total_count` is frozen at initialization. [`update`](Self::update)
/// preserves it, which is what makes the population size immutable for the
/// controller's lifetime: resizing requires dispose and re-initialize.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SimulationParameters {
    pub alignment_dist_sq: f32,  // bytes 0-3
    pub max_velocity_mag: f32,   // bytes 4-7
    pub separation_dist_sq: f32, // bytes 8-11
    pub separation_weight: f32,  // bytes 12-15
    pub sight_angle_deg: f32,    // bytes 16-19
    pub speed: f32,              // bytes 20-23
    pub total_count: u32,        // bytes 24-27
    pub _pad: f32,               // bytes 28-31, uniform block alignment
}

impl SimulationParameters {
    /// Derives the kernel-facing block from a validated config: squares the
    /// two distance thresholds, copies the rest verbatim, zeroes padding.
    pub fn build(config: &SimulationConfig, total_count: u32) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            alignment_dist_sq: config.alignment_distance * config.alignment_distance,
            max_velocity_mag: config.max_velocity_magnitude,
            separation_dist_sq: config.separation_distance * config.separation_distance,
            separation_weight: config.separation_weight,
            sight_angle_deg: config.sight_angle_deg,
            speed: config.speed,
            total_count,
            _pad: 0.0,
        })
    }

    /// Same as [`build`](Self::build) but keeps `total_count` from `self`.
    /// This is the only rebuild path while the simulation is running; the
    /// whole block is rewritten and re-pushed, never patched field by field.
    pub fn update(&self, config: &SimulationConfig) -> Result<Self, SimulationError> {
        Self::build(config, self.total_count)
    }
}
