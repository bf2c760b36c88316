use bytemuck::{Pod, Zeroable};

use crate::error::SimulationError;
use crate::params::{SimulationParameters, SIM_PARAMS_SIZE};

/// Expected byte size of [`AgentRecord`] on both sides of the GPU boundary.
pub const AGENT_RECORD_SIZE: usize = 24;

/// Per-boid state exchanged with the compute kernel every tick.
///
/// The kernel reads and writes these records in a storage buffer with a
/// stride of exactly 24 bytes (6 floats, no padding). Field order is part of
/// the wire format: the WGSL struct in `shaders/update_boid.wgsl` mirrors it
/// byte for byte, and a mismatch corrupts the simulation silently. The
/// kernel is the only writer; the host reads the records back after each
/// dispatch and hands out copies, never references.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct AgentRecord {
    pub position: [f32; 3], // bytes 0-11
    pub velocity: [f32; 3], // bytes 12-23
}

/// Checks the compiled sizes of all GPU-shared structs against the layout
/// the kernel expects. Called once per initialization so a build or platform
/// mismatch fails fast instead of corrupting buffer contents.
pub fn verify_layouts() -> Result<(), SimulationError> {
    let agent = std::mem::size_of::<AgentRecord>();
    if agent != AGENT_RECORD_SIZE {
        return Err(SimulationError::LayoutMismatch {
            name: "AgentRecord",
            expected: AGENT_RECORD_SIZE,
            actual: agent,
        });
    }

    let params = std::mem::size_of::<SimulationParameters>();
    if params != SIM_PARAMS_SIZE {
        return Err(SimulationError::LayoutMismatch {
            name: "SimulationParameters",
            expected: SIM_PARAMS_SIZE,
            actual: params,
        });
    }

    Ok(())
}
