//! GPU-resident boid simulation driver.
//!
//! A fixed population of agents lives in a storage buffer on the GPU. Every
//! tick a compute kernel advances all of them in parallel, the host blocks
//! on a full readback, and each agent's fresh state is handed to a
//! per-agent [`VisualSink`]. The crate's job is the host↔device contract:
//! byte-exact wire structs, dispatch sizing, a runtime-mutable parameter
//! block, and a buffer lifecycle that never shows a sink a half-updated
//! frame. Rendering is the caller's problem.
//!
//! ```no_run
//! use murmuration::{GpuContext, SimulationConfig, SimulationController};
//! use rand::SeedableRng;
//!
//! # struct Puppet;
//! # impl murmuration::VisualSink for Puppet {
//! #     fn apply(&mut self, _: murmuration::AgentRecord) {}
//! # }
//! let mut controller = SimulationController::new(GpuContext::new()?);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! controller.initialize(&SimulationConfig::default(), 1024, &mut rng, |_index| {
//!     Box::new(Puppet) as Box<dyn murmuration::VisualSink>
//! })?;
//! controller.tick(1.0 / 60.0)?;
//! controller.dispose();
//! # Ok::<(), murmuration::SimulationError>(())
//! ```

pub mod agent;
pub mod config;
pub mod controller;
pub mod error;
pub mod gpu;
pub mod params;

pub use agent::{verify_layouts, AgentRecord, AGENT_RECORD_SIZE};
pub use config::SimulationConfig;
pub use controller::{
    dispatch_group_count, Lifecycle, SimulationController, VisualSink, SPAWN_RADIUS,
    THREADS_PER_GROUP,
};
pub use error::SimulationError;
pub use gpu::GpuContext;
pub use params::{SimulationParameters, SIM_PARAMS_SIZE};
