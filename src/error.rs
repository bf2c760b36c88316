use crate::controller::Lifecycle;

/// Error surface of the simulation driver. Every variant is reported
/// synchronously to the caller of the operation that triggered it; nothing
/// is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// A configuration value violates a documented constraint. Recoverable:
    /// correct the value and retry.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// GPU resource creation failed. Fatal to this controller instance;
    /// dispose and re-initialize.
    #[error("gpu allocation failed: {0}")]
    Allocation(String),

    /// No usable GPU adapter was found on this system.
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    /// Failed to acquire a device from the adapter.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// An operation was called outside its valid lifecycle state. This is a
    /// programming error in the caller, not something a user can recover from.
    #[error("{op} called while controller is {state:?}")]
    InvalidState { op: &'static str, state: Lifecycle },

    /// The compiled size of a struct shared with the GPU disagrees with the
    /// layout the kernel expects. Fatal at startup; indicates a build or
    /// platform mismatch.
    #[error("layout mismatch for {name}: expected {expected} bytes, got {actual}")]
    LayoutMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The blocking readback of the population buffer failed.
    #[error("buffer readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
}
