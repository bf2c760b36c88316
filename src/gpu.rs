use crate::error::SimulationError;

/// Headless wgpu device and queue shared by the controller. There is no
/// surface: this crate only dispatches compute work and reads buffers back.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    limits: wgpu::Limits,
}

impl GpuContext {
    /// Acquires an adapter and device, blocking the calling thread. Fails
    /// with [`SimulationError::NoAdapter`] when the system has no usable GPU.
    pub fn new() -> Result<Self, SimulationError> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Result<Self, SimulationError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(SimulationError::NoAdapter)?;

        log::debug!("using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Simulation Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let limits = device.limits();
        Ok(Self {
            device,
            queue,
            limits,
        })
    }

    /// Buffer creation in wgpu does not return a `Result`; an over-limit
    /// request trips device validation instead. Checking the size up front
    /// lets allocation failure surface synchronously as an error the caller
    /// can act on.
    pub fn checked_buffer_size(
        &self,
        label: &str,
        bytes: u64,
        storage: bool,
    ) -> Result<u64, SimulationError> {
        if bytes > self.limits.max_buffer_size {
            return Err(SimulationError::Allocation(format!(
                "{label}: {bytes} bytes exceeds max_buffer_size ({})",
                self.limits.max_buffer_size
            )));
        }
        if storage && bytes > u64::from(self.limits.max_storage_buffer_binding_size) {
            return Err(SimulationError::Allocation(format!(
                "{label}: {bytes} bytes exceeds max_storage_buffer_binding_size ({})",
                self.limits.max_storage_buffer_binding_size
            )));
        }
        Ok(bytes)
    }
}
