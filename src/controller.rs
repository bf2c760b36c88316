// Murmuration - GPU-Resident Boid Flocking Driver
// Licensed under MIT License

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use rand_distr::{Distribution, UnitBall, UnitSphere};
use wgpu::util::DeviceExt;

use crate::agent::{verify_layouts, AgentRecord, AGENT_RECORD_SIZE};
use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::gpu::GpuContext;
use crate::params::SimulationParameters;

/// Workgroup width of the update kernel. Must match the
/// `@workgroup_size` declaration in `shaders/update_boid.wgsl`.
pub const THREADS_PER_GROUP: u32 = 256;

/// Boids spawn with positions uniform inside a ball of this radius.
pub const SPAWN_RADIUS: f32 = 50.0;

const KERNEL_ENTRY_POINT: &str = "update_boid";
const UPDATE_BOID_WGSL: &str = include_str!("../shaders/update_boid.wgsl");

/// Number of workgroups along x for a 1-D dispatch over the population.
pub fn dispatch_group_count(population_count: u32) -> u32 {
    population_count.div_ceil(THREADS_PER_GROUP)
}

/// Per-agent consumer of post-tick state. One sink per population index,
/// created once at initialization and never reassigned. Sinks receive copies
/// of the records, never references into controller-owned memory.
pub trait VisualSink {
    fn apply(&mut self, record: AgentRecord);
}

/// Lifecycle of a [`SimulationController`]. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Running,
    Disposed,
}

/// Per-dispatch scalar input. Lives in its own 16-byte uniform so pushing a
/// new delta time never touches the parameter block.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct TickInput {
    delta_time: f32,
    _pad: [f32; 3],
}

struct GpuResources {
    agent_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    tick_input_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
}

/// Owns the population, both device buffers, and the per-frame tick.
///
/// The driver is single-threaded by contract: every mutating operation takes
/// `&mut self`, so the borrow checker rules out concurrent ticks. The tick
/// itself blocks on a full readback of the agent buffer before any sink is
/// invoked, so sinks always observe the result of the dispatch that just ran
/// and never a partially updated population.
pub struct SimulationController {
    gpu: GpuContext,
    state: Lifecycle,
    params: SimulationParameters,
    params_dirty: bool,
    population: Vec<AgentRecord>,
    sinks: Vec<Box<dyn VisualSink>>,
    resources: Option<GpuResources>,
    group_count: u32,
}

impl SimulationController {
    pub fn new(gpu: GpuContext) -> Self {
        Self {
            gpu,
            state: Lifecycle::Uninitialized,
            params: SimulationParameters::zeroed(),
            params_dirty: false,
            population: Vec::new(),
            sinks: Vec::new(),
            resources: None,
            group_count: 0,
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Spawns the population, allocates and uploads both device buffers, and
    /// builds the compute pipeline. Positions are drawn uniformly inside the
    /// spawn ball and velocities uniformly on the unit sphere, all from the
    /// caller's `rng` so runs can be seeded. `sink_factory` is called once
    /// per index; each sink immediately receives its agent's initial record.
    ///
    /// Valid only from `Uninitialized`. A failed initialization leaves the
    /// controller `Uninitialized` with no resources allocated.
    pub fn initialize<R, F>(
        &mut self,
        config: &SimulationConfig,
        population_count: u32,
        rng: &mut R,
        sink_factory: F,
    ) -> Result<(), SimulationError>
    where
        R: Rng + ?Sized,
        F: FnMut(usize) -> Box<dyn VisualSink>,
    {
        self.initialize_with_kernel(config, population_count, rng, sink_factory, UPDATE_BOID_WGSL)
    }

    // Kernel source is a parameter so tests can substitute a stub with the
    // same bindings.
    fn initialize_with_kernel<R, F>(
        &mut self,
        config: &SimulationConfig,
        population_count: u32,
        rng: &mut R,
        mut sink_factory: F,
        kernel_source: &str,
    ) -> Result<(), SimulationError>
    where
        R: Rng + ?Sized,
        F: FnMut(usize) -> Box<dyn VisualSink>,
    {
        if self.state != Lifecycle::Uninitialized {
            return Err(SimulationError::InvalidState {
                op: "initialize",
                state: self.state,
            });
        }

        verify_layouts()?;
        let params = SimulationParameters::build(config, population_count)?;
        let group_count = dispatch_group_count(population_count);

        // Check sizes against device limits before spawning anything so an
        // oversized request fails without a giant host allocation.
        let agent_bytes = u64::from(population_count) * AGENT_RECORD_SIZE as u64;
        if population_count > 0 {
            self.gpu
                .checked_buffer_size("agent buffer", agent_bytes, true)?;
            self.gpu
                .checked_buffer_size("readback buffer", agent_bytes, false)?;
        }

        let population = spawn_population(population_count, rng);
        let mut sinks: Vec<Box<dyn VisualSink>> = Vec::with_capacity(population.len());
        for (i, record) in population.iter().enumerate() {
            let mut sink = sink_factory(i);
            sink.apply(*record);
            sinks.push(sink);
        }

        // An empty population is a valid Running state with no device
        // resources; ticks dispatch nothing and invoke no sinks.
        let resources = if population_count > 0 {
            Some(self.create_resources(&population, &params, kernel_source))
        } else {
            None
        };

        log::info!(
            "initialized {population_count} boids in {group_count} thread groups; \
             each tick performs a blocking {agent_bytes}-byte readback"
        );

        self.params = params;
        self.params_dirty = false;
        self.population = population;
        self.sinks = sinks;
        self.resources = resources;
        self.group_count = group_count;
        self.state = Lifecycle::Running;
        Ok(())
    }

    fn create_resources(
        &self,
        population: &[AgentRecord],
        params: &SimulationParameters,
        kernel_source: &str,
    ) -> GpuResources {
        let device = &self.gpu.device;

        let agent_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Boid Buffer"),
            contents: bytemuck::cast_slice(population),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Simulation Params Buffer"),
            contents: bytemuck::bytes_of(params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let tick_input_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Tick Input Buffer"),
            size: std::mem::size_of::<TickInput>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Boid Readback Buffer"),
            size: (population.len() * AGENT_RECORD_SIZE) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Update Boid Shader"),
            source: wgpu::ShaderSource::Wgsl(kernel_source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Boid Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Boid Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Update Boid Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: KERNEL_ENTRY_POINT,
            compilation_options: Default::default(),
            cache: None,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Boid Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: agent_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: tick_input_buffer.as_entire_binding(),
                },
            ],
        });

        GpuResources {
            agent_buffer,
            params_buffer,
            tick_input_buffer,
            readback_buffer,
            pipeline,
            bind_group,
        }
    }

    /// Runs one simulation step: pushes parameters if they changed, writes
    /// the delta time, dispatches the kernel over the whole population, then
    /// blocks until the agent buffer has been read back into host memory and
    /// forwards every record to its sink, in index order.
    ///
    /// The blocking readback stalls the host for the full dispatch. That is
    /// the crate's known hot path; the payoff is that sinks never see a
    /// stale or partially updated frame.
    pub fn tick(&mut self, elapsed_seconds: f32) -> Result<(), SimulationError> {
        if self.state != Lifecycle::Running {
            return Err(SimulationError::InvalidState {
                op: "tick",
                state: self.state,
            });
        }
        let Some(resources) = &self.resources else {
            return Ok(());
        };

        if self.params_dirty {
            self.gpu.queue.write_buffer(
                &resources.params_buffer,
                0,
                bytemuck::bytes_of(&self.params),
            );
            self.params_dirty = false;
        }

        let tick_input = TickInput {
            delta_time: elapsed_seconds,
            _pad: [0.0; 3],
        };
        self.gpu.queue.write_buffer(
            &resources.tick_input_buffer,
            0,
            bytemuck::bytes_of(&tick_input),
        );

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Tick Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Update Boid Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&resources.pipeline);
            pass.set_bind_group(0, &resources.bind_group, &[]);
            // 1-D population: one workgroup axis, the other two are always 1.
            pass.dispatch_workgroups(self.group_count, 1, 1);
        }
        let population_bytes = (self.population.len() * AGENT_RECORD_SIZE) as u64;
        encoder.copy_buffer_to_buffer(
            &resources.agent_buffer,
            0,
            &resources.readback_buffer,
            0,
            population_bytes,
        );
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = resources.readback_buffer.slice(..);
        let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.gpu.device.poll(wgpu::Maintain::Wait);
        let mapped = pollster::block_on(receiver.receive())
            .unwrap_or(Err(wgpu::BufferAsyncError));
        if let Err(err) = mapped {
            resources.readback_buffer.unmap();
            return Err(SimulationError::Readback(err));
        }

        {
            let data = buffer_slice.get_mapped_range();
            self.population.copy_from_slice(bytemuck::cast_slice(&data));
        }
        resources.readback_buffer.unmap();

        for (sink, record) in self.sinks.iter_mut().zip(&self.population) {
            sink.apply(*record);
        }
        Ok(())
    }

    /// Re-derives the parameter block from `config`, preserving the
    /// population count, and schedules a full uniform rewrite before the
    /// next dispatch. Valid only while `Running`.
    pub fn update_parameters(&mut self, config: &SimulationConfig) -> Result<(), SimulationError> {
        if self.state != Lifecycle::Running {
            return Err(SimulationError::InvalidState {
                op: "update_parameters",
                state: self.state,
            });
        }
        self.params = self.params.update(config)?;
        self.params_dirty = true;
        Ok(())
    }

    /// Releases both device buffers and all host-side simulation state.
    /// Idempotent; every operation after the first call fails with
    /// `InvalidState`.
    pub fn dispose(&mut self) {
        if self.state == Lifecycle::Disposed {
            return;
        }
        if let Some(resources) = self.resources.take() {
            // Let in-flight GPU work drain before releasing the buffers.
            self.gpu.device.poll(wgpu::Maintain::Wait);
            resources.agent_buffer.destroy();
            resources.params_buffer.destroy();
            resources.tick_input_buffer.destroy();
            resources.readback_buffer.destroy();
        }
        self.sinks.clear();
        self.population.clear();
        self.group_count = 0;
        self.state = Lifecycle::Disposed;
    }
}

impl Drop for SimulationController {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn spawn_population<R: Rng + ?Sized>(count: u32, rng: &mut R) -> Vec<AgentRecord> {
    (0..count)
        .map(|_| {
            let p: [f32; 3] = UnitBall.sample(rng);
            let velocity: [f32; 3] = UnitSphere.sample(rng);
            AgentRecord {
                position: [
                    p[0] * SPAWN_RADIUS,
                    p[1] * SPAWN_RADIUS,
                    p[2] * SPAWN_RADIUS,
                ],
                velocity,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    // Same bindings as the real kernel, deterministic output: velocity is
    // half the configured maximum along x, position encodes the agent index.
    const STUB_KERNEL: &str = r#"
struct Boid {
    position: array<f32, 3>,
    velocity: array<f32, 3>,
}

struct Params {
    alignment_dist_sq: f32,
    max_velocity_mag: f32,
    separation_dist_sq: f32,
    separation_weight: f32,
    sight_angle_deg: f32,
    speed: f32,
    total_count: u32,
    _pad: f32,
}

struct TickInput {
    delta_time: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

@group(0) @binding(0) var<storage, read_write> boids: array<Boid>;
@group(0) @binding(1) var<uniform> params: Params;
@group(0) @binding(2) var<uniform> tick: TickInput;

@compute @workgroup_size(256)
fn update_boid(@builtin(global_invocation_id) id: vec3<u32>) {
    let i = id.x;
    if (i >= params.total_count) {
        return;
    }
    let v = params.max_velocity_mag * 0.5;
    boids[i].velocity = array<f32, 3>(v, 0.0, 0.0);
    boids[i].position = array<f32, 3>(f32(i), v * tick.delta_time, 0.0);
}
"#;

    type ApplyLog = Rc<RefCell<Vec<(usize, AgentRecord)>>>;

    struct RecordingSink {
        index: usize,
        log: ApplyLog,
    }

    impl VisualSink for RecordingSink {
        fn apply(&mut self, record: AgentRecord) {
            self.log.borrow_mut().push((self.index, record));
        }
    }

    fn recording_factory(log: &ApplyLog) -> impl FnMut(usize) -> Box<dyn VisualSink> + '_ {
        move |index| {
            Box::new(RecordingSink {
                index,
                log: Rc::clone(log),
            })
        }
    }

    fn gpu() -> Option<GpuContext> {
        match GpuContext::new() {
            Ok(gpu) => Some(gpu),
            Err(err) => {
                eprintln!("skipping GPU test: {err}");
                None
            }
        }
    }

    fn magnitude(v: [f32; 3]) -> f32 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn dispatch_group_count_rounds_up() {
        assert_eq!(dispatch_group_count(0), 0);
        assert_eq!(dispatch_group_count(1), 1);
        assert_eq!(dispatch_group_count(256), 1);
        assert_eq!(dispatch_group_count(257), 2);
        assert_eq!(dispatch_group_count(512), 2);
        assert_eq!(dispatch_group_count(513), 3);
    }

    #[test]
    fn spawn_is_seed_deterministic_and_bounded() {
        let a = spawn_population(128, &mut StdRng::seed_from_u64(7));
        let b = spawn_population(128, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let c = spawn_population(128, &mut StdRng::seed_from_u64(8));
        assert_ne!(a, c);

        for record in &a {
            assert!(magnitude(record.position) <= SPAWN_RADIUS + 1e-3);
            assert!((magnitude(record.velocity) - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn operations_require_running_state() {
        let Some(gpu) = gpu() else { return };
        let mut controller = SimulationController::new(gpu);

        assert!(matches!(
            controller.tick(0.016),
            Err(SimulationError::InvalidState { op: "tick", .. })
        ));
        assert!(matches!(
            controller.update_parameters(&SimulationConfig::default()),
            Err(SimulationError::InvalidState { .. })
        ));

        controller.dispose();
        assert_eq!(controller.state(), Lifecycle::Disposed);
        assert!(matches!(
            controller.tick(0.016),
            Err(SimulationError::InvalidState { op: "tick", .. })
        ));
        let mut rng = StdRng::seed_from_u64(0);
        let log: ApplyLog = Rc::new(RefCell::new(Vec::new()));
        assert!(matches!(
            controller.initialize(&SimulationConfig::default(), 4, &mut rng, recording_factory(&log)),
            Err(SimulationError::InvalidState { .. })
        ));
    }

    #[test]
    fn invalid_config_rejected_at_initialize() {
        let Some(gpu) = gpu() else { return };
        let mut controller = SimulationController::new(gpu);
        let config = SimulationConfig {
            alignment_distance: 2.0,
            separation_distance: 3.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let log: ApplyLog = Rc::new(RefCell::new(Vec::new()));
        assert!(matches!(
            controller.initialize(&config, 4, &mut rng, recording_factory(&log)),
            Err(SimulationError::InvalidConfig(_))
        ));
        // Failed initialization leaves the controller reusable.
        assert_eq!(controller.state(), Lifecycle::Uninitialized);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn oversized_population_fails_allocation() {
        let Some(gpu) = gpu() else { return };
        let mut controller = SimulationController::new(gpu);
        let mut rng = StdRng::seed_from_u64(0);
        let log: ApplyLog = Rc::new(RefCell::new(Vec::new()));
        assert!(matches!(
            controller.initialize(
                &SimulationConfig::default(),
                u32::MAX,
                &mut rng,
                recording_factory(&log)
            ),
            Err(SimulationError::Allocation(_))
        ));
        assert_eq!(controller.state(), Lifecycle::Uninitialized);
    }

    #[test]
    fn dispose_is_idempotent() {
        let Some(gpu) = gpu() else { return };
        let mut controller = SimulationController::new(gpu);
        let mut rng = StdRng::seed_from_u64(1);
        let log: ApplyLog = Rc::new(RefCell::new(Vec::new()));
        controller
            .initialize(&SimulationConfig::default(), 8, &mut rng, recording_factory(&log))
            .unwrap();
        controller.dispose();
        controller.dispose();
        assert_eq!(controller.state(), Lifecycle::Disposed);
    }

    #[test]
    fn empty_population_ticks_without_dispatch() {
        let Some(gpu) = gpu() else { return };
        let mut controller = SimulationController::new(gpu);
        let mut rng = StdRng::seed_from_u64(2);
        let log: ApplyLog = Rc::new(RefCell::new(Vec::new()));
        controller
            .initialize(&SimulationConfig::default(), 0, &mut rng, recording_factory(&log))
            .unwrap();
        controller.tick(0.016).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn tick_applies_every_agent_in_index_order() {
        let Some(gpu) = gpu() else { return };
        let mut controller = SimulationController::new(gpu);
        let mut rng = StdRng::seed_from_u64(3);
        let log: ApplyLog = Rc::new(RefCell::new(Vec::new()));
        const N: usize = 300; // spans two thread groups' worth of lanes
        controller
            .initialize(
                &SimulationConfig::default(),
                N as u32,
                &mut rng,
                recording_factory(&log),
            )
            .unwrap();

        // Initialization pushes the spawn state into every sink once.
        assert_eq!(log.borrow().len(), N);
        log.borrow_mut().clear();

        controller.tick(0.016).unwrap();
        controller.tick(0.016).unwrap();

        let entries = log.borrow();
        assert_eq!(entries.len(), 2 * N);
        for tick_index in 0..2 {
            for i in 0..N {
                assert_eq!(entries[tick_index * N + i].0, i);
            }
        }
    }

    #[test]
    fn update_parameters_applies_before_next_tick() {
        let Some(gpu) = gpu() else { return };
        let mut controller = SimulationController::new(gpu);
        let mut rng = StdRng::seed_from_u64(4);
        let log: ApplyLog = Rc::new(RefCell::new(Vec::new()));
        controller
            .initialize(&SimulationConfig::default(), 16, &mut rng, recording_factory(&log))
            .unwrap();

        let bad = SimulationConfig {
            separation_distance: 50.0,
            ..Default::default()
        };
        assert!(matches!(
            controller.update_parameters(&bad),
            Err(SimulationError::InvalidConfig(_))
        ));
        assert_eq!(controller.state(), Lifecycle::Running);

        let slower = SimulationConfig {
            speed: 0.5,
            ..Default::default()
        };
        controller.update_parameters(&slower).unwrap();
        controller.tick(0.016).unwrap();
    }

    #[test]
    fn end_to_end_stub_kernel_respects_velocity_clamp() {
        let Some(gpu) = gpu() else { return };
        let mut controller = SimulationController::new(gpu);
        let config = SimulationConfig {
            alignment_distance: 10.0,
            separation_distance: 5.0,
            separation_weight: 1.0,
            sight_angle_deg: 90.0,
            max_velocity_magnitude: 5.0,
            speed: 2.0,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let log: ApplyLog = Rc::new(RefCell::new(Vec::new()));
        controller
            .initialize_with_kernel(&config, 4, &mut rng, recording_factory(&log), STUB_KERNEL)
            .unwrap();
        log.borrow_mut().clear();

        controller.tick(0.016).unwrap();

        let entries = log.borrow();
        assert_eq!(entries.len(), 4);
        for (i, (index, record)) in entries.iter().enumerate() {
            assert_eq!(*index, i);
            assert!(magnitude(record.velocity) <= config.max_velocity_magnitude);
            assert_eq!(record.velocity, [2.5, 0.0, 0.0]);
            // Index-stable: the stub stamps each agent with its own index.
            assert_eq!(record.position[0], i as f32);
            assert!((record.position[1] - 2.5 * 0.016).abs() < 1e-6);
        }
    }

    #[test]
    fn real_kernel_keeps_velocity_under_limit() {
        let Some(gpu) = gpu() else { return };
        let mut controller = SimulationController::new(gpu);
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(6);
        let log: ApplyLog = Rc::new(RefCell::new(Vec::new()));
        controller
            .initialize(&config, 64, &mut rng, recording_factory(&log))
            .unwrap();
        log.borrow_mut().clear();

        for _ in 0..10 {
            controller.tick(0.016).unwrap();
        }
        for (_, record) in log.borrow().iter() {
            assert!(magnitude(record.velocity) <= config.max_velocity_magnitude + 1e-4);
        }
    }
}
