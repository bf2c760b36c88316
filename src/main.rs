// Murmuration - GPU-Resident Boid Flocking Driver
// Licensed under MIT License

//! Headless demo driver: runs the simulation for a fixed number of ticks
//! and logs flock statistics.
//!
//! Usage: `murmuration [config.json] [population_count]`

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use murmuration::{
    AgentRecord, GpuContext, SimulationConfig, SimulationController, VisualSink,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const TICKS: u32 = 600;
const DT: f32 = 1.0 / 60.0;

#[derive(Default)]
struct FlockStats {
    count: u32,
    position_sum: [f32; 3],
    speed_sum: f32,
}

impl FlockStats {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn centroid(&self) -> [f32; 3] {
        let n = self.count.max(1) as f32;
        [
            self.position_sum[0] / n,
            self.position_sum[1] / n,
            self.position_sum[2] / n,
        ]
    }

    fn mean_speed(&self) -> f32 {
        self.speed_sum / self.count.max(1) as f32
    }
}

/// Stand-in for a renderable transform: instead of moving a mesh it folds
/// each record into shared flock statistics.
struct StatsSink {
    stats: Rc<RefCell<FlockStats>>,
}

impl VisualSink for StatsSink {
    fn apply(&mut self, record: AgentRecord) {
        let mut stats = self.stats.borrow_mut();
        stats.count += 1;
        for axis in 0..3 {
            stats.position_sum[axis] += record.position[axis];
        }
        let v = record.velocity;
        stats.speed_sum += (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    }
}

fn main() -> anyhow::Result<()> {
    use env_logger::Env;
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimulationConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        None => SimulationConfig::default(),
    };
    let population: u32 = args
        .next()
        .map(|raw| raw.parse())
        .transpose()
        .context("population count must be a non-negative integer")?
        .unwrap_or(1024);

    let gpu = GpuContext::new()?;
    let mut controller = SimulationController::new(gpu);

    let stats = Rc::new(RefCell::new(FlockStats::default()));
    let mut rng = StdRng::from_entropy();
    controller.initialize(&config, population, &mut rng, |_index| {
        Box::new(StatsSink {
            stats: Rc::clone(&stats),
        }) as Box<dyn VisualSink>
    })?;

    for frame in 1..=TICKS {
        stats.borrow_mut().reset();
        controller.tick(DT)?;
        if frame % 60 == 0 {
            let stats = stats.borrow();
            let [cx, cy, cz] = stats.centroid();
            log::info!(
                "frame {frame}: centroid ({cx:.2}, {cy:.2}, {cz:.2}), mean speed {:.3}",
                stats.mean_speed()
            );
        }
    }

    controller.dispose();
    Ok(())
}
