//! Simulation driver: feeds synthetic flows through the bundle and tallies
//! frames per egress link.
//!
//! A run has two phases:
//! - Uniform: one frame per generated flow. Expect a roughly even spread.
//! - Elephant: a few flows from the population replayed many times, added on
//!   top of the uniform tallies. Flow-level balancing keeps each elephant on
//!   a single link, so the bundle skews.

mod tally;

pub use tally::{LinkTally, TallyStats};

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::bundle::{EgressAssignment, LinkBundle};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::flow::{pick_elephants, FlowDescriptor, FlowGenerator, FlowRecord};
use crate::hashing::HashPolicy;

/// Tallies after one simulation phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub name: &'static str,
    /// Frames fed through the pipeline during this phase.
    pub frames: u64,
    /// Cumulative per-link counts at the end of the phase.
    pub tally: LinkTally,
    pub stats: TallyStats,
}

impl PhaseReport {
    fn new(name: &'static str, frames: u64, tally: LinkTally) -> Self {
        let stats = tally.stats();
        Self {
            name,
            frames,
            tally,
            stats,
        }
    }
}

/// An elephant flow and where it landed.
#[derive(Debug, Clone, Serialize)]
pub struct ElephantFlow {
    pub flow: FlowRecord,
    pub assignment: EgressAssignment,
    pub frames: u64,
}

/// Outcome of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub active_links: u16,
    pub max_supported_links: u16,
    pub policy: HashPolicy,
    pub seed: u64,
    pub flows: usize,
    pub uniform: PhaseReport,
    pub elephant: PhaseReport,
    pub elephants: Vec<ElephantFlow>,
    /// Time spent inside hash-and-pick, summed over worker threads.
    #[serde(serialize_with = "serialize_millis", rename = "hashing_time_ms")]
    pub hashing_time: Duration,
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// Simulation engine.
#[derive(Debug, Clone)]
pub struct Simulation {
    bundle: LinkBundle,
    flows: usize,
    elephant_flows: usize,
    elephant_frames: u64,
    seed: u64,
    workers: usize,
    chunk_size: usize,
    pool: Arc<rayon::ThreadPool>,
}

impl Simulation {
    /// Build a simulation from validated configuration.
    ///
    /// Without a configured seed, one is drawn from OS entropy and recorded
    /// in the report so the run can be replayed.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let bundle = LinkBundle::new(
            config.bundle.max_supported_links,
            config.bundle.active_links,
        )?
        .with_policy(config.bundle.hash_policy);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.simulation.workers)
            .thread_name(|i| format!("linkagg-sim-{i}"))
            .build()
            .map_err(|e| Error::Other(anyhow::anyhow!("failed to create worker pool: {e}")))?;

        Ok(Self {
            bundle,
            flows: config.traffic.flows,
            elephant_flows: config.traffic.elephant_flows,
            elephant_frames: config.traffic.elephant_frames,
            seed: config.traffic.seed.unwrap_or_else(rand::random),
            workers: config.simulation.workers,
            chunk_size: config.simulation.chunk_size,
            pool: Arc::new(pool),
        })
    }

    pub fn bundle(&self) -> &LinkBundle {
        &self.bundle
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate the flow population and run both phases.
    pub fn run(&self) -> Result<SimulationReport> {
        if self.bundle.is_down() {
            return Err(Error::NoAvailableLinks);
        }

        let mut generator = FlowGenerator::seeded(self.seed);
        let flows = generator.generate(self.flows);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(1));
        let elephants = pick_elephants(&flows, self.elephant_flows, &mut rng);

        self.run_with(&flows, &elephants)
    }

    /// Run both phases over a given population and elephant set.
    pub fn run_with(
        &self,
        flows: &[FlowDescriptor],
        elephants: &[FlowDescriptor],
    ) -> Result<SimulationReport> {
        if self.bundle.is_down() {
            return Err(Error::NoAvailableLinks);
        }

        info!(
            flows = flows.len(),
            active = self.bundle.active(),
            max = self.bundle.max_supported(),
            policy = %self.bundle.policy(),
            workers = self.workers,
            "starting uniform phase"
        );
        let mut tally = LinkTally::new(self.bundle.active());
        let mut hashing_time = self.tally_frames(flows, &mut tally)?;
        let uniform = PhaseReport::new("uniform", flows.len() as u64, tally.clone());
        info!(
            std_dev = uniform.stats.std_dev,
            imbalance = uniform.stats.imbalance,
            "uniform phase complete"
        );

        info!(
            elephants = elephants.len(),
            frames_each = self.elephant_frames,
            "starting elephant phase"
        );
        // Every replayed frame of a flow hashes identically, so one pick per
        // elephant covers all of its frames.
        let start = Instant::now();
        let assignments = elephants
            .iter()
            .map(|flow| self.bundle.assign(flow))
            .collect::<Result<Vec<_>>>()?;
        hashing_time += start.elapsed();
        for assignment in &assignments {
            tally.record_many(assignment.link, self.elephant_frames);
        }
        let elephant = PhaseReport::new(
            "elephant",
            elephants.len() as u64 * self.elephant_frames,
            tally,
        );
        info!(
            std_dev = elephant.stats.std_dev,
            imbalance = elephant.stats.imbalance,
            "elephant phase complete"
        );

        let elephants = elephants
            .iter()
            .zip(assignments)
            .map(|(flow, assignment)| ElephantFlow {
                flow: flow.record(),
                assignment,
                frames: self.elephant_frames,
            })
            .collect();

        Ok(SimulationReport {
            active_links: self.bundle.active(),
            max_supported_links: self.bundle.max_supported(),
            policy: self.bundle.policy(),
            seed: self.seed,
            flows: flows.len(),
            uniform,
            elephant,
            elephants,
            hashing_time,
        })
    }

    /// Assign every frame and add the results to `tally`.
    ///
    /// Frames are cut into `chunk_size` chunks and counted on the worker
    /// pool. Returns the time spent hashing and picking, summed over chunks.
    pub fn tally_frames(&self, frames: &[FlowDescriptor], tally: &mut LinkTally) -> Result<Duration> {
        let active = self.bundle.active();
        let (counted, hashing_time) = self.pool.install(|| {
            frames
                .par_chunks(self.chunk_size.max(1))
                .map(|chunk| -> Result<(LinkTally, Duration)> {
                    let mut local = LinkTally::new(active);
                    let start = Instant::now();
                    for flow in chunk {
                        local.record(self.bundle.assign(flow)?.link);
                    }
                    Ok((local, start.elapsed()))
                })
                .try_reduce(
                    || (LinkTally::new(active), Duration::ZERO),
                    |(mut merged, elapsed), (local, more)| {
                        merged.merge(&local);
                        Ok((merged, elapsed + more))
                    },
                )
        })?;

        debug!(
            frames = frames.len(),
            threads = self.pool.current_num_threads(),
            "frames tallied"
        );
        tally.merge(&counted);
        Ok(hashing_time)
    }
}
