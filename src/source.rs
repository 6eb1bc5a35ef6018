//! Trajectory sources: anything that can turn a batch of seeds into orbits.
//!
//! Every source fills a [`TrajectoryBatch`] with the same layout the GPU kernel
//! writes: one step count per seed, and a flat array where seed `i` owns the
//! `limit` values starting at `i * limit`.

use log::{info, trace};
use rayon::prelude::{
    IndexedParallelIterator, IntoParallelRefIterator, IntoParallelRefMutIterator,
    ParallelIterator, ParallelSliceMut,
};

use crate::{complex::Complex, error::Error, orbit::record_trajectory};

/// Reusable output slab for one dispatch.
///
/// Allocated once for the widest batch and the largest limit; each dispatch
/// uses a prefix of it.
pub struct TrajectoryBatch {
    capacity_seeds: usize,
    capacity_limit: u32,
    seed_count: usize,
    limit: u32,
    steps: Vec<u32>,
    points: Vec<Complex>,
}

impl TrajectoryBatch {
    pub fn with_capacity(seeds: usize, max_limit: u32) -> Self {
        Self {
            capacity_seeds: seeds,
            capacity_limit: max_limit,
            seed_count: 0,
            limit: 0,
            steps: vec![0; seeds],
            points: vec![Complex::ZERO; seeds * max_limit as usize],
        }
    }

    /// Resize the active region for `seeds` seeds at `limit` and hand out the
    /// step and point slots for a source to fill.
    pub fn prepare(
        &mut self,
        seeds: usize,
        limit: u32,
    ) -> Result<(&mut [u32], &mut [Complex]), Error> {
        if seeds > self.capacity_seeds || limit > self.capacity_limit {
            return Err(Error::BatchTooLarge {
                seeds,
                limit,
                capacity_seeds: self.capacity_seeds,
                capacity_limit: self.capacity_limit,
            });
        }
        self.seed_count = seeds;
        self.limit = limit;
        Ok((
            &mut self.steps[..seeds],
            &mut self.points[..seeds * limit as usize],
        ))
    }

    pub fn len(&self) -> usize {
        self.seed_count
    }

    pub fn is_empty(&self) -> bool {
        self.seed_count == 0
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn steps(&self) -> &[u32] {
        &self.steps[..self.seed_count]
    }

    /// The orbit recorded for seed `index`, or `None` if it used its whole
    /// budget without escaping. Such orbits must not be accumulated.
    pub fn trajectory(&self, index: usize) -> Option<&[Complex]> {
        let steps = self.steps[index];
        if steps >= self.limit {
            return None;
        }
        let start = index * self.limit as usize;
        Some(&self.points[start..start + steps as usize])
    }
}

pub trait TrajectorySource {
    fn name(&self) -> &'static str;

    /// Iterate every seed up to `limit`, filling `batch`. Blocks until all
    /// seeds are done.
    fn trace(
        &mut self,
        seeds: &[Complex],
        limit: u32,
        batch: &mut TrajectoryBatch,
    ) -> Result<(), Error>;
}

impl<S: TrajectorySource + ?Sized> TrajectorySource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn trace(
        &mut self,
        seeds: &[Complex],
        limit: u32,
        batch: &mut TrajectoryBatch,
    ) -> Result<(), Error> {
        (**self).trace(seeds, limit, batch)
    }
}

/// One seed after another on the calling thread.
pub struct ScalarSource {
    escape_radius: f32,
}

impl ScalarSource {
    pub fn new(escape_radius: f32) -> Self {
        Self { escape_radius }
    }
}

impl TrajectorySource for ScalarSource {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn trace(
        &mut self,
        seeds: &[Complex],
        limit: u32,
        batch: &mut TrajectoryBatch,
    ) -> Result<(), Error> {
        let (steps, points) = batch.prepare(seeds.len(), limit)?;
        if limit == 0 {
            steps.fill(0);
            return Ok(());
        }

        for ((steps, trajectory), seed) in steps
            .iter_mut()
            .zip(points.chunks_mut(limit as usize))
            .zip(seeds)
        {
            *steps = record_trajectory(*seed, limit, self.escape_radius, trajectory);
        }
        Ok(())
    }
}

/// Seeds spread over a `rayon` pool with one worker per CPU. Each worker
/// writes only the slab slice of the seed it is iterating.
pub struct ThreadedSource {
    escape_radius: f32,
    pool: rayon::ThreadPool,
}

impl ThreadedSource {
    pub fn new(escape_radius: f32) -> Result<Self, Error> {
        let threads = num_cpus::get();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("trajectory-{index}"))
            .build()?;
        info!("tracing trajectories on {} threads", threads);
        Ok(Self {
            escape_radius,
            pool,
        })
    }
}

impl TrajectorySource for ThreadedSource {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn trace(
        &mut self,
        seeds: &[Complex],
        limit: u32,
        batch: &mut TrajectoryBatch,
    ) -> Result<(), Error> {
        trace!("begin threaded trace (limit {})", limit);

        let (steps, points) = batch.prepare(seeds.len(), limit)?;
        if limit == 0 {
            steps.fill(0);
            return Ok(());
        }

        let escape_radius = self.escape_radius;
        self.pool.install(|| {
            steps
                .par_iter_mut()
                .zip(points.par_chunks_mut(limit as usize))
                .zip(seeds.par_iter())
                .for_each(|((steps, trajectory), seed)| {
                    *steps = record_trajectory(*seed, limit, escape_radius, trajectory);
                });
        });

        trace!("end threaded trace");
        Ok(())
    }
}
