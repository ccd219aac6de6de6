use std::fmt::Debug;

use crate::error::Result;

/// A unit of work handed to a scheduler.
pub type Job<'a> = Box<dyn FnOnce() -> Result<()> + Send + 'a>;

/// Trait for fork-join executors that run independent jobs to completion.
///
/// Jobs share no mutable state, so they may run in any order and on any
/// thread. `run` returns once every job has finished, or with the first
/// error observed.
pub trait Scheduler: Send + Sync + Debug {
    /// Returns the name of this scheduler (e.g., "sequential", "rayon").
    fn name(&self) -> &str;

    /// Number of threads jobs may be spread over.
    fn num_threads(&self) -> usize;

    /// Run every job in `jobs`.
    fn run<'a>(&self, jobs: Vec<Job<'a>>) -> Result<()>;
}

/// Runs jobs one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialScheduler;

impl Scheduler for SequentialScheduler {
    fn name(&self) -> &str {
        "sequential"
    }

    fn num_threads(&self) -> usize {
        1
    }

    fn run<'a>(&self, jobs: Vec<Job<'a>>) -> Result<()> {
        jobs.into_iter().try_for_each(|job| job())
    }
}

/// Runs jobs on a rayon thread pool.
#[cfg(feature = "parallel")]
#[derive(Debug, Default)]
pub struct RayonScheduler {
    pool: Option<rayon::ThreadPool>,
}

#[cfg(feature = "parallel")]
impl RayonScheduler {
    /// Use rayon's global pool.
    pub fn new() -> Self {
        RayonScheduler { pool: None }
    }

    /// Use a dedicated pool of `num_threads` threads.
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| crate::error::PrepackError::Configuration(e.to_string()))?;
        Ok(RayonScheduler { pool: Some(pool) })
    }
}

#[cfg(feature = "parallel")]
impl Scheduler for RayonScheduler {
    fn name(&self) -> &str {
        "rayon"
    }

    fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn run<'a>(&self, jobs: Vec<Job<'a>>) -> Result<()> {
        use rayon::prelude::*;

        let exec = move || jobs.into_par_iter().try_for_each(|job| job());
        match &self.pool {
            Some(pool) => pool.install(exec),
            None => exec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepackError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_jobs(counter: &AtomicUsize, n: usize) -> Vec<Job<'_>> {
        (0..n)
            .map(|_| {
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }) as Job<'_>
            })
            .collect()
    }

    #[test]
    fn test_sequential_runs_all() {
        let counter = AtomicUsize::new(0);
        SequentialScheduler.run(counting_jobs(&counter, 5)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(SequentialScheduler.num_threads(), 1);
    }

    #[test]
    fn test_sequential_propagates_error() {
        let jobs: Vec<Job<'_>> = vec![
            Box::new(|| Ok(())),
            Box::new(|| Err(PrepackError::Configuration("boom".to_string()))),
        ];
        assert!(SequentialScheduler.run(jobs).is_err());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_rayon_runs_all() {
        let counter = AtomicUsize::new(0);
        let scheduler = RayonScheduler::with_threads(3).unwrap();
        assert_eq!(scheduler.num_threads(), 3);
        scheduler.run(counting_jobs(&counter, 64)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 64);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_rayon_global_pool() {
        let counter = AtomicUsize::new(0);
        let scheduler = RayonScheduler::new();
        assert_eq!(scheduler.name(), "rayon");
        scheduler.run(counting_jobs(&counter, 8)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }
}
