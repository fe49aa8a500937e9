//! Size-gated batch execution.
//!
//! Small batches run on the calling thread; batches at or above the threshold fan out
//! over a rayon pool built for that call only and dropped when it returns.

use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;
use crate::utils::create_progress_bar;

/// Item count at which a batch switches to the worker pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    pub parallel_threshold: usize,
    /// Worker pool size; `None` uses the number of available CPU cores
    pub workers: Option<usize>,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    Parallel,
}

impl DispatchPolicy {
    pub fn strategy_for(&self, item_count: usize) -> Strategy {
        if item_count < self.parallel_threshold {
            Strategy::Sequential
        } else {
            Strategy::Parallel
        }
    }

    fn build_pool(&self) -> Result<ThreadPool> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers.unwrap_or(0))
            .thread_name(|index| format!("mask2rle-worker-{}", index))
            .build()?;
        Ok(pool)
    }
}

/// Apply `op` to every item and return one result per item, in input order.
///
/// A failing item does not stop its siblings. The only error returned directly is a
/// failure to build the worker pool.
pub fn apply_batch<I, O, E, F>(
    items: Vec<I>,
    policy: &DispatchPolicy,
    label: &str,
    op: F,
) -> Result<Vec<std::result::Result<O, E>>>
where
    I: Send,
    O: Send,
    E: Send,
    F: Fn(I) -> std::result::Result<O, E> + Sync + Send,
{
    let pb = create_progress_bar(items.len() as u64, label);

    let results = match policy.strategy_for(items.len()) {
        Strategy::Sequential => {
            debug!("[{}] running {} item(s) sequentially", label, items.len());
            items
                .into_iter()
                .map(|item| {
                    let result = op(item);
                    pb.inc(1);
                    result
                })
                .collect()
        }
        Strategy::Parallel => {
            let pool = policy.build_pool()?;
            info!(
                "[{}] running {} item(s) on {} worker(s)",
                label,
                items.len(),
                pool.current_num_threads()
            );
            // Indexed parallel iterators collect in input order regardless of completion order
            pool.install(|| {
                items
                    .into_par_iter()
                    .map(|item| {
                        let result = op(item);
                        pb.inc(1);
                        result
                    })
                    .collect()
            })
        }
    };

    pb.finish_with_message(format!("{} complete", label));
    Ok(results)
}
