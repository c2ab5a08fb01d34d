//! Bounded fan-out used by both pipelines.

use rayon::{prelude::*, ThreadPoolBuilder};

use crate::error::Result;

/// Apply `f` to every item using at most `jobs` workers.
///
/// Results keep input order. With `jobs <= 1` items are processed one after
/// another and nothing runs after the first error; otherwise the first error
/// observed is returned and remaining work is abandoned.
pub fn map_bounded<T, R, F>(jobs: usize, items: &[T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync + Send,
{
    if jobs <= 1 || items.len() <= 1 {
        return items.iter().map(f).collect();
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(jobs.min(items.len()))
        .thread_name(|index| format!("pobexport-worker-{index}"))
        .build()?;
    pool.install(|| items.par_iter().map(f).collect())
}
