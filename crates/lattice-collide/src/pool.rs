//! Worker pool for the parallel broad/narrow phase.
//!
//! The pool wraps a dedicated rayon thread pool. [`WorkerPool::run_partitioned`]
//! hands every part but the last to a pool thread and runs the last one on
//! the calling thread, then blocks until all parts are done. Nothing spawned
//! here outlives the call.

use std::ops::Range;

use crate::EngineError;

/// A fixed-size thread pool plus the calling thread.
pub struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
    threads: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

impl WorkerPool {
    /// Spawn `threads` pool threads. Zero means everything runs on the caller.
    pub fn new(threads: usize) -> Result<Self, EngineError> {
        let pool = if threads == 0 {
            None
        } else {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("lattice-collide-{i}"))
                    .build()?,
            )
        };
        Ok(Self { pool, threads })
    }

    /// Number of pool threads, not counting the caller.
    #[inline]
    pub fn size(&self) -> usize {
        self.threads
    }

    /// Total participants in a parallel region: pool threads plus the caller.
    #[inline]
    pub fn participants(&self) -> usize {
        self.threads + 1
    }

    /// Run `work` once per element of `parts`, in parallel, and wait for all
    /// of them. Each invocation gets exclusive access to its own part.
    pub fn run_partitioned<T, F>(&self, parts: &mut [T], work: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync,
    {
        let Some((own, rest)) = parts.split_last_mut() else {
            return;
        };
        match &self.pool {
            Some(pool) if !rest.is_empty() => pool.in_place_scope(|scope| {
                let work = &work;
                for part in rest {
                    scope.spawn(move |_| work(part));
                }
                work(own);
            }),
            _ => {
                for part in rest {
                    work(part);
                }
                work(own);
            }
        }
    }
}

/// Split `0..len` into at most `parts` contiguous, non-empty ranges whose
/// sizes differ by at most one.
///
/// ```
/// use lattice_collide::pool::partition_ranges;
/// assert_eq!(partition_ranges(10, 3), vec![0..4, 4..7, 7..10]);
/// assert_eq!(partition_ranges(2, 5), vec![0..1, 1..2]);
/// assert!(partition_ranges(0, 4).is_empty());
/// ```
pub fn partition_ranges(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.clamp(1, len.max(1));
    if len == 0 {
        return Vec::new();
    }
    let base = len / parts;
    let extra = len % parts;
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let size = base + usize::from(i < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_everything_once() {
        for len in 0..50 {
            for parts in 1..10 {
                let ranges = partition_ranges(len, parts);
                let mut next = 0;
                for r in &ranges {
                    assert_eq!(r.start, next);
                    assert!(!r.is_empty());
                    next = r.end;
                }
                assert_eq!(next, len);
                assert!(ranges.len() <= parts);
            }
        }
    }

    #[test]
    fn zero_parts_is_treated_as_one() {
        assert_eq!(partition_ranges(5, 0), vec![0..5]);
    }

    #[test]
    fn run_partitioned_visits_every_part() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.size(), 3);
        assert_eq!(pool.participants(), 4);
        let mut parts: Vec<(usize, usize)> = (0..4).map(|i| (i, 0)).collect();
        pool.run_partitioned(&mut parts, |(i, out)| *out = *i * 10);
        assert_eq!(parts, vec![(0, 0), (1, 10), (2, 20), (3, 30)]);
    }

    #[test]
    fn zero_thread_pool_runs_on_caller() {
        let pool = WorkerPool::new(0).unwrap();
        let caller = std::thread::current().id();
        let mut parts = vec![None; 3];
        pool.run_partitioned(&mut parts, |slot| *slot = Some(std::thread::current().id()));
        assert!(parts.iter().all(|id| *id == Some(caller)));
    }

    #[test]
    fn empty_parts_is_a_noop() {
        let pool = WorkerPool::new(2).unwrap();
        let mut parts: Vec<u32> = Vec::new();
        pool.run_partitioned(&mut parts, |_| unreachable!());
    }
}
