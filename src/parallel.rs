//! Row-parallel dispatch.
//!
//! Every filter writes its destination as a set of disjoint row bands, so the
//! only scheduling primitive needed is "call `f` once per band of this slice".
//! [`RowExecutor`] does that on a bounded rayon pool and returns once every band
//! has been processed. Panics inside a band function propagate to the caller.
//!
//! A process-wide executor sized from the `PIXELWORKS_THREADS` environment variable backs the
//! filter entry points. [`configure`] and [`set_threads`] rebuild it behind a
//! write lock, so a resize waits for in-flight dispatches to finish.

use std::ops::Range;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::config::{default_worker_threads, env_config, set_channel_order, EngineConfig};
use crate::error::{FilterError, FilterResult};

/// Bounded worker pool dispatching row bands.
///
/// Without a pool (see [`RowExecutor::inline`]) every band runs on the calling
/// thread in order.
#[derive(Debug)]
pub struct RowExecutor {
    pool: Option<ThreadPool>,
    threads: usize,
}

impl RowExecutor {
    /// Executor with the default worker count.
    pub fn new() -> FilterResult<Self> {
        Self::with_threads(default_worker_threads())
    }

    /// Executor with exactly `threads` workers.
    pub fn with_threads(threads: usize) -> FilterResult<Self> {
        if threads == 0 {
            return Err(FilterError::InvalidParameter("worker count must be > 0".into()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pixelworks-{i}"))
            .build()?;
        debug!(threads, "row executor started");
        Ok(Self { pool: Some(pool), threads })
    }

    /// Executor that runs everything on the calling thread.
    pub fn inline() -> Self {
        Self { pool: None, threads: 1 }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Rebuild the pool with a new worker count.
    ///
    /// Takes `&mut self`, so no dispatch can be running on this executor; the old
    /// pool's workers are joined when it drops.
    pub fn resize(&mut self, threads: usize) -> FilterResult<()> {
        if self.pool.is_some() && threads == self.threads {
            return Ok(());
        }
        *self = Self::with_threads(threads)?;
        Ok(())
    }

    /// Call `f(row, row_slice)` for every `row_len`-element row of `dst`.
    pub fn rows<T, F>(&self, dst: &mut [T], row_len: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        self.bands(dst, row_len, 1, f);
    }

    /// Call `f(first_row, band)` for every band of `stride` rows of `dst`.
    ///
    /// The last band is shorter when the row count is not a multiple of `stride`.
    pub fn bands<T, F>(&self, dst: &mut [T], row_len: usize, stride: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        assert!(stride > 0, "band stride must be positive");
        if row_len == 0 || dst.is_empty() {
            return;
        }
        let chunk = row_len * stride;
        match &self.pool {
            Some(pool) => pool.install(|| {
                dst.par_chunks_mut(chunk)
                    .enumerate()
                    .for_each(|(i, band)| f(i * stride, band));
            }),
            None => dst
                .chunks_mut(chunk)
                .enumerate()
                .for_each(|(i, band)| f(i * stride, band)),
        }
    }

    /// Call `f(row)` for every `stride`-th row index of `range`.
    pub fn for_each<F>(&self, range: Range<usize>, stride: usize, f: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        assert!(stride > 0, "row stride must be positive");
        match &self.pool {
            Some(pool) => pool.install(|| range.into_par_iter().step_by(stride).for_each(&f)),
            None => range.step_by(stride).for_each(f),
        }
    }
}

// ============================================================================
// Process-wide executor
// ============================================================================

static EXECUTOR: OnceLock<RwLock<RowExecutor>> = OnceLock::new();

fn global() -> &'static RwLock<RowExecutor> {
    EXECUTOR.get_or_init(|| {
        let executor = RowExecutor::with_threads(env_config().worker_threads).unwrap_or_else(|err| {
            warn!(%err, "falling back to inline row execution");
            RowExecutor::inline()
        });
        RwLock::new(executor)
    })
}

fn write_global() -> RwLockWriteGuard<'static, RowExecutor> {
    // A band function panicking while a dispatch held the read lock does not
    // leave the executor itself inconsistent.
    global().write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared executor used by the filter entry points.
///
/// Hold the guard only for the duration of one dispatch.
pub fn executor() -> RwLockReadGuard<'static, RowExecutor> {
    global().read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Apply `config` process-wide: resize the shared executor to
/// `config.worker_threads` and make `config.channel_order` the stream byte order.
pub fn configure(config: &EngineConfig) -> FilterResult<()> {
    set_threads(config.worker_threads)?;
    set_channel_order(config.channel_order);
    Ok(())
}

/// Resize the shared executor, waiting for running dispatches to drain first.
pub fn set_threads(threads: usize) -> FilterResult<()> {
    write_global().resize(threads)
}

/// Worker count of the shared executor.
pub fn current_threads() -> usize {
    executor().threads()
}
