//! Loader configuration.

use crate::get_cpu_count;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// A cloneable, thread-safe configuration of a [`DirectoryLoader`](super::DirectoryLoader).
///
/// # Example
///
/// ```rust
/// use geocat::loader::LoaderConfig;
///
/// let config = LoaderConfig::new()
///     .with_parallelism(4)
///     .with_commit_on_finish(false);
/// assert_eq!(config.parallelism(), 4);
/// ```
#[derive(Clone)]
pub struct LoaderConfig {
    inner: Arc<LoaderConfigInner>,
}

struct LoaderConfigInner {
    /// Worker threads of the load pool (0 = one per CPU).
    parallelism: AtomicUsize,

    /// Whether the full-text mirror is committed after the load.
    commit_on_finish: AtomicBool,
}

impl LoaderConfig {
    /// Defaults: one worker per CPU, commit when done.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LoaderConfigInner {
                parallelism: AtomicUsize::new(0),
                commit_on_finish: AtomicBool::new(true),
            }),
        }
    }

    /// Number of worker threads, resolving 0 to the CPU count.
    #[inline]
    pub fn parallelism(&self) -> usize {
        match self.inner.parallelism.load(Ordering::Relaxed) {
            0 => get_cpu_count(),
            n => n,
        }
    }

    #[inline]
    pub fn set_parallelism(&self, n: usize) {
        self.inner.parallelism.store(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn with_parallelism(self, n: usize) -> Self {
        self.set_parallelism(n);
        self
    }

    #[inline]
    pub fn commit_on_finish(&self) -> bool {
        self.inner.commit_on_finish.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_commit_on_finish(&self, commit: bool) {
        self.inner.commit_on_finish.store(commit, Ordering::Relaxed);
    }

    #[inline]
    pub fn with_commit_on_finish(self, commit: bool) -> Self {
        self.set_commit_on_finish(commit);
        self
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}
