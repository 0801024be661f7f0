//! Recycling pool of fixed-size byte regions.
//!
//! [`BufferPool`] keeps a bounded free list of regions of a single size class
//! ([`DEFAULT_BUFFER_SIZE`]). A [`Region`] acquired from the pool remembers
//! its home and returns there when dropped, so the storage goes back exactly
//! once no matter which handle ends up owning it. Moving a region moves that
//! obligation with it; regions allocated by buffer growth are ordinary heap
//! allocations and never enter the pool.

use std::{
    fmt,
    num::NonZeroUsize,
    ops::{Deref, DerefMut},
    sync::{
        Arc,
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

use crossbeam_queue::ArrayQueue;

use crate::metrics;

/// Size of each pooled region in bytes.
///
/// A typical `ClientHello` including its record header is around 520 bytes,
/// so one region usually holds the whole first read.
pub const DEFAULT_BUFFER_SIZE: usize = 768;

const DEFAULT_MAX_RETAINED: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

/// Snapshot of a pool's acquire/release counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Regions handed out by [`BufferPool::acquire`].
    pub acquired: u64,
    /// Regions returned to the pool.
    pub released: u64,
}

impl PoolStats {
    /// Regions currently held outside the pool.
    #[must_use]
    pub fn outstanding(&self) -> u64 { self.acquired.saturating_sub(self.released) }
}

/// Thread-safe free list of fixed-size byte regions.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use sni_peek::pool::BufferPool;
///
/// let pool = Arc::new(BufferPool::new());
/// let region = pool.acquire();
/// assert_eq!(pool.stats().outstanding(), 1);
/// drop(region);
/// assert_eq!(pool.stats().outstanding(), 0);
/// ```
pub struct BufferPool {
    free: ArrayQueue<Box<[u8]>>,
    acquired: AtomicU64,
    released: AtomicU64,
}

impl BufferPool {
    /// Create a pool retaining up to 1024 idle regions.
    #[must_use]
    pub fn new() -> Self { Self::with_max_retained(DEFAULT_MAX_RETAINED) }

    /// Create a pool retaining up to `max_retained` idle regions.
    ///
    /// Regions returned while the free list is full are deallocated; they
    /// still count as released.
    #[must_use]
    pub fn with_max_retained(max_retained: NonZeroUsize) -> Self {
        Self {
            free: ArrayQueue::new(max_retained.get()),
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Shared process-wide pool used when no pool is supplied explicitly.
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<BufferPool>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Take a region from the free list, allocating one if it is empty.
    #[must_use]
    pub fn acquire(self: &Arc<Self>) -> Region {
        let storage = self
            .free
            .pop()
            .unwrap_or_else(|| vec![0; DEFAULT_BUFFER_SIZE].into_boxed_slice());
        self.acquired.fetch_add(1, Ordering::Relaxed);
        metrics::inc_pool_outstanding();
        Region {
            storage,
            home: Some(Arc::clone(self)),
        }
    }

    fn release(&self, storage: Box<[u8]>) {
        self.released.fetch_add(1, Ordering::Relaxed);
        metrics::dec_pool_outstanding();
        // A full free list simply lets the storage drop.
        let _ = self.free.push(storage);
    }

    /// Current acquire/release counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }

    /// Number of idle regions waiting in the free list.
    #[must_use]
    pub fn idle(&self) -> usize { self.free.len() }
}

impl Default for BufferPool {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.free.len())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Exclusively owned byte storage, optionally on loan from a [`BufferPool`].
pub struct Region {
    storage: Box<[u8]>,
    home: Option<Arc<BufferPool>>,
}

impl Region {
    /// Allocate zeroed storage that does not belong to any pool.
    #[must_use]
    pub fn unpooled(len: usize) -> Self {
        Self {
            storage: vec![0; len].into_boxed_slice(),
            home: None,
        }
    }

    /// Size of the storage in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize { self.storage.len() }

    /// Returns true if dropping this region returns it to a pool.
    #[must_use]
    pub fn is_pooled(&self) -> bool { self.home.is_some() }
}

impl Deref for Region {
    type Target = [u8];

    fn deref(&self) -> &Self::Target { &self.storage }
}

impl DerefMut for Region {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.storage }
}

impl Drop for Region {
    fn drop(&mut self) {
        if let Some(pool) = self.home.take() {
            pool.release(std::mem::take(&mut self.storage));
        }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("capacity", &self.capacity())
            .field("pooled", &self.is_pooled())
            .finish()
    }
}
