//! Lock-free object pool for batch storage
//!
//! Row vectors and encode buffers are leased per batch and returned once the
//! batch is encoded, so steady-state copying does not allocate. The pool is a
//! bounded `ArrayQueue`: `get` pops or allocates, `put` clears and pushes or
//! drops when full.
//!
//! # Example
//!
//! ```
//! use clickload_bulk::pool::BufferPool;
//!
//! let pool = BufferPool::new(4, 1024);
//! let mut buf = pool.get();
//! buf.extend_from_slice(b"payload");
//! pool.put(buf);
//! assert_eq!(pool.available(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use clickload_types::Row;
use crossbeam::queue::ArrayQueue;

/// Storage that can be cleared and reused
pub trait Reusable: Send {
    /// Allocate a fresh item with room for `capacity` elements
    fn allocate(capacity: usize) -> Self;

    /// Clear contents, keeping the allocation
    fn reset(&mut self);

    /// Current allocation size
    fn capacity(&self) -> usize;
}

impl<T: Send> Reusable for Vec<T> {
    fn allocate(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }
}

impl Reusable for BytesMut {
    fn allocate(capacity: usize) -> Self {
        BytesMut::with_capacity(capacity)
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn capacity(&self) -> usize {
        BytesMut::capacity(self)
    }
}

/// Pool of row vectors (one per in-flight batch)
pub type RowPool = Pool<Vec<Row>>;

/// Pool of encode buffers
pub type BufferPool = Pool<BytesMut>;

/// Lock-free pool of reusable items
pub struct Pool<T> {
    queue: ArrayQueue<T>,
    item_capacity: usize,
    metrics: PoolMetrics,
}

/// Pool usage counters
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Items served from the pool
    pub hits: AtomicU64,

    /// Items allocated because the pool was empty
    pub misses: AtomicU64,

    /// Items returned to the pool
    pub returns: AtomicU64,

    /// Items dropped (pool full or undersized)
    pub drops: AtomicU64,
}

impl PoolMetrics {
    pub const fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            drops: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PoolMetricsSnapshot {
        PoolMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PoolMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub drops: u64,
}

impl PoolMetricsSnapshot {
    /// Fraction of `get` calls served without allocating (1.0 when unused)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl<T: Reusable> Pool<T> {
    /// Create an empty pool that retains up to `pool_size` items
    ///
    /// Items are allocated on first use.
    pub fn new(pool_size: usize, item_capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(pool_size.max(1)),
            item_capacity,
            metrics: PoolMetrics::new(),
        }
    }

    /// Create a pool with every slot pre-allocated
    pub fn with_prefill(pool_size: usize, item_capacity: usize) -> Self {
        let pool = Self::new(pool_size, item_capacity);
        while !pool.queue.is_full() {
            if pool.queue.push(T::allocate(item_capacity)).is_err() {
                break;
            }
        }
        pool
    }

    /// Lease an item, allocating when the pool is empty
    #[inline]
    pub fn get(&self) -> T {
        match self.queue.pop() {
            Some(item) => {
                PoolMetrics::record(&self.metrics.hits);
                item
            }
            None => {
                PoolMetrics::record(&self.metrics.misses);
                T::allocate(self.item_capacity)
            }
        }
    }

    /// Return an item
    ///
    /// The item is cleared. Undersized items and items beyond the pool size
    /// are dropped.
    #[inline]
    pub fn put(&self, mut item: T) {
        item.reset();

        if item.capacity() < self.item_capacity {
            PoolMetrics::record(&self.metrics.drops);
            return;
        }

        match self.queue.push(item) {
            Ok(()) => PoolMetrics::record(&self.metrics.returns),
            Err(_) => PoolMetrics::record(&self.metrics.drops),
        }
    }

    /// Items currently idle in the pool
    #[inline]
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    /// Maximum number of idle items
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Capacity of each allocated item
    #[inline]
    pub fn item_capacity(&self) -> usize {
        self.item_capacity
    }

    #[inline]
    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
