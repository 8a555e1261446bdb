//! Recycling pools of frequency tables.
//!
//! Each value kind gets its own [`RecyclingPool`]. Collectors running
//! concurrently on the same shard acquire tables from the pool and hand them
//! back when dropped, so steady-state queries do not allocate a fresh hash
//! table per facet. The pool never waits: if its lock is contended, acquire
//! allocates and release discards.

use std::hash::Hash;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Term value to number of occurrences.
pub type FrequencyTable<T> = AHashMap<T, u32>;

/// Configuration for facet table pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of idle tables each pool retains.
    pub max_retained: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig { max_retained: 64 }
    }
}

/// A pool of empty frequency tables for one value kind.
#[derive(Debug)]
pub struct RecyclingPool<T> {
    tables: Mutex<Vec<FrequencyTable<T>>>,
    max_retained: usize,
}

impl<T: Eq + Hash> RecyclingPool<T> {
    pub fn new(config: &PoolConfig) -> Self {
        RecyclingPool {
            tables: Mutex::new(Vec::new()),
            max_retained: config.max_retained,
        }
    }

    /// Take an empty table, reusing an idle one when available.
    pub fn acquire(self: &Arc<Self>) -> PooledTable<T> {
        let recycled = self.tables.try_lock().and_then(|mut tables| tables.pop());
        let table = match recycled {
            Some(table) => table,
            None => {
                tracing::trace!("facet pool empty or contended, allocating table");
                FrequencyTable::default()
            }
        };
        debug_assert!(table.is_empty());

        PooledTable {
            table,
            pool: Arc::clone(self),
        }
    }

    /// Clear `table` and keep it for reuse.
    ///
    /// Never waits for the lock: if it is contended, or the pool already
    /// retains `max_retained` tables, the table is dropped instead.
    pub fn release(&self, mut table: FrequencyTable<T>) {
        table.clear();
        match self.tables.try_lock() {
            Some(mut tables) if tables.len() < self.max_retained => tables.push(table),
            Some(_) => {}
            None => tracing::trace!("facet pool contended, dropping table"),
        }
    }

    /// Number of idle tables held.
    pub fn idle(&self) -> usize {
        self.tables.lock().len()
    }
}

/// A frequency table on loan from a [`RecyclingPool`].
///
/// Dropping the guard returns the table to its pool, including when a
/// collection pass is abandoned part way.
#[derive(Debug)]
pub struct PooledTable<T: Eq + Hash> {
    table: FrequencyTable<T>,
    pool: Arc<RecyclingPool<T>>,
}

impl<T: Eq + Hash> Deref for PooledTable<T> {
    type Target = FrequencyTable<T>;

    fn deref(&self) -> &Self::Target {
        &self.table
    }
}

impl<T: Eq + Hash> DerefMut for PooledTable<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.table
    }
}

impl<T: Eq + Hash> Drop for PooledTable<T> {
    fn drop(&mut self) {
        let table = std::mem::take(&mut self.table);
        self.pool.release(table);
    }
}

/// One pool per supported value kind.
#[derive(Debug)]
pub struct FacetPools {
    pub(crate) byte: Arc<RecyclingPool<i8>>,
    pub(crate) short: Arc<RecyclingPool<i16>>,
    pub(crate) int: Arc<RecyclingPool<i32>>,
    pub(crate) long: Arc<RecyclingPool<i64>>,
}

impl FacetPools {
    pub fn new(config: &PoolConfig) -> Self {
        FacetPools {
            byte: Arc::new(RecyclingPool::new(config)),
            short: Arc::new(RecyclingPool::new(config)),
            int: Arc::new(RecyclingPool::new(config)),
            long: Arc::new(RecyclingPool::new(config)),
        }
    }

    /// The pool for values of kind `T`.
    pub fn pool<T: crate::field::TermValue>(&self) -> &Arc<RecyclingPool<T>> {
        T::pool(self)
    }
}

impl Default for FacetPools {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}
