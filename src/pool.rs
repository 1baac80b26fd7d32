//! Reusable storage for parse and encode cycles.
//!
//! [`Pools`] keeps free lists of node arrays, property index maps, encoder
//! scratch buffers, root values and byte buffers. Every free list sits behind
//! its own [`parking_lot::Mutex`], so any number of threads may acquire and
//! release concurrently without caller-visible locking.
//!
//! Items are only handed out empty. A checked-out item belongs to exactly one
//! owner until it is released again.

use std::{
    collections::HashMap,
    mem,
    sync::{
        LazyLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{PoolConfig, Value};

pub(crate) type NodeArray = Vec<Value<'static>>;
pub(crate) type IndexMap = HashMap<&'static [u8], usize>;
pub(crate) type Scratch = Box<[u8; PoolConfig::SCRATCH_LEN]>;

/// Byte buffers larger than this are dropped instead of retained.
const MAX_RETAINED_BUFFER: usize = 1 << 20;

static GLOBAL: LazyLock<Pools> = LazyLock::new(Pools::default);

struct FreeList<T> {
    items: Mutex<Vec<T>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<T> FreeList<T> {
    fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn take(&self) -> Option<T> {
        let item = self.items.lock().pop();
        match item {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        item
    }

    #[inline]
    fn put(&self, item: T, max_retained: usize) {
        let mut items = self.items.lock();
        if items.len() < max_retained {
            items.push(item);
        }
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            idle: self.items.lock().len(),
        }
    }
}

/// Counters of a single free list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Acquisitions served from the free list.
    pub hits: usize,
    /// Acquisitions that had to allocate.
    pub misses: usize,
    /// Items currently waiting in the free list.
    pub idle: usize,
}

/// A snapshot of every free list in a [`Pools`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub node_arrays: PoolStats,
    pub index_maps: PoolStats,
    pub scratch: PoolStats,
    pub values: PoolStats,
    pub buffers: PoolStats,
}

/// The pool manager.
///
/// Most callers use the process-wide [`Pools::global`]. Tests and callers
/// that want isolated accounting construct their own with [`Pools::new`] and
/// pass it through [`Parser::with_pools`](crate::Parser::with_pools),
/// [`Encoder::with_pools`](crate::Encoder::with_pools) or
/// [`Binder::new`](crate::Binder::new).
///
/// # Example
///
/// ```
/// use na_json::{Parser, PoolConfig, Pools};
///
/// let pools = Pools::new(PoolConfig::new().node_array_capacity(8));
/// let parser = Parser::with_pools(&pools);
///
/// let mut data = br#"[1,2,3]"#.to_vec();
/// let mut value = parser.parse(&mut data).unwrap();
/// assert_eq!(value.len(), 3);
/// value.recycle_into(&pools);
///
/// assert_eq!(pools.stats().node_arrays.idle, 1);
/// ```
pub struct Pools {
    config: PoolConfig,
    node_arrays: FreeList<NodeArray>,
    index_maps: FreeList<IndexMap>,
    scratch: FreeList<Scratch>,
    values: FreeList<Box<Value<'static>>>,
    buffers: FreeList<Vec<u8>>,
}

impl Default for Pools {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl std::fmt::Debug for Pools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pools")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Pools {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            node_arrays: FreeList::new(),
            index_maps: FreeList::new(),
            scratch: FreeList::new(),
            values: FreeList::new(),
            buffers: FreeList::new(),
        }
    }

    /// The process-wide pools, created on first use.
    #[inline]
    pub fn global() -> &'static Pools {
        &GLOBAL
    }

    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn stats(&self) -> Stats {
        Stats {
            node_arrays: self.node_arrays.stats(),
            index_maps: self.index_maps.stats(),
            scratch: self.scratch.stats(),
            values: self.values.stats(),
            buffers: self.buffers.stats(),
        }
    }

    /// Takes a cleared root value from the pool.
    ///
    /// Pair with [`release_value`](Self::release_value) once the tree is no
    /// longer needed.
    pub fn acquire_value<'a>(&self) -> Box<Value<'a>> {
        match self.values.take() {
            Some(value) => value,
            None => {
                tracing::trace!("value pool miss");
                Box::default()
            }
        }
    }

    /// Recycles the whole tree and returns the root to the pool.
    pub fn release_value(&self, mut value: Box<Value<'_>>) {
        value.recycle_into(self);
        value.reset();
        // SAFETY: after `reset` the value holds no spans, children or index,
        // so nothing in it borrows from `'_`.
        let value = unsafe { mem::transmute::<Box<Value<'_>>, Box<Value<'static>>>(value) };
        self.values.put(value, self.config.max_retained);
    }

    pub(crate) fn take_node_array<'a>(&self) -> Vec<Value<'a>> {
        match self.node_arrays.take() {
            Some(array) => array,
            None => {
                tracing::trace!(
                    capacity = self.config.node_array_capacity,
                    "node array pool miss"
                );
                Vec::with_capacity(self.config.node_array_capacity)
            }
        }
    }

    pub(crate) fn put_node_array(&self, mut array: Vec<Value<'_>>) {
        array.clear();
        if array.capacity() != self.config.node_array_capacity {
            return;
        }
        // SAFETY: the array is empty, so no element borrows from `'_`.
        let array = unsafe { mem::transmute::<Vec<Value<'_>>, NodeArray>(array) };
        self.node_arrays.put(array, self.config.max_retained);
    }

    pub(crate) fn take_index_map<'a>(&self) -> HashMap<&'a [u8], usize> {
        self.index_maps.take().unwrap_or_default()
    }

    pub(crate) fn put_index_map(&self, mut map: HashMap<&'_ [u8], usize>) {
        map.clear();
        // SAFETY: the map is empty, so no key borrows from `'_`.
        let map = unsafe { mem::transmute::<HashMap<&'_ [u8], usize>, IndexMap>(map) };
        self.index_maps.put(map, self.config.max_retained);
    }

    pub(crate) fn take_scratch(&self) -> Scratch {
        self.scratch
            .take()
            .unwrap_or_else(|| Box::new([0; PoolConfig::SCRATCH_LEN]))
    }

    pub(crate) fn put_scratch(&self, scratch: Scratch) {
        self.scratch.put(scratch, self.config.max_retained);
    }

    pub(crate) fn take_buffer(&self) -> Vec<u8> {
        self.buffers.take().unwrap_or_default()
    }

    pub(crate) fn put_buffer(&self, mut buffer: Vec<u8>) {
        if buffer.capacity() > MAX_RETAINED_BUFFER {
            return;
        }
        buffer.clear();
        self.buffers.put(buffer, self.config.max_retained);
    }
}
