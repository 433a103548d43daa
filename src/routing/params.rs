//! Captured route parameters and their buffer pool.
//!
//! # Responsibilities
//! - Hold the ordered (key, value) pairs captured by a lookup
//! - Recycle parameter buffers across requests
//! - Carry parameters into handlers via request extensions
//!
//! # Design Decisions
//! - Insertion order is left-to-right path order; lookup is a linear scan
//! - A pooled buffer goes back to its pool on drop, truncated to zero length
//! - Keys are `Arc<str>` shared with the tree, so a capture only allocates its value

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// One captured dynamic value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: Arc<str>,
    pub value: String,
}

impl Param {
    pub fn new(key: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered sequence of captured parameters.
///
/// Duplicate keys are allowed; [`Params::get`] returns the first one, so a
/// later entry with the same key is unreachable by name.
#[derive(Default)]
pub struct Params {
    buf: Vec<Param>,
    pool: Option<Arc<ParamsPool>>,
}

impl Params {
    /// Create an empty, unpooled buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unpooled buffer with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            pool: None,
        }
    }

    /// Append a captured value.
    pub fn push(&mut self, key: Arc<str>, value: impl Into<String>) {
        self.buf.push(Param {
            key,
            value: value.into(),
        });
    }

    /// First value recorded under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.buf
            .iter()
            .find(|p| &*p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Value recorded under `key`, or the empty string when absent.
    pub fn by_name(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Whether this buffer will be handed back to a pool on drop.
    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    /// Owned copy of the captured pairs.
    pub fn to_pairs(&self) -> Vec<(Arc<str>, String)> {
        self.buf
            .iter()
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect()
    }
}

impl Drop for Params {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(std::mem::take(&mut self.buf));
        }
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.buf.iter().map(|p| (p.key(), p.value())))
            .finish()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.buf.iter()
    }
}

/// Thread-safe pool of parameter buffers.
///
/// Buffers handed out by [`ParamsPool::acquire`] are empty and have room for
/// at least [`ParamsPool::capacity`] entries.
#[derive(Debug)]
pub struct ParamsPool {
    free: Mutex<Vec<Vec<Param>>>,
    capacity: AtomicUsize,
    max_idle: usize,
}

impl ParamsPool {
    /// Create a pool whose buffers hold `capacity` entries, keeping at most
    /// `max_idle` released buffers around.
    pub fn new(capacity: usize, max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity: AtomicUsize::new(capacity),
            max_idle,
        }
    }

    /// Raise the per-buffer capacity. Never shrinks.
    pub fn reserve(&self, capacity: usize) {
        self.capacity.fetch_max(capacity, Ordering::Relaxed);
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Number of released buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Take an empty buffer from the pool, allocating one if none is idle.
    pub fn acquire(self: &Arc<Self>) -> Params {
        let capacity = self.capacity();
        let recycled = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        let buf = match recycled {
            Some(mut buf) => {
                buf.clear();
                buf.reserve(capacity);
                buf
            }
            None => Vec::with_capacity(capacity),
        };

        Params {
            buf,
            pool: Some(Arc::clone(self)),
        }
    }

    fn release(&self, mut buf: Vec<Param>) {
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_idle {
            free.push(buf);
        }
    }
}

/// Parameters as seen by handlers, stored in the request extensions.
///
/// Cloning is cheap; the underlying buffer returns to its pool when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct RouteParams(Arc<Params>);

impl RouteParams {
    pub fn new(params: Params) -> Self {
        Self(Arc::new(params))
    }
}

impl Deref for RouteParams {
    type Target = Params;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(params: &Params) -> Vec<(&str, &str)> {
        params.iter().map(|p| (p.key(), p.value())).collect()
    }

    #[test]
    fn test_get_is_first_match() {
        let mut params = Params::new();
        params.push("id".into(), "1");
        params.push("id".into(), "2");
        params.push("name".into(), "bob");

        assert_eq!(params.get("id"), Some("1"));
        assert_eq!(params.get("name"), Some("bob"));
        assert_eq!(params.by_name("missing"), "");
        assert_eq!(pairs(&params), vec![("id", "1"), ("id", "2"), ("name", "bob")]);
    }

    #[test]
    fn test_pool_hands_out_clean_buffers() {
        let pool = Arc::new(ParamsPool::new(3, 8));

        let mut first = pool.acquire();
        first.push("a".into(), "1");
        first.push("b".into(), "2");
        first.push("c".into(), "3");
        drop(first);
        assert_eq!(pool.idle(), 1);

        let second = pool.acquire();
        assert!(second.is_empty());
        assert!(second.capacity() >= 3);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_pool_reserve_grows_capacity() {
        let pool = Arc::new(ParamsPool::new(1, 8));
        drop(pool.acquire());

        pool.reserve(4);
        pool.reserve(2);
        assert_eq!(pool.capacity(), 4);

        let params = pool.acquire();
        assert!(params.capacity() >= 4);
    }

    #[test]
    fn test_pool_bounds_idle_buffers() {
        let pool = Arc::new(ParamsPool::new(1, 2));
        let held: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
        drop(held);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_route_params_release_on_last_clone() {
        let pool = Arc::new(ParamsPool::new(1, 8));
        let mut params = pool.acquire();
        params.push("id".into(), "7");

        let shared = RouteParams::new(params);
        let clone = shared.clone();
        drop(shared);
        assert_eq!(pool.idle(), 0);
        assert_eq!(clone.by_name("id"), "7");

        drop(clone);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_unpooled_params_drop_quietly() {
        let mut params = Params::with_capacity(2);
        params.push("k".into(), "v");
        assert!(!params.is_pooled());
        assert_eq!(format!("{:?}", params), r#"{"k": "v"}"#);
    }
}
