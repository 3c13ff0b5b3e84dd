//! Value Cache
//!
//! One cache per node: the last-known value plus the snapshot of upstream
//! generations observed when that value was produced. Staleness is decided by
//! comparing the snapshot against current upstream generations — never by
//! comparing values, since equality of arbitrary numeric results is not
//! assumed cheap.
//!
//! Writes are atomic from the caller's perspective: the graph only calls
//! `write` after a compute body has succeeded, so a failed speculative
//! recomputation never corrupts a previously valid value.

use smallvec::SmallVec;

use crate::value::Value;

/// Generation snapshot, positional per `NodeRef` argument.
///
/// Most compute bodies take a handful of arguments; four slots inline covers
/// the common case without allocation.
pub(crate) type GenSnapshot = SmallVec<[u64; 4]>;

/// Stores the last-known value of one computed quantity.
#[derive(Debug, Default)]
pub struct ValueCache {
    value: Option<Value>,
    upstream_gens: GenSnapshot,
}

impl ValueCache {
    /// An empty, never-written cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored value, or `None` if never populated. The graph layer maps
    /// absence to `UninitializedCache`.
    pub fn read(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Replace the stored value and record the upstream generations it was
    /// produced from. No side effects beyond the cache itself.
    pub fn write(&mut self, value: Value, upstream_gens: &[u64]) {
        self.value = Some(value);
        self.upstream_gens = GenSnapshot::from_slice(upstream_gens);
    }

    /// True if this cache has never been written, or if any upstream
    /// generation has moved past the snapshot recorded at the last write.
    ///
    /// `current` must be positional: one entry per `NodeRef` argument, in
    /// binding order. Constants contribute no entry and can never go stale.
    pub fn is_stale(&self, current: &[u64]) -> bool {
        self.value.is_none() || self.upstream_gens.as_slice() != current
    }

    /// Whether the cache has ever been populated.
    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }
}
