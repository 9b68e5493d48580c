//! Bounded memoization over pool slots.
//!
//! A [`SlotCache`] remembers which key filled which pool slot, so repeated
//! requests for the same key hand back the same handle instead of filling a
//! new slot. When every slot is resident, admitting a new key evicts the
//! least recently used entry and reuses its slot; handles to the evicted
//! entry turn stale through the usual generation check.
//!
//! This is intended for small, fixed working sets such as glyph or geometry
//! atlases, where the slot position doubles as a stable identifier for data
//! kept elsewhere (a texture cell, a vertex-buffer range). Keys are found by
//! a linear scan over the resident entries, which outperforms hashing at
//! the capacities this is meant for.

use core::borrow::Borrow;
use core::cell::Cell;
use core::fmt::{self, Debug, Formatter};

use crate::handle::{DefaultHandle, Handle};
use crate::pool::fixed::FixedPool;
use crate::storage::Storage;

/// A resident key-value pair, together with the recency stamp used for
/// eviction.
///
/// Exposed only so that backing buffers for caches can be declared; all
/// interaction goes through a [`SlotCache`].
pub struct CacheEntry<K, T> {
    key: K,
    stamp: Cell<u64>,
    value: T,
}

impl<K: Debug, T: Debug> Debug for CacheEntry<K, T> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("stamp", &self.stamp.get())
            .field("value", &self.value)
            .finish()
    }
}

/// A bounded cache memoizing which key filled which pool slot.
///
/// See the [module documentation](crate::cache) for more.
///
/// # Examples
/// ```
/// use slotpool::InlineSlotCache;
///
/// let mut widths = InlineSlotCache::<char, u32, 2>::new();
///
/// let a = widths.get_or_insert_with('a', |_, _| 7);
/// assert_eq!(widths.get_or_insert_with('a', |_, _| unreachable!()), a);
///
/// widths.get_or_insert_with('b', |_, _| 8);
/// widths.get_or_insert_with('c', |_, _| 9);
///
/// // 'a' was the least recently used entry, so it had to make room.
/// assert!(!widths.contains(a));
/// assert_eq!(widths.get(&'a'), None);
/// ```
pub struct SlotCache<K, T, S: Storage<CacheEntry<K, T>, H>, H: Handle = DefaultHandle> {
    pool: FixedPool<CacheEntry<K, T>, S, H>,
    clock: Cell<u64>,
}

impl<K, T, S: Storage<CacheEntry<K, T>, H>, H: Handle> From<S> for SlotCache<K, T, S, H> {
    /// Converts a backing buffer into an empty cache.
    ///
    /// # Panics
    /// Panics if `buf.capacity() >= H::MAX_INDEX`.
    fn from(buf: S) -> Self {
        SlotCache {
            pool: FixedPool::from(buf),
            clock: Cell::new(0),
        }
    }
}

impl<K: Eq, T, S: Storage<CacheEntry<K, T>, H>, H: Handle> SlotCache<K, T, S, H> {
    fn tick(&self) -> u64 {
        let now = self.clock.get() + 1;
        self.clock.set(now);
        now
    }

    /// Returns the number of entries the cache can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Returns the number of currently resident entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Returns [`true`] if no entries are resident.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Returns the handle for `key` if it is resident, marking the entry as
    /// most recently used.
    pub fn get<Q: Borrow<K>>(&self, key: &Q) -> Option<H> {
        let (handle, entry) = self
            .pool
            .iter()
            .find(|(_, entry)| entry.key == *key.borrow())?;
        entry.stamp.set(self.tick());
        Some(handle)
    }

    /// Returns the handle for `key`, admitting the key on a miss.
    ///
    /// On a miss, `fill` is called with the handle the new entry will
    /// occupy and with the key. When no slot is vacant, the least recently
    /// used resident entry is evicted first; handles to it become stale.
    ///
    /// # Panics
    /// Panics if the cache has capacity 0.
    ///
    /// # Examples
    /// ```
    /// use slotpool::InlineSlotCache;
    ///
    /// let mut cache = InlineSlotCache::<u32, u32, 4>::new();
    /// let mut misses = 0;
    ///
    /// for &key in &[1, 2, 1, 1, 3] {
    ///     cache.get_or_insert_with(key, |_, &k| {
    ///         misses += 1;
    ///         k * 100
    ///     });
    /// }
    ///
    /// assert_eq!(misses, 3);
    /// ```
    pub fn get_or_insert_with<F: FnOnce(H, &K) -> T>(&mut self, key: K, fill: F) -> H {
        if let Some(handle) = self.get(&key) {
            return handle;
        }

        if self.pool.is_full() {
            let victim = self
                .pool
                .iter()
                .min_by_key(|(_, entry)| entry.stamp.get())
                .map(|(handle, _)| handle);
            if let Some(victim) = victim {
                self.pool.remove(victim);
            }
        }

        let stamp = Cell::new(self.tick());
        self.pool.insert_with_handle(|handle| {
            let value = fill(handle, &key);
            CacheEntry { key, stamp, value }
        })
    }

    /// Returns [`true`] if the specified handle refers to a resident entry.
    pub fn contains(&self, handle: H) -> bool {
        self.pool.contains(handle)
    }

    /// Returns a reference to the cached value for the specified handle.
    ///
    /// Does not mark the entry as used; resolve by key to refresh recency.
    pub fn value(&self, handle: H) -> Option<&T> {
        self.pool.get(handle).map(|entry| &entry.value)
    }

    /// Returns a mutable reference to the cached value for the specified
    /// handle.
    ///
    /// Does not mark the entry as used; resolve by key to refresh recency.
    pub fn value_mut(&mut self, handle: H) -> Option<&mut T> {
        self.pool.get_mut(handle).map(|entry| &mut entry.value)
    }

    /// Evicts every resident entry. This invalidates all handles.
    pub fn clear(&mut self) {
        self.pool.clear();
    }
}

impl<K: Debug, T: Debug, S: Storage<CacheEntry<K, T>, H>, H: Handle> Debug
    for SlotCache<K, T, S, H>
{
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("SlotCache")
            .field("clock", &self.clock.get())
            .field("entries", &self.pool)
            .finish()
    }
}

impl<K: Eq, T, const N: usize> crate::InlineSlotCache<K, T, N> {
    /// Constructs a new, empty cache backed by
    /// [`InlineStorage`](crate::storage::InlineStorage).
    pub fn new() -> Self {
        SlotCache::from(crate::storage::InlineStorage::new())
    }
}

impl<K: Eq, T, const N: usize> Default for crate::InlineSlotCache<K, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
impl<K: Eq, T, H: Handle> crate::AllocSlotCache<K, T, H> {
    /// Constructs a new, empty cache of the specified capacity, backed by a
    /// heap-allocated buffer.
    ///
    /// # Panics
    /// Panics if `capacity >= H::MAX_INDEX`.
    pub fn with_capacity(capacity: usize) -> Self {
        SlotCache {
            pool: FixedPool::with_capacity(capacity),
            clock: Cell::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use crate::handle::Handle;
    use crate::InlineSlotCache;

    #[test]
    fn hits_reuse_the_filled_slot() {
        let mut cache = InlineSlotCache::<u32, u32, 4>::new();
        let mut fills = 0;

        let first = cache.get_or_insert_with(7, |_, &k| {
            fills += 1;
            k * 2
        });
        let second = cache.get_or_insert_with(7, |_, _| unreachable!());

        assert_eq!(first, second);
        assert_eq!(fills, 1);
        assert_eq!(cache.value(first), Some(&14));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fill_sees_the_final_handle() {
        let mut cache = InlineSlotCache::<u32, _, 4>::new();
        let handle = cache.get_or_insert_with(1, |h, &k| (h, k));
        assert_eq!(cache.value(handle), Some(&(handle, 1)));
    }

    #[test]
    fn eviction_picks_the_least_recently_used_entry() {
        let mut cache = InlineSlotCache::<u32, u32, 3>::new();

        let h1 = cache.get_or_insert_with(1, |_, &k| k);
        let h2 = cache.get_or_insert_with(2, |_, &k| k);
        let h3 = cache.get_or_insert_with(3, |_, &k| k);

        // Refresh 1, making 2 the eviction candidate.
        assert_eq!(cache.get(&1), Some(h1));

        let h4 = cache.get_or_insert_with(4, |_, &k| k);
        assert_eq!(h4.into_raw_parts().0, h2.into_raw_parts().0);
        assert!(!cache.contains(h2));
        assert_eq!(cache.get(&2), None);

        assert!(cache.contains(h1));
        assert!(cache.contains(h3));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut cache = InlineSlotCache::<u32, u32, 2>::new();
        let h = cache.get_or_insert_with(1, |_, &k| k);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains(h));

        let h2 = cache.get_or_insert_with(1, |_, &k| k);
        assert_ne!(h, h2);
    }

    #[test]
    fn randomized_against_lru_model() {
        use rand::{rngs::SmallRng, Rng, SeedableRng};

        use crate::test_utils::RNG_SEED;

        const CAPACITY: usize = 4;

        let mut rng = SmallRng::from_seed(RNG_SEED);
        let mut cache = InlineSlotCache::<u32, u32, CAPACITY>::new();

        // Most recently used keys at the back.
        let mut model: Vec<u32> = Vec::new();

        for _ in 0..1_000 {
            let key = rng.gen_range(0..8);
            let modeled_hit = model.iter().position(|&k| k == key);

            let mut filled = false;
            let handle = cache.get_or_insert_with(key, |_, &k| {
                filled = true;
                k * 10
            });

            match modeled_hit {
                Some(position) => {
                    assert!(!filled);
                    model.remove(position);
                }
                None => {
                    assert!(filled);
                    if model.len() == CAPACITY {
                        model.remove(0);
                    }
                }
            }
            model.push(key);

            assert_eq!(cache.value(handle), Some(&(key * 10)));
            assert_eq!(cache.len(), model.len());
            for &resident in &model {
                assert!(cache.get(&resident).is_some());
            }
        }
    }
}
