#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]

//! Generation-checked object pools with stable handles.
//!
//! A pool hands out an opaque [`Handle`] for every inserted value instead of
//! a reference. The handle packs the slot index together with the slot's
//! generation count at the time of issue; every access re-checks both, so a
//! handle kept across a removal is reliably detected as stale, even after
//! the slot has been reused for a new value. This makes handles safe to
//! store across structural mutations, in places where references would be
//! ruled out by the borrow checker or dangle in spirit: scene nodes keeping
//! track of their neighbors, render primitives addressed across frames,
//! widgets referring to their children.
//!
//! Insertion and removal are constant-time: vacant slots are threaded into
//! an intrusive free list, and removal pushes the freed slot back onto it.
//!
//! # Pool flavors
//!
//! - [`FixedPool`] holds its slots in a caller-chosen [`storage`] block
//!   (inline, borrowed, or heap-allocated) and reports exhaustion by
//!   handing the rejected value back; see [`InlinePool`], [`SlicePool`],
//!   and [`AllocPool`].
//! - [`GrowablePool`] (`alloc` feature) appends fresh slots when its free
//!   list runs dry and never reports exhaustion.
//! - [`SlotCache`] layers a bounded, least-recently-used memoization policy
//!   over a fixed pool, for key-addressed working sets like glyph atlases.
//!
//! # Crate features
//!
//! - `alloc`: enables the heap-backed storage and pool types. The crate is
//!   `no_std` and dependency-free either way.

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod cache;
pub mod handle;
pub mod pool;
pub mod storage;

pub use crate::cache::{CacheEntry, SlotCache};
pub use crate::handle::{Capacity, DefaultHandle, Handle};
pub use crate::pool::fixed::FixedPool;
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub use crate::pool::growable::GrowablePool;
pub use crate::pool::Slot;

use crate::storage::InlineStorage;

/// A fixed-capacity pool that stores its slots in an inline array, indexed
/// by [`DefaultHandle`].
///
/// # Examples
/// ```
/// use slotpool::InlinePool;
///
/// const A: u128 = 0x0123_4567_89AB_CDEF_0123_4567_89AB_CDEF;
/// const B: u128 = 0xFEDC_BA98_7654_3210_FEDC_BA98_7654_3210;
///
/// let mut pool = InlinePool::<u128, 8>::new();
/// let a = pool.insert(A);
/// let b = pool.insert(B);
/// assert_eq!(pool.len(), 2);
/// assert_eq!(pool.remove(a), Some(A));
/// assert_eq!(pool.remove(b), Some(B));
/// assert!(pool.is_empty());
/// ```
pub type InlinePool<T, const N: usize> =
    FixedPool<T, InlineStorage<T, DefaultHandle, N>, DefaultHandle>;

/// A fixed-capacity pool that stores its slots in an inline array, indexed
/// by the specified custom [`Handle`].
///
/// # Examples
/// ```
/// use slotpool::{handle_type, TiInlinePool};
///
/// handle_type! { NodeHandle: u8 / u32; }
///
/// let mut pool = TiInlinePool::<&'static str, NodeHandle, 16>::new();
/// let root: NodeHandle = pool.insert("root");
/// assert_eq!(pool[root], "root");
/// ```
pub type TiInlinePool<T, H, const N: usize> = FixedPool<T, InlineStorage<T, H, N>, H>;

/// A fixed-capacity pool that borrows its slots from a caller-provided
/// buffer.
///
/// # Examples
/// ```
/// use slotpool::{Slot, SlicePool};
///
/// let mut backing: [Slot<u32, u32>; 4] = core::array::from_fn(|_| Slot::default());
/// let mut pool = SlicePool::<u32>::from(&mut backing[..]);
///
/// let h = pool.insert(42);
/// assert_eq!(pool[h], 42);
/// assert_eq!(pool.capacity(), 4);
/// ```
pub type SlicePool<'a, T, H = DefaultHandle> =
    FixedPool<T, crate::storage::SliceStorage<'a, T, H>, H>;

/// A fixed-capacity pool that stores its slots in a heap-allocated buffer.
///
/// Note that this still has a fixed capacity, and will never reallocate.
///
/// # Examples
/// ```
/// use slotpool::AllocPool;
///
/// let mut pool = AllocPool::<u128>::with_capacity(4);
/// assert_eq!(pool.capacity(), 4);
///
/// pool.insert(1);
/// pool.insert(2);
/// pool.insert(3);
/// pool.insert(4);
/// assert_eq!(pool.try_insert(5), Err(5));
/// ```
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub type AllocPool<T, H = DefaultHandle> =
    FixedPool<T, crate::storage::AllocStorage<T, H>, H>;

/// A bounded cache that stores its entries in an inline array, indexed by
/// [`DefaultHandle`].
///
/// # Examples
/// ```
/// use slotpool::InlineSlotCache;
///
/// let mut cache = InlineSlotCache::<char, u32, 8>::new();
/// let h = cache.get_or_insert_with('q', |_, _| 17);
/// assert_eq!(cache.value(h), Some(&17));
/// ```
pub type InlineSlotCache<K, T, const N: usize> =
    SlotCache<K, T, InlineStorage<CacheEntry<K, T>, DefaultHandle, N>, DefaultHandle>;

/// A bounded cache that stores its entries in a heap-allocated buffer.
///
/// # Examples
/// ```
/// use slotpool::AllocSlotCache;
///
/// let mut cache = AllocSlotCache::<&'static str, usize>::with_capacity(3);
/// let h = cache.get_or_insert_with("alpha", |_, k| k.len());
/// assert_eq!(cache.value(h), Some(&5));
/// ```
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub type AllocSlotCache<K, T, H = DefaultHandle> =
    SlotCache<K, T, crate::storage::AllocStorage<CacheEntry<K, T>, H>, H>;

#[cfg(test)]
pub(crate) mod test_utils {
    use core::cell::Cell;

    pub(crate) const RNG_SEED: [u8; 32] = [
        0xB4, 0x6F, 0x37, 0x05, 0x5C, 0x3A, 0xE0, 0x0A, 0x41, 0x92, 0x2D, 0xD1, 0x77, 0x5E, 0xAA,
        0x3C, 0x86, 0x09, 0xF2, 0x41, 0x6E, 0xB8, 0x50, 0x13, 0x4B, 0x98, 0xC7, 0xE4, 0x1F, 0x26,
        0x8D, 0x75,
    ];

    pub(crate) struct DropCounter {
        dropped: Cell<usize>,
    }

    impl DropCounter {
        pub(crate) fn new() -> Self {
            DropCounter {
                dropped: Cell::new(0),
            }
        }

        pub(crate) fn dropped(&self) -> usize {
            self.dropped.get()
        }

        pub(crate) fn new_droppable<T>(&self, value: T) -> Droppable<'_, T> {
            Droppable {
                value,
                counter: self,
            }
        }
    }

    pub(crate) struct Droppable<'a, T> {
        pub(crate) value: T,
        counter: &'a DropCounter,
    }

    impl<T> Drop for Droppable<'_, T> {
        fn drop(&mut self) {
            let count = self.counter.dropped.get();
            self.counter.dropped.set(count + 1);
        }
    }
}
