//! Object pools that grow when their free list is exhausted.
//!
//! Vacant slots are reused first; only when none are left is a fresh slot
//! appended to the backing vector. Handles address slots by index, so the
//! reallocation this may cause never invalidates them.

use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};
use core::ops::{Index, IndexMut};

use super::{
    buffer_too_large_for_handle_type, release_at, Drain, Handles, Iter, IterMut, Slot, Values,
    ValuesMut, FIRST_GENERATION,
};
use crate::handle::{Capacity, DefaultHandle, Handle};

/// A growable object pool with generation-checked handles.
///
/// See the [module documentation](crate::pool) for an overview of pool-based
/// storage, and [this module's documentation](crate::pool::growable) for the
/// growth behavior of this variant.
///
/// # Examples
/// ```
/// use slotpool::GrowablePool;
///
/// let mut pool = GrowablePool::<&'static str>::new();
/// let a = pool.insert("anvil");
/// let b = pool.insert("bellows");
///
/// assert_eq!(pool[a], "anvil");
/// assert_eq!(pool.remove(b), Some("bellows"));
/// assert!(!pool.contains(b));
/// ```
pub struct GrowablePool<T, H: Handle = DefaultHandle> {
    slots: Vec<Slot<T, H::Index>>,
    len: H::Index,
    next_free_slot: H::Index,
}

impl<T, H: Handle> GrowablePool<T, H> {
    const FREE_LIST_END: usize = <H::Index as Capacity>::MAX_REPRESENTABLE;

    /// Constructs a new, empty pool without allocating.
    pub fn new() -> Self {
        GrowablePool {
            slots: Vec::new(),
            len: H::Index::from_usize(0),
            next_free_slot: H::Index::from_usize(Self::FREE_LIST_END),
        }
    }

    /// Constructs a new, empty pool with room for `capacity` values before
    /// the first reallocation.
    pub fn with_capacity(capacity: usize) -> Self {
        GrowablePool {
            slots: Vec::with_capacity(capacity),
            len: H::Index::from_usize(0),
            next_free_slot: H::Index::from_usize(Self::FREE_LIST_END),
        }
    }

    /// Returns the number of values currently in the pool.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.as_usize()
    }

    /// Returns [`true`] if the pool contains no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len.as_usize() == 0
    }

    /// Returns the total number of slots created so far, vacant or not.
    ///
    /// This count never decreases; it grows by one each time a value is
    /// inserted while the free list is empty.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of currently vacant slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.slots.len() - self.len.as_usize()
    }

    /// Reserves backing storage for at least `additional` more slots.
    ///
    /// No slots are created; this only moves an eventual reallocation
    /// forward in time.
    pub fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }

    /// Returns [`true`] if the specified handle is valid for this pool.
    ///
    /// # Examples
    /// ```
    /// use slotpool::GrowablePool;
    ///
    /// let mut pool = GrowablePool::<u128>::new();
    /// let h = pool.insert(0xDEAD_BEEF);
    /// assert!(pool.contains(h));
    /// pool.remove(h);
    /// assert!(!pool.contains(h));
    /// ```
    pub fn contains(&self, handle: H) -> bool {
        let (index, generation) = handle.into_raw_parts();
        self.slots
            .get(index)
            .map_or(false, |slot| slot.matches(generation))
    }

    /// Returns a reference to the value corresponding to the handle.
    ///
    /// Returns [`None`] if the handle is stale or refers to a removed value.
    pub fn get(&self, handle: H) -> Option<&T> {
        let (index, generation) = handle.into_raw_parts();
        self.slots.get(index)?.get(generation)
    }

    /// Returns a mutable reference to the value corresponding to the handle.
    ///
    /// Returns [`None`] under the same conditions as
    /// [`get`](GrowablePool::get).
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        let (index, generation) = handle.into_raw_parts();
        self.slots.get_mut(index)?.get_mut(generation)
    }

    /// Returns mutable references to the values corresponding to the
    /// specified handles.
    ///
    /// Returns [`None`] if any one of the handles is invalid, or if any two
    /// of them refer to the same slot.
    pub fn get_disjoint_mut<const N: usize>(&mut self, handles: [H; N]) -> Option<[&mut T; N]> {
        for (i, handle) in handles.iter().enumerate() {
            if !self.contains(*handle) {
                return None;
            }

            let (index, _) = handle.into_raw_parts();
            if handles[..i]
                .iter()
                .any(|prev| prev.into_raw_parts().0 == index)
            {
                return None;
            }
        }

        let slots = self.slots.as_mut_ptr();
        Some(handles.map(|handle| {
            let (index, _) = handle.into_raw_parts();
            // Validity and pairwise distinctness were checked above, so the
            // resulting references cannot alias.
            match unsafe { (*slots.add(index)).value_mut() } {
                Some(value) => value,
                None => unreachable!(),
            }
        }))
    }

    /// Inserts a value into the pool, returning a unique handle to access
    /// it.
    ///
    /// Reuses the most recently freed slot if one is available, and appends
    /// a fresh slot otherwise.
    ///
    /// # Panics
    /// Panics if the pool already manages `H::MAX_INDEX` slots.
    ///
    /// # Examples
    /// ```
    /// use slotpool::GrowablePool;
    ///
    /// let mut pool = GrowablePool::<u32>::new();
    /// let h = pool.insert(42);
    /// assert_eq!(pool[h], 42);
    /// assert_eq!(pool.slot_count(), 1);
    ///
    /// pool.remove(h);
    /// pool.insert(43);
    /// assert_eq!(pool.slot_count(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> H {
        let index = self.next_free_slot.as_usize();
        if index != Self::FREE_LIST_END {
            let slot = &mut self.slots[index];
            let generation = slot.generation();
            self.next_free_slot = slot.occupy(value);
            self.len = H::Index::from_usize(self.len.as_usize() + 1);
            return unsafe { H::new(index, generation) };
        }

        let index = self.slots.len();
        if index >= H::MAX_INDEX {
            buffer_too_large_for_handle_type::<H>();
        }

        self.slots.push(Slot::occupied(value));
        self.len = H::Index::from_usize(self.len.as_usize() + 1);
        unsafe { H::new(index, FIRST_GENERATION) }
    }

    /// Inserts a value given by `f` into the pool. The handle where the
    /// value will be stored is passed into `f`. This is useful for storing
    /// values containing their own handle.
    ///
    /// # Panics
    /// Panics if the pool already manages `H::MAX_INDEX` slots.
    pub fn insert_with_handle<F: FnOnce(H) -> T>(&mut self, f: F) -> H {
        let index = self.next_free_slot.as_usize();
        if index != Self::FREE_LIST_END {
            let handle = unsafe { H::new(index, self.slots[index].generation()) };
            let value = f(handle);

            let slot = &mut self.slots[index];
            self.next_free_slot = slot.occupy(value);
            self.len = H::Index::from_usize(self.len.as_usize() + 1);
            return handle;
        }

        let index = self.slots.len();
        if index >= H::MAX_INDEX {
            buffer_too_large_for_handle_type::<H>();
        }

        let handle = unsafe { H::new(index, FIRST_GENERATION) };
        self.slots.push(Slot::occupied(f(handle)));
        self.len = H::Index::from_usize(self.len.as_usize() + 1);
        handle
    }

    /// Removes the value referred to by the specified handle from the pool,
    /// returning it unless the handle is invalid. This invalidates the
    /// handle.
    ///
    /// The vacated slot is kept and reused by later insertions;
    /// [`slot_count`](GrowablePool::slot_count) is unaffected.
    ///
    /// # Examples
    /// ```
    /// use slotpool::GrowablePool;
    ///
    /// let mut pool = GrowablePool::<u128>::new();
    /// let h = pool.insert(42);
    /// assert_eq!(pool.remove(h), Some(42));
    /// assert_eq!(pool.remove(h), None);
    /// ```
    pub fn remove(&mut self, handle: H) -> Option<T> {
        let (index, generation) = handle.into_raw_parts();
        release_at(
            &mut self.slots,
            &mut self.len,
            &mut self.next_free_slot,
            index,
            generation,
            H::MAX_GENERATION,
        )
    }

    /// Retains only the values specified by the predicate.
    ///
    /// In other words, removes all handle-value pairs `(h, v)` such that
    /// `f(h, &mut v)` returns false. This method invalidates any removed
    /// handles.
    pub fn retain<F: FnMut(H, &mut T) -> bool>(&mut self, mut f: F) {
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            if let Some(generation) = slot.occupied_generation() {
                let handle = unsafe { H::new(index, generation) };
                let keep = slot.value_mut().map_or(true, |value| f(handle, value));
                if !keep {
                    release_at(
                        &mut self.slots,
                        &mut self.len,
                        &mut self.next_free_slot,
                        index,
                        generation,
                        H::MAX_GENERATION,
                    );
                }
            }
        }
    }

    /// Clears the pool, dropping all values. This invalidates all handles.
    ///
    /// All slots are kept and reused by later insertions.
    pub fn clear(&mut self) {
        self.drain().for_each(drop);
    }

    /// Creates an iterator visiting all handle-value pairs in storage order,
    /// yielding `(H, &'a T)`.
    ///
    /// The iterator is double-ended, so `rev` visits the pool in reverse
    /// storage order.
    pub fn iter(&self) -> Iter<'_, T, H> {
        Iter::new(&self.slots, self.len.as_usize())
    }

    /// Creates an iterator visiting all handle-value pairs in storage order,
    /// yielding `(H, &'a mut T)`.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, H> {
        IterMut::new(&mut self.slots, self.len.as_usize())
    }

    /// Creates an iterator yielding all valid handles in storage order.
    pub fn handles(&self) -> Handles<'_, T, H> {
        Handles { iter: self.iter() }
    }

    /// Creates an iterator yielding references to all stored values in
    /// storage order.
    pub fn values(&self) -> Values<'_, T, H> {
        Values { iter: self.iter() }
    }

    /// Creates an iterator yielding mutable references to all stored values
    /// in storage order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, T, H> {
        ValuesMut {
            iter: self.iter_mut(),
        }
    }

    /// Creates a draining iterator that removes all values from the pool
    /// and yields them with their handles in storage order.
    ///
    /// When the iterator is dropped, all remaining elements are removed
    /// from the pool, even if the iterator was not fully consumed. All
    /// slots are kept.
    pub fn drain(&mut self) -> Drain<'_, T, H> {
        let GrowablePool {
            slots,
            len,
            next_free_slot,
        } = self;
        Drain::new(slots, len, next_free_slot)
    }
}

impl<T, H: Handle> Default for GrowablePool<T, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, H: Handle> Index<H> for GrowablePool<T, H> {
    type Output = T;

    fn index(&self, handle: H) -> &Self::Output {
        self.get(handle).expect("invalid pool handle")
    }
}

impl<T, H: Handle> IndexMut<H> for GrowablePool<T, H> {
    fn index_mut(&mut self, handle: H) -> &mut Self::Output {
        self.get_mut(handle).expect("invalid pool handle")
    }
}

impl<'a, T, H: Handle> IntoIterator for &'a GrowablePool<T, H> {
    type IntoIter = Iter<'a, T, H>;
    type Item = (H, &'a T);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, H: Handle> IntoIterator for &'a mut GrowablePool<T, H> {
    type IntoIter = IterMut<'a, T, H>;
    type Item = (H, &'a mut T);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: Debug, H: Handle> Debug for GrowablePool<T, H> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("GrowablePool")
            .field("len", &self.len.as_usize())
            .field("next_free_slot", &self.next_free_slot.as_usize())
            .field("slots", &&self.slots[..])
            .finish()
    }
}

impl<T: Clone, H: Handle> Clone for GrowablePool<T, H> {
    fn clone(&self) -> Self {
        GrowablePool {
            slots: self.slots.clone(),
            len: self.len,
            next_free_slot: self.next_free_slot,
        }
    }
}
