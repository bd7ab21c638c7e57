use std::any::type_name;
use std::mem::MaybeUninit;

/// Lazily materialized backing storage for one bucket of `CAPACITY` slots.
///
/// A bucket starts with no storage at all. The first time the pool assigns a
/// slot inside it, the bucket materializes a contiguous array of exactly
/// `CAPACITY` slots; when the pool evicts the bucket, the array is returned
/// to the global allocator in one piece.
///
/// Each slot is `MaybeUninit<T>`. While a slot is live it holds an
/// initialized `T`; while it is free, its first four bytes hold the raw
/// 32-bit index of the next slot on its bucket's free-list. The bucket does
/// not track which state a slot is in - that is the pool's job.
///
/// There is intentionally no `Debug` impl: the slots are raw storage that
/// cannot be formatted without knowing which of them are live.
pub(crate) struct Bucket<T, const CAPACITY: usize> {
    slots: Option<Box<[MaybeUninit<T>]>>,
}

impl<T, const CAPACITY: usize> Bucket<T, CAPACITY> {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self { slots: None }
    }

    #[must_use]
    pub(crate) fn is_materialized(&self) -> bool {
        self.slots.is_some()
    }

    /// Reserves the backing storage for all `CAPACITY` slots.
    ///
    /// Slots start zeroed, so every byte of the bucket is initialized memory
    /// from the start; the free-link reads in the pool rely on this.
    pub(crate) fn materialize(&mut self) {
        debug_assert!(
            !self.is_materialized(),
            "materialize() called twice on a bucket of {}",
            type_name::<T>()
        );

        let mut slots = Box::new_uninit_slice(CAPACITY);

        for slot in &mut slots {
            *slot = MaybeUninit::zeroed();
        }

        self.slots = Some(slots);
    }

    /// Returns the backing storage to the global allocator.
    ///
    /// The caller must have destroyed every live value in the bucket first;
    /// releasing drops the raw storage without running any destructor.
    pub(crate) fn release(&mut self) {
        debug_assert!(
            self.is_materialized(),
            "release() called on a bucket of {} that has no backing storage",
            type_name::<T>()
        );

        self.slots = None;
    }

    /// # Panics
    ///
    /// Panics if the bucket is not materialized or the index is out of
    /// bounds.
    #[must_use]
    pub(crate) fn slot(&self, index: usize) -> &MaybeUninit<T> {
        assert!(
            index < CAPACITY,
            "slot {index} out of bounds in bucket of {}",
            type_name::<T>()
        );

        self.slots()
            .get(index)
            .expect("guarded by the bounds assertion above")
    }

    /// # Panics
    ///
    /// Panics if the bucket is not materialized or the index is out of
    /// bounds.
    #[must_use]
    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut MaybeUninit<T> {
        assert!(
            index < CAPACITY,
            "slot {index} out of bounds in bucket of {}",
            type_name::<T>()
        );

        self.slots_mut()
            .get_mut(index)
            .expect("guarded by the bounds assertion above")
    }

    /// Reads the free-list link stored in the first four bytes of a slot.
    ///
    /// The link is a raw 32-bit value copied byte for byte, so the slot's
    /// alignment does not matter.
    ///
    /// # Safety
    ///
    /// The slot at `index` must be free: the link is only meaningful if it
    /// was stored by [`write_free_link()`](Self::write_free_link) after the
    /// slot's value was destroyed.
    #[must_use]
    pub(crate) unsafe fn read_free_link(&self, index: usize) -> u32 {
        let slot = self.slot(index);

        // SAFETY: The bucket zeroes its storage at materialization, so the
        // first four bytes of a slot are always initialized memory. The
        // caller guarantees they currently hold a link.
        unsafe { slot.as_ptr().cast::<u32>().read_unaligned() }
    }

    /// Stores a free-list link in the first four bytes of a slot.
    ///
    /// # Safety
    ///
    /// The slot at `index` must be free: its value must have been destroyed
    /// already, as the link overwrites part of the value's storage.
    pub(crate) unsafe fn write_free_link(&mut self, index: usize, next: u32) {
        let slot = self.slot_mut(index);

        // SAFETY: The pointer covers at least four bytes because the pool
        // only stores elements of at least four bytes, and the caller
        // guarantees no live value occupies the slot.
        unsafe {
            slot.as_mut_ptr().cast::<u32>().write_unaligned(next);
        }
    }

    fn slots(&self) -> &[MaybeUninit<T>] {
        self.slots.as_deref().unwrap_or_else(|| {
            panic!(
                "bucket of {} has no backing storage",
                type_name::<T>()
            )
        })
    }

    fn slots_mut(&mut self) -> &mut [MaybeUninit<T>] {
        self.slots.as_deref_mut().unwrap_or_else(|| {
            panic!(
                "bucket of {} has no backing storage",
                type_name::<T>()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_without_storage() {
        let bucket = Bucket::<u64, 8>::new();

        assert!(!bucket.is_materialized());
    }

    #[test]
    fn materialize_and_release_round_trip() {
        let mut bucket = Bucket::<u64, 8>::new();

        bucket.materialize();
        assert!(bucket.is_materialized());

        bucket.release();
        assert!(!bucket.is_materialized());
    }

    #[test]
    fn stores_and_recovers_a_value() {
        let mut bucket = Bucket::<u64, 8>::new();
        bucket.materialize();

        bucket.slot_mut(3).write(0xfeed_face_u64);

        // SAFETY: We just initialized the slot above.
        let value = unsafe { bucket.slot(3).assume_init_read() };
        assert_eq!(value, 0xfeed_face);
    }

    #[test]
    fn free_link_round_trips() {
        let mut bucket = Bucket::<u64, 8>::new();
        bucket.materialize();

        // SAFETY: No value was ever constructed in these slots.
        unsafe {
            bucket.write_free_link(0, 7);
            bucket.write_free_link(1, u32::MAX);
        }

        // SAFETY: The links were written just above.
        unsafe {
            assert_eq!(bucket.read_free_link(0), 7);
            assert_eq!(bucket.read_free_link(1), u32::MAX);
        }
    }

    #[test]
    #[should_panic]
    fn slot_without_storage_panics() {
        let bucket = Bucket::<u64, 8>::new();

        _ = bucket.slot(0);
    }

    #[test]
    #[should_panic]
    fn slot_out_of_bounds_panics() {
        let mut bucket = Bucket::<u64, 8>::new();
        bucket.materialize();

        _ = bucket.slot(8);
    }
}
