use std::any::type_name;
use std::ptr;
use std::thread;
use std::{fmt, mem};

use crate::ptr::NULL_INDEX;
use crate::{Bucket, DropPolicy, FreeList, GrowingPoolBuilder, PoolPtr, SlotCoordinates};

/// A bounded object pool for many small homogeneous values, addressed
/// through compact four-byte owning handles.
///
/// The pool stores up to `MAX_ELEMENTS` values of type `T` in buckets of
/// `BUCKET_SIZE` contiguous slots each. Buckets materialize lazily as the
/// pool grows and the highest bucket is returned to the global allocator
/// once it is entirely unused, so a pool that churns through values settles
/// at the memory footprint of its steady state, not its peak.
///
/// [`allocate()`][Self::allocate] places a value into the lowest free slot
/// it can find and returns a [`PoolPtr`] - a four-byte handle that uniquely
/// owns the value. The value lives until the handle is returned via
/// [`release()`][Self::release]; it never moves in the meantime, so the
/// handle remains valid across any number of other allocations and
/// releases.
///
/// # Capacity
///
/// The pool never grows beyond `MAX_ELEMENTS`. When the pool is full,
/// [`allocate()`][Self::allocate] signals the condition by returning a null
/// handle; this is the only out-of-capacity signal and it is not fatal.
/// Releasing any value makes allocation succeed again.
///
/// # Shape parameters
///
/// `BUCKET_SIZE` must be a power of two, `MAX_ELEMENTS` must be at least
/// one bucket and small enough to index with a four-byte handle, and `T`
/// must be at least four bytes so a freed slot can hold the intrusive
/// free-list link. Violations panic at construction time.
///
/// # Resource usage
///
/// Backing storage is reclaimed automatically: after every `BUCKET_SIZE`
/// releases the pool checks whether the highest in-use bucket has become
/// entirely free and releases its storage if so, with half a bucket of
/// hysteresis to avoid thrash at a bucket boundary. Use
/// [`shrink_to_fit()`][Self::shrink_to_fit] to reclaim eagerly.
///
/// # Example
///
/// ```rust
/// use growing_pool::GrowingPool;
///
/// let mut pool = GrowingPool::<u64, 200, 8>::new();
///
/// let first = pool.allocate(1);
/// let second = pool.allocate(2);
///
/// assert_eq!(*pool.get(&first), 1);
/// *pool.get_mut(&second) += 40;
/// assert_eq!(*pool.get(&second), 42);
///
/// pool.release(first);
/// pool.release(second);
/// assert!(pool.is_empty());
/// ```
pub struct GrowingPool<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> {
    /// Backing storage, one lazily materialized bucket per `BUCKET_SIZE`
    /// span of slot indexes. The vector itself has a fixed length; only the
    /// buckets' storage comes and goes.
    buckets: Vec<Bucket<T, BUCKET_SIZE>>,

    /// One intrusive free-list per bucket, threaded through the freed slots
    /// themselves.
    free_lists: Vec<FreeList>,

    /// Sum of all per-bucket free-list lengths, kept alongside so
    /// allocation does not have to read every list to know whether a freed
    /// slot is available.
    total_free: usize,

    /// High-water mark: one past the highest slot index ever assigned
    /// outside the free-list path. Grows one slot at a time and shrinks
    /// only when the top bucket is evicted.
    num_elements: usize,

    /// Lowest bucket that may hold a free-list entry. This is a cache, not
    /// the ground truth - it is a lower bound that can go stale when a
    /// bucket's list drains, and the free-slot scan tolerates that by
    /// skipping empty lists.
    smallest_bucket: usize,

    /// Modular release counter; the eviction check runs once every
    /// `BUCKET_SIZE` releases rather than on each one.
    free_events_since_tick: usize,

    drop_policy: DropPolicy,
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize>
    GrowingPool<T, MAX_ELEMENTS, BUCKET_SIZE>
{
    /// Number of buckets needed to span `MAX_ELEMENTS` slots. The last
    /// bucket may be only partially addressable.
    const BUCKET_COUNT: usize = MAX_ELEMENTS.div_ceil(BUCKET_SIZE);

    /// Free slots required before the eviction check considers releasing
    /// the top bucket. The extra half bucket keeps a workload that hovers
    /// at a bucket boundary from releasing and re-reserving storage on
    /// every oscillation.
    const EVICTION_THRESHOLD: usize = BUCKET_SIZE + BUCKET_SIZE / 2;

    /// # Panics
    ///
    /// Panics if the shape parameters are invalid; see the type-level
    /// documentation.
    #[must_use]
    pub(crate) fn new_inner(drop_policy: DropPolicy) -> Self {
        assert!(
            BUCKET_SIZE.is_power_of_two(),
            "GrowingPool bucket size must be a power of two"
        );
        assert!(
            MAX_ELEMENTS >= BUCKET_SIZE,
            "GrowingPool capacity must be at least one bucket"
        );
        assert!(
            u32::try_from(MAX_ELEMENTS).is_ok_and(|max| max < NULL_INDEX),
            "GrowingPool capacity must be indexable by a four-byte handle"
        );
        assert!(
            size_of::<T>() >= size_of::<u32>(),
            "GrowingPool elements must be at least four bytes to hold the free-list link"
        );

        Self {
            buckets: (0..Self::BUCKET_COUNT).map(|_| Bucket::new()).collect(),
            free_lists: (0..Self::BUCKET_COUNT).map(|_| FreeList::new()).collect(),
            total_free: 0,
            num_elements: 0,
            smallest_bucket: 0,
            free_events_since_tick: 0,
            drop_policy,
        }
    }

    /// Creates a new [`GrowingPool`] with the default configuration.
    ///
    /// The pool starts with no backing storage at all; buckets materialize
    /// as values are allocated.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::GrowingPool;
    ///
    /// let mut pool = GrowingPool::<u64, 64, 8>::new();
    ///
    /// assert_eq!(pool.len(), 0);
    /// assert_eq!(pool.capacity(), 64);
    /// assert_eq!(pool.reserved_capacity(), 0);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the shape parameters are invalid; see the type-level
    /// documentation.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`GrowingPool`].
    ///
    /// Use this when you want to customize the pool configuration beyond
    /// the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::{DropPolicy, GrowingPool};
    ///
    /// let pool = GrowingPool::<u64, 64, 8>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    ///
    /// assert!(pool.is_empty());
    /// ```
    pub fn builder() -> GrowingPoolBuilder<T, MAX_ELEMENTS, BUCKET_SIZE> {
        GrowingPoolBuilder::new()
    }

    /// The number of live values in the pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::GrowingPool;
    ///
    /// let mut pool = GrowingPool::<u64, 64, 8>::new();
    ///
    /// let ptr = pool.allocate(42);
    /// assert_eq!(pool.len(), 1);
    ///
    /// pool.release(ptr);
    /// assert_eq!(pool.len(), 0);
    /// ```
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    pub fn len(&self) -> usize {
        self.num_elements
            .checked_sub(self.total_free)
            .expect("free slots are a subset of assigned slots, so total_free never exceeds num_elements")
    }

    /// Whether the pool holds no live values.
    ///
    /// An empty pool may still hold backing storage for previously used
    /// buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The maximum number of values the pool can hold, as fixed by the
    /// `MAX_ELEMENTS` shape parameter.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use and/or infinite loop.
    #[expect(clippy::unused_self, reason = "parity with len() and reserved_capacity()")]
    pub fn capacity(&self) -> usize {
        MAX_ELEMENTS
    }

    /// The number of values the pool can hold without touching the global
    /// allocator, i.e. the slots of all currently materialized buckets.
    ///
    /// This rises as buckets materialize and falls as the pool evicts the
    /// top bucket, so it is the observable for memory reclamation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::GrowingPool;
    ///
    /// let mut pool = GrowingPool::<u64, 64, 8>::new();
    /// assert_eq!(pool.reserved_capacity(), 0);
    ///
    /// let ptr = pool.allocate(42);
    /// assert_eq!(pool.reserved_capacity(), 8);
    /// # pool.release(ptr);
    /// ```
    #[must_use]
    pub fn reserved_capacity(&self) -> usize {
        self.buckets
            .iter()
            .filter(|bucket| bucket.is_materialized())
            .count()
            .checked_mul(BUCKET_SIZE)
            .expect("the bucket count is derived from MAX_ELEMENTS, which fits in usize")
    }

    /// Places a value into the pool and returns the owning handle.
    ///
    /// The pool prefers recycling a previously freed slot, always from the
    /// lowest-indexed bucket it knows of, so long-running pools fill from
    /// the bottom and leave the top bucket to drain for eviction. When no
    /// freed slot exists, the next never-used slot is assigned,
    /// materializing its bucket on demand.
    ///
    /// Returns a null handle when the pool is full. This is the only
    /// out-of-capacity signal; allocation succeeds again once any value is
    /// released.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::GrowingPool;
    ///
    /// let mut pool = GrowingPool::<u64, 8, 8>::new();
    ///
    /// let mut handles = Vec::new();
    /// for i in 0..8 {
    ///     handles.push(pool.allocate(i));
    /// }
    ///
    /// // The pool is full now.
    /// let overflow = pool.allocate(99);
    /// assert!(overflow.is_null());
    ///
    /// // Releasing any value makes room again.
    /// pool.release(handles.pop().unwrap());
    /// let replacement = pool.allocate(99);
    /// assert!(!replacement.is_null());
    /// # pool.release(replacement);
    /// # for ptr in handles { pool.release(ptr); }
    /// ```
    pub fn allocate(&mut self, value: T) -> PoolPtr<T, MAX_ELEMENTS, BUCKET_SIZE> {
        #[cfg(debug_assertions)]
        self.integrity_check();

        if self.total_free > 0 {
            let index = self.pop_free();
            let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(index);

            self.buckets
                .get_mut(coordinates.bucket_index())
                .expect("a free-list entry always references a bucket within the fixed bucket count")
                .slot_mut(coordinates.index_in_bucket())
                .write(value);

            return PoolPtr::from_index(index);
        }

        if self.num_elements < MAX_ELEMENTS {
            let index = u32::try_from(self.num_elements)
                .expect("num_elements is bounded by MAX_ELEMENTS, which fits in a handle index");
            let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(index);

            let bucket = self
                .buckets
                .get_mut(coordinates.bucket_index())
                .expect("the high-water mark stays within the fixed bucket count");

            if !bucket.is_materialized() {
                bucket.materialize();
            }

            bucket.slot_mut(coordinates.index_in_bucket()).write(value);

            // Cannot overflow: bounded by MAX_ELEMENTS.
            self.num_elements = self.num_elements.wrapping_add(1);

            return PoolPtr::from_index(index);
        }

        PoolPtr::null()
    }

    /// Destroys the value the handle owns and recycles its slot.
    ///
    /// Consuming the handle is what makes a double release unrepresentable.
    /// Releasing a null handle is a no-op, so the release path may be used
    /// unconditionally on handle fields that may or may not be populated.
    ///
    /// The freed slot is threaded onto its bucket's free-list; this holds
    /// even if the value's destructor panics. Once every `BUCKET_SIZE`
    /// releases, the pool additionally checks whether the highest in-use
    /// bucket has become entirely free and releases its backing storage if
    /// so.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::GrowingPool;
    ///
    /// let mut pool = GrowingPool::<String, 64, 8>::new();
    ///
    /// let ptr = pool.allocate("transient".to_string());
    /// pool.release(ptr);
    ///
    /// assert!(pool.is_empty());
    /// ```
    pub fn release(&mut self, ptr: PoolPtr<T, MAX_ELEMENTS, BUCKET_SIZE>) {
        if ptr.is_null() {
            return;
        }

        let index = ptr.index();
        debug_assert!(
            usize::try_from(index).expect("a 32-bit index always fits in usize") < self.num_elements,
            "release({index}) is beyond the high-water mark in pool of {}",
            type_name::<T>()
        );

        let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(index);

        // The guard threads the slot onto the free-list and runs the
        // eviction tick even if the value's destructor panics below.
        let guard = ReleaseGuard { pool: self, index };

        let value_ptr = guard
            .pool
            .buckets
            .get_mut(coordinates.bucket_index())
            .expect("a live handle always references a bucket within the fixed bucket count")
            .slot_mut(coordinates.index_in_bucket())
            .as_mut_ptr();

        // SAFETY: A non-null handle owns a live slot, so the value is
        // initialized, and consuming the handle makes this the only place
        // that destroys it.
        unsafe {
            ptr::drop_in_place(value_ptr);
        }
    }

    /// Resolves a handle to a shared reference to its value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::GrowingPool;
    ///
    /// let mut pool = GrowingPool::<String, 64, 8>::new();
    /// let ptr = pool.allocate("Hello, World!".to_string());
    ///
    /// assert_eq!(pool.get(&ptr), "Hello, World!");
    /// # pool.release(ptr);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the handle is null.
    #[must_use]
    pub fn get(&self, ptr: &PoolPtr<T, MAX_ELEMENTS, BUCKET_SIZE>) -> &T {
        assert!(
            !ptr.is_null(),
            "get() on a null handle of {}",
            type_name::<T>()
        );

        let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(ptr.index());

        let slot = self
            .buckets
            .get(coordinates.bucket_index())
            .expect("a non-null handle always references a bucket within the fixed bucket count")
            .slot(coordinates.index_in_bucket());

        // SAFETY: A non-null handle owns a live slot, so the value is
        // initialized.
        unsafe { slot.assume_init_ref() }
    }

    /// Resolves a handle to an exclusive reference to its value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::GrowingPool;
    ///
    /// let mut pool = GrowingPool::<String, 64, 8>::new();
    /// let ptr = pool.allocate("Hello".to_string());
    ///
    /// pool.get_mut(&ptr).push_str(", World!");
    /// assert_eq!(pool.get(&ptr), "Hello, World!");
    /// # pool.release(ptr);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the handle is null.
    #[must_use]
    pub fn get_mut(&mut self, ptr: &PoolPtr<T, MAX_ELEMENTS, BUCKET_SIZE>) -> &mut T {
        assert!(
            !ptr.is_null(),
            "get_mut() on a null handle of {}",
            type_name::<T>()
        );

        let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(ptr.index());

        let slot = self
            .buckets
            .get_mut(coordinates.bucket_index())
            .expect("a non-null handle always references a bucket within the fixed bucket count")
            .slot_mut(coordinates.index_in_bucket());

        // SAFETY: A non-null handle owns a live slot, so the value is
        // initialized, and `&mut self` makes this reference exclusive.
        unsafe { slot.assume_init_mut() }
    }

    /// Shrinks the pool's memory usage by eagerly evicting every entirely
    /// free top bucket.
    ///
    /// This applies the same top-bucket-only reclamation rule as the
    /// automatic eviction check, but immediately and without the hysteresis
    /// margin. Live values are never moved; buckets below the highest live
    /// slot are untouched.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::GrowingPool;
    ///
    /// let mut pool = GrowingPool::<u64, 64, 8>::new();
    ///
    /// let ptr = pool.allocate(42);
    /// assert_eq!(pool.reserved_capacity(), 8);
    ///
    /// pool.release(ptr);
    /// pool.shrink_to_fit();
    /// assert_eq!(pool.reserved_capacity(), 0);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        while self.try_evict_top_bucket() {}

        #[cfg(debug_assertions)]
        self.integrity_check();
    }

    /// Pops the lowest-bucket free slot, maintaining the `smallest_bucket`
    /// lower bound. Callers must have checked `total_free > 0`.
    fn pop_free(&mut self) -> u32 {
        for bucket_index in self.smallest_bucket..self.buckets.len() {
            let free_list = self
                .free_lists
                .get(bucket_index)
                .expect("free_lists and buckets have the same fixed length");

            if free_list.is_empty() {
                continue;
            }

            let head = free_list.head();
            let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(head);
            debug_assert_eq!(
                coordinates.bucket_index(),
                bucket_index,
                "free-list head {head} escaped its bucket in pool of {}",
                type_name::<T>()
            );

            // SAFETY: The head slot is free; its link was stored when it was
            // pushed onto the list.
            let next = unsafe {
                self.buckets
                    .get(bucket_index)
                    .expect("free_lists and buckets have the same fixed length")
                    .read_free_link(coordinates.index_in_bucket())
            };

            self.free_lists
                .get_mut(bucket_index)
                .expect("free_lists and buckets have the same fixed length")
                .advance_head(next);

            self.smallest_bucket = bucket_index;
            self.total_free = self
                .total_free
                .checked_sub(1)
                .expect("a free-list entry was just consumed, so the total was positive");

            return head;
        }

        unreachable!(
            "total_free is positive but no bucket holds a free-list entry in pool of {}",
            type_name::<T>()
        )
    }

    /// Threads a freed slot onto its bucket's free-list. The slot's value
    /// must already have been destroyed.
    fn push_free(&mut self, index: u32) {
        let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(index);
        let bucket_index = coordinates.bucket_index();

        let previous_head = self
            .free_lists
            .get_mut(bucket_index)
            .expect("a freed slot always lies within the fixed bucket count")
            .push_head(index);

        // SAFETY: The caller destroyed the slot's value, so the slot is free
        // and its first four bytes are ours to use for the link.
        unsafe {
            self.buckets
                .get_mut(bucket_index)
                .expect("a freed slot always lies within a materialized bucket")
                .write_free_link(coordinates.index_in_bucket(), previous_head);
        }

        self.total_free = self
            .total_free
            .checked_add(1)
            .expect("total_free is bounded by num_elements, which is bounded by MAX_ELEMENTS");
        self.smallest_bucket = self.smallest_bucket.min(bucket_index);
    }

    /// Counts a release toward the modular tick and runs the eviction check
    /// when the tick comes due.
    fn tick_eviction(&mut self) {
        // Cannot overflow: reset below before the counter passes BUCKET_SIZE.
        self.free_events_since_tick = self.free_events_since_tick.wrapping_add(1);

        if self.free_events_since_tick < BUCKET_SIZE {
            return;
        }

        self.free_events_since_tick = 0;

        if self.total_free > Self::EVICTION_THRESHOLD {
            _ = self.try_evict_top_bucket();
        }
    }

    /// Releases the highest in-use bucket if every one of its assigned
    /// slots is free. Returns whether a bucket was evicted.
    fn try_evict_top_bucket(&mut self) -> bool {
        // A pool that never assigned a slot has no top bucket to consider.
        if self.num_elements == 0 {
            return false;
        }

        let top_assigned = self
            .num_elements
            .checked_sub(1)
            .expect("guarded by the num_elements check above");
        let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(
            u32::try_from(top_assigned).expect("bounded by MAX_ELEMENTS, which fits a handle index"),
        );

        let top_bucket = coordinates.bucket_index();

        // How much of the top bucket has ever been assigned. Only these
        // slots can be on its free-list.
        let slots_used_in_top = coordinates.index_in_bucket().wrapping_add(1);

        let free_list = self
            .free_lists
            .get_mut(top_bucket)
            .expect("the top bucket lies within the fixed bucket count");

        if free_list.len() != slots_used_in_top {
            return false;
        }

        // Every assigned slot in the top bucket is free: drop the whole
        // bucket and pull the high-water mark back to the bucket boundary.
        free_list.clear();

        self.total_free = self
            .total_free
            .checked_sub(slots_used_in_top)
            .expect("the top bucket's free-list length is counted in total_free");
        self.num_elements = self
            .num_elements
            .checked_sub(slots_used_in_top)
            .expect("slots_used_in_top counts assigned slots, of which there are num_elements");

        self.buckets
            .get_mut(top_bucket)
            .expect("the top bucket lies within the fixed bucket count")
            .release();

        true
    }

    /// Destroys every live value, using the free-lists to tell live slots
    /// from free ones. Only called during pool teardown.
    fn drop_live_values(&mut self) {
        if !mem::needs_drop::<T>() {
            return;
        }

        for (bucket_index, bucket) in self.buckets.iter_mut().enumerate() {
            if !bucket.is_materialized() {
                continue;
            }

            // Mark the free slots; every other slot assigned below the
            // high-water mark is live.
            let mut is_free = vec![false; BUCKET_SIZE];

            let free_list = self
                .free_lists
                .get(bucket_index)
                .expect("free_lists and buckets have the same fixed length");

            let mut link = free_list.head();
            while link != NULL_INDEX {
                let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(link);
                debug_assert_eq!(coordinates.bucket_index(), bucket_index);

                *is_free
                    .get_mut(coordinates.index_in_bucket())
                    .expect("free-list links stay within their bucket") = true;

                // SAFETY: Every slot on a free-list is free.
                link = unsafe { bucket.read_free_link(coordinates.index_in_bucket()) };
            }

            let bucket_base = bucket_index
                .checked_mul(BUCKET_SIZE)
                .expect("the bucket count is derived from MAX_ELEMENTS, which fits in usize");
            let assigned = self
                .num_elements
                .checked_sub(bucket_base)
                .expect("materialized buckets lie below the high-water mark")
                .min(BUCKET_SIZE);

            for index_in_bucket in 0..assigned {
                if *is_free
                    .get(index_in_bucket)
                    .expect("assigned is bounded by BUCKET_SIZE")
                {
                    continue;
                }

                // SAFETY: An assigned slot that is not on its free-list is
                // live, so the value is initialized and not yet destroyed.
                unsafe {
                    ptr::drop_in_place(bucket.slot_mut(index_in_bucket).as_mut_ptr());
                }
            }
        }
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    #[allow(
        clippy::indexing_slicing,
        clippy::arithmetic_side_effects,
        reason = "invariant checking wants direct array access"
    )]
    fn integrity_check(&self) {
        assert_eq!(self.buckets.len(), Self::BUCKET_COUNT);
        assert_eq!(self.free_lists.len(), Self::BUCKET_COUNT);
        assert!(self.num_elements <= MAX_ELEMENTS);
        assert!(self.total_free <= self.num_elements);
        assert!(self.free_events_since_tick < BUCKET_SIZE);

        // Buckets hold storage exactly up to the high-water mark.
        let materialized_limit = self.num_elements.div_ceil(BUCKET_SIZE);

        let mut observed_free = 0_usize;
        let mut lowest_nonempty = None;

        for (bucket_index, (bucket, free_list)) in
            self.buckets.iter().zip(&self.free_lists).enumerate()
        {
            assert_eq!(
                bucket.is_materialized(),
                bucket_index < materialized_limit,
                "bucket {bucket_index} materialization does not match the high-water mark in pool of {}",
                type_name::<T>()
            );

            if bucket_index >= materialized_limit {
                assert!(
                    free_list.is_empty(),
                    "bucket {bucket_index} is past the high-water mark but has free-list entries in pool of {}",
                    type_name::<T>()
                );
            }

            // Walk the intrusive list and make sure it matches the recorded
            // length, stays inside its bucket, and never revisits a slot.
            let mut seen = vec![false; BUCKET_SIZE];
            let mut nodes = 0_usize;
            let mut link = free_list.head();

            while link != NULL_INDEX {
                let coordinates = SlotCoordinates::<BUCKET_SIZE>::from_index(link);

                assert_eq!(
                    coordinates.bucket_index(),
                    bucket_index,
                    "free-list link {link} escaped its bucket in pool of {}",
                    type_name::<T>()
                );
                assert!(
                    usize::try_from(link).unwrap() < self.num_elements,
                    "free-list link {link} is beyond the high-water mark in pool of {}",
                    type_name::<T>()
                );
                assert!(
                    !seen[coordinates.index_in_bucket()],
                    "slot {link} appears twice on its bucket's free-list in pool of {}",
                    type_name::<T>()
                );

                seen[coordinates.index_in_bucket()] = true;
                nodes += 1;

                // SAFETY: Every slot on a free-list is free.
                link = unsafe { bucket.read_free_link(coordinates.index_in_bucket()) };
            }

            assert_eq!(
                nodes,
                free_list.len(),
                "free-list length bookkeeping does not match the list itself in pool of {}",
                type_name::<T>()
            );
            assert!(free_list.len() <= BUCKET_SIZE);

            if !free_list.is_empty() && lowest_nonempty.is_none() {
                lowest_nonempty = Some(bucket_index);
            }

            observed_free += free_list.len();
        }

        assert_eq!(
            observed_free,
            self.total_free,
            "total_free does not match the sum of the per-bucket lists in pool of {}",
            type_name::<T>()
        );

        if let Some(lowest) = lowest_nonempty {
            assert!(
                self.smallest_bucket <= lowest,
                "the smallest_bucket hint stopped being a lower bound in pool of {}",
                type_name::<T>()
            );
        }

        if self.num_elements > 0 {
            let top = SlotCoordinates::<BUCKET_SIZE>::from_index(
                u32::try_from(self.num_elements - 1).unwrap(),
            );
            assert!(
                self.free_lists[top.bucket_index()].len() <= top.index_in_bucket() + 1,
                "the top bucket has more free slots than were ever assigned in pool of {}",
                type_name::<T>()
            );
        }
    }
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> Default
    for GrowingPool<T, MAX_ELEMENTS, BUCKET_SIZE>
{
    /// Creates a new [`GrowingPool`] with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the shape parameters are invalid; see the type-level
    /// documentation.
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> fmt::Debug
    for GrowingPool<T, MAX_ELEMENTS, BUCKET_SIZE>
{
    /// Reports the pool's bookkeeping, not its contents - the buckets are
    /// raw slot storage with no per-slot liveness record to format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowingPool")
            .field(
                "element_type",
                &std::format_args!("{}", type_name::<T>()),
            )
            .field("capacity", &MAX_ELEMENTS)
            .field("bucket_size", &BUCKET_SIZE)
            .field("num_elements", &self.num_elements)
            .field("total_free", &self.total_free)
            .field(
                "materialized_buckets",
                &self
                    .buckets
                    .iter()
                    .filter(|bucket| bucket.is_materialized())
                    .count(),
            )
            .field("smallest_bucket", &self.smallest_bucket)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> Drop
    for GrowingPool<T, MAX_ELEMENTS, BUCKET_SIZE>
{
    fn drop(&mut self) {
        let live = self.len();

        if live == 0 {
            return;
        }

        match self.drop_policy {
            DropPolicy::MayDropItems => {
                tracing::warn!(
                    element_type = type_name::<T>(),
                    live,
                    "pool dropped with values still allocated"
                );

                self.drop_live_values();
            }
            DropPolicy::MustNotDropItems => {
                // If we are already panicking, we do not want to panic again
                // because that would simply obscure whatever the original
                // panic was, leading to debug difficulties.
                if !thread::panicking() {
                    panic!(
                        "dropped a non-empty pool of {} with a policy that says it must be empty when dropped",
                        type_name::<T>()
                    );
                }
            }
        }
    }
}

/// Returns a released slot to the free bookkeeping. Runs as a drop guard so
/// the accounting happens even when the value's destructor panics.
struct ReleaseGuard<'p, T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> {
    pool: &'p mut GrowingPool<T, MAX_ELEMENTS, BUCKET_SIZE>,
    index: u32,
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> Drop
    for ReleaseGuard<'_, T, MAX_ELEMENTS, BUCKET_SIZE>
{
    fn drop(&mut self) {
        self.pool.push_free(self.index);
        self.pool.tick_eviction();
    }
}
