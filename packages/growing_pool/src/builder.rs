use std::marker::PhantomData;

use crate::{DropPolicy, GrowingPool};

/// Builder for creating an instance of [`GrowingPool`].
///
/// You only need to use this builder if you want to customize the pool
/// configuration. The default configuration used by
/// [`GrowingPool::new()`][1] is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use growing_pool::{DropPolicy, GrowingPool};
///
/// let pool = GrowingPool::<u64, 64, 8>::builder()
///     .drop_policy(DropPolicy::MayDropItems)
///     .build();
/// ```
///
/// [1]: GrowingPool::new
#[must_use]
pub struct GrowingPoolBuilder<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> {
    drop_policy: DropPolicy,

    _element: PhantomData<T>,
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> std::fmt::Debug
    for GrowingPoolBuilder<T, MAX_ELEMENTS, BUCKET_SIZE>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowingPoolBuilder")
            .field(
                "element_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize>
    GrowingPoolBuilder<T, MAX_ELEMENTS, BUCKET_SIZE>
{
    pub(crate) fn new() -> Self {
        Self {
            drop_policy: DropPolicy::default(),
            _element: PhantomData,
        }
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how
    /// to treat values remaining in the pool when the pool is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use growing_pool::{DropPolicy, GrowingPool};
    ///
    /// let pool = GrowingPool::<u64, 64, 8>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    /// ```
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if the shape parameters are invalid: `BUCKET_SIZE` must be a
    /// power of two, `MAX_ELEMENTS` must be at least one bucket and fit in a
    /// four-byte handle index, and `T` must be at least four bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use growing_pool::GrowingPool;
    ///
    /// let pool = GrowingPool::<u64, 64, 8>::builder().build();
    /// ```
    #[must_use]
    pub fn build(self) -> GrowingPool<T, MAX_ELEMENTS, BUCKET_SIZE> {
        GrowingPool::new_inner(self.drop_policy)
    }
}
