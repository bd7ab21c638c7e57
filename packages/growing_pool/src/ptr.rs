use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// The sentinel index value that marks a [`PoolPtr`] as null.
///
/// Every smaller value is a valid slot index, so a pool can address at most
/// `u32::MAX - 1` slots.
pub(crate) const NULL_INDEX: u32 = u32::MAX;

/// A four-byte owning handle to a value stored in a
/// [`GrowingPool`][crate::GrowingPool].
///
/// A handle is either null or the unique owner of one live value in the pool
/// it was allocated from. It is half the size of a native pointer, which adds
/// up when handles are embedded by the million in graph-like data structures.
///
/// The handle carries the pool's shape in its type, so a handle cannot be
/// used with a pool of a different element type or different shape
/// parameters - that is a compile-time error.
///
/// # Ownership
///
/// Handles cannot be copied or cloned; ownership of the value moves with the
/// handle. Returning the handle to [`GrowingPool::release()`][1] destroys the
/// value and recycles its slot. Because `release` consumes the handle, a
/// double release is unrepresentable.
///
/// A non-null handle that is simply dropped keeps its value allocated until
/// the pool itself is dropped, at which point the pool's teardown diagnostic
/// reports it. Always prefer the release path.
///
/// # Example
///
/// ```rust
/// use growing_pool::GrowingPool;
///
/// let mut pool = GrowingPool::<u64, 64, 8>::new();
///
/// let ptr = pool.allocate(42);
/// assert!(!ptr.is_null());
/// assert_eq!(*pool.get(&ptr), 42);
///
/// pool.release(ptr);
/// assert!(pool.is_empty());
/// ```
///
/// [1]: crate::GrowingPool::release
#[must_use = "a live handle that is dropped keeps its slot allocated until the pool itself is dropped; return it via GrowingPool::release()"]
pub struct PoolPtr<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> {
    index: u32,

    _element: PhantomData<fn() -> T>,
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize>
    PoolPtr<T, MAX_ELEMENTS, BUCKET_SIZE>
{
    /// Creates a null handle.
    ///
    /// A null handle owns nothing and may be released any number of times
    /// without effect. This is the natural resting value for handle fields
    /// embedded in other data structures.
    ///
    /// # Example
    ///
    /// ```rust
    /// use growing_pool::PoolPtr;
    ///
    /// let ptr = PoolPtr::<u64, 64, 8>::null();
    /// assert!(ptr.is_null());
    /// ```
    pub fn null() -> Self {
        Self {
            index: NULL_INDEX,
            _element: PhantomData,
        }
    }

    /// Wraps a raw slot index handed out by the pool.
    pub(crate) fn from_index(index: u32) -> Self {
        debug_assert!(
            index != NULL_INDEX,
            "the null sentinel is not a valid slot index for a handle of {}",
            type_name::<T>()
        );

        Self {
            index,
            _element: PhantomData,
        }
    }

    /// Whether this handle is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.index == NULL_INDEX
    }

    /// The raw slot index this handle carries.
    ///
    /// Returns the null sentinel (`u32::MAX`) for a null handle. Two handles
    /// allocated from the same pool carry equal indexes only if one was
    /// released and its slot was reused by the other.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> Default
    for PoolPtr<T, MAX_ELEMENTS, BUCKET_SIZE>
{
    /// Creates a null handle.
    fn default() -> Self {
        Self::null()
    }
}

impl<T, const MAX_ELEMENTS: usize, const BUCKET_SIZE: usize> fmt::Debug
    for PoolPtr<T, MAX_ELEMENTS, BUCKET_SIZE>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PoolPtr");

        s.field(
            "element_type",
            &std::format_args!("{}", type_name::<T>()),
        );

        if self.is_null() {
            s.field("index", &std::format_args!("null"));
        } else {
            s.field("index", &self.index);
        }

        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    // The whole point of the handle is that it is four bytes, not eight.
    static_assertions::const_assert_eq!(size_of::<PoolPtr<u64, 200, 8>>(), 4);
    static_assertions::const_assert_eq!(size_of::<PoolPtr<[u8; 1024], 4096, 128>>(), 4);

    // Handles are unique owners - no copying, no cloning.
    assert_not_impl_any!(PoolPtr<u64, 64, 8>: Clone, Copy);

    // The handle itself is just an index; it is thread-mobile regardless of
    // the element type. Access to the value always goes through the pool.
    assert_impl_all!(PoolPtr<Rc<u64>, 64, 8>: Send, Sync);

    #[test]
    fn null_is_null() {
        let ptr = PoolPtr::<u64, 64, 8>::null();

        assert!(ptr.is_null());
        assert_eq!(ptr.index(), NULL_INDEX);
    }

    #[test]
    fn default_is_null() {
        let ptr = PoolPtr::<u64, 64, 8>::default();

        assert!(ptr.is_null());
    }

    #[test]
    fn wrapped_index_is_not_null() {
        let ptr = PoolPtr::<u64, 64, 8>::from_index(3);

        assert!(!ptr.is_null());
        assert_eq!(ptr.index(), 3);
    }

    #[test]
    fn debug_output_names_element_type() {
        let ptr = PoolPtr::<u64, 64, 8>::from_index(5);
        let formatted = format!("{ptr:?}");

        assert!(formatted.contains("u64"));
        assert!(formatted.contains('5'));

        let null = PoolPtr::<u64, 64, 8>::null();
        assert!(format!("{null:?}").contains("null"));
    }
}
