/// Determines how the pool treats values that are still allocated when the
/// pool is dropped.
///
/// By default the pool drops the remaining values, after emitting a
/// diagnostic naming the element type and the live count.
///
/// # Examples
///
/// ```
/// use growing_pool::{DropPolicy, GrowingPool};
///
/// // The drop policy is set at pool creation time.
/// let pool = GrowingPool::<u64, 64, 8>::builder()
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool drops any remaining values when it is dropped, after
    /// reporting them through a `tracing` warning. This is the default.
    #[default]
    MayDropItems,

    /// The pool panics if it still holds values when it is dropped.
    ///
    /// This may be valuable when handles double as links in external data
    /// structures that must be unwound before the pool goes away; a value
    /// remaining at teardown then indicates a bug worth failing fast on.
    MustNotDropItems,
}
