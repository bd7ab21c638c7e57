//! A bounded, bucketed object pool for many small homogeneous values, with
//! compact four-byte owning handles.
//!
//! This crate provides [`GrowingPool`], a typed pool that stores up to a
//! fixed maximum number of values in lazily materialized buckets, and
//! [`PoolPtr`], the handle it hands out: a unique owner of one pooled value
//! that occupies four bytes instead of the eight of a native pointer. When
//! handles are embedded by the million in graph-like data structures, the
//! halved handle size is real memory back.
//!
//! # Key features
//!
//! - **Amortized allocation**: values live in buckets of contiguous slots,
//!   so allocating from the pool touches the global allocator only once per
//!   bucket, not once per value
//! - **Four-byte handles**: [`PoolPtr`] is a 32-bit slot index bound to its
//!   pool's type, half the size of a reference
//! - **Stable storage**: values never move while live; a handle stays valid
//!   across any number of other allocations and releases
//! - **Unique ownership**: handles cannot be copied or cloned, and release
//!   consumes the handle, so a double release does not compile
//! - **Bounded capacity**: the pool never grows past its declared maximum;
//!   exhaustion is signaled with a null handle, not a panic
//! - **Automatic shrinking**: the highest bucket's storage is returned to
//!   the global allocator once it is entirely unused, with hysteresis to
//!   avoid thrash at bucket boundaries
//! - **Flexible drop policies**: configure behavior when the pool is
//!   dropped with values still allocated
//! - **Thread mobility**: the pool can move between threads when the
//!   element type allows it (but cannot be shared without synchronization)
//!
//! # Example
//!
//! ```rust
//! use growing_pool::GrowingPool;
//!
//! // Up to 200 values, stored in buckets of 8 slots each.
//! let mut pool = GrowingPool::<u64, 200, 8>::new();
//!
//! let first = pool.allocate(1);
//! let second = pool.allocate(2);
//!
//! assert_eq!(*pool.get(&first), 1);
//! *pool.get_mut(&second) += 40;
//! assert_eq!(*pool.get(&second), 42);
//!
//! // Releasing consumes the handle; the slot is recycled for the next
//! // allocation.
//! pool.release(first);
//! let recycled = pool.allocate(3);
//!
//! pool.release(second);
//! pool.release(recycled);
//! assert!(pool.is_empty());
//! ```
//!
//! # Capacity exhaustion
//!
//! ```rust
//! use growing_pool::GrowingPool;
//!
//! let mut pool = GrowingPool::<u64, 8, 8>::new();
//!
//! let handles: Vec<_> = (0..8).map(|i| pool.allocate(i)).collect();
//!
//! // The pool is full; allocation signals this with a null handle.
//! assert!(pool.allocate(99).is_null());
//! # for ptr in handles { pool.release(ptr); }
//! ```

mod bucket;
mod builder;
mod coordinates;
mod drop_policy;
mod free_list;
mod pool;
mod ptr;

pub(crate) use bucket::*;
pub use builder::*;
pub(crate) use coordinates::*;
pub use drop_policy::*;
pub(crate) use free_list::*;
pub use pool::GrowingPool;
pub use ptr::PoolPtr;
