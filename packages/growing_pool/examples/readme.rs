//! The example from the package README.

use growing_pool::GrowingPool;

fn main() {
    // Up to 200 values, stored in buckets of 8 slots each.
    let mut pool = GrowingPool::<u64, 200, 8>::new();

    let first = pool.allocate(1);
    let second = pool.allocate(2);

    assert_eq!(*pool.get(&first), 1);
    *pool.get_mut(&second) += 40;
    assert_eq!(*pool.get(&second), 42);

    // Releasing consumes the handle; the slot is recycled for the next
    // allocation.
    pool.release(first);
    let recycled = pool.allocate(3);
    assert_eq!(*pool.get(&recycled), 3);

    pool.release(second);
    pool.release(recycled);
    assert!(pool.is_empty());

    println!("README example completed successfully");
}
