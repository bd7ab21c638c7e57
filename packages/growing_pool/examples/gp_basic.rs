//! Basic usage example for `GrowingPool`.
//!
//! This example demonstrates allocating values into the pool, resolving the
//! four-byte handles back to the values, and releasing slots for reuse.

use growing_pool::GrowingPool;

fn main() {
    // A pool of up to 64 u64 values, in buckets of 8 slots.
    let mut pool = GrowingPool::<u64, 64, 8>::new();

    println!(
        "Created pool: capacity {}, reserved {}",
        pool.capacity(),
        pool.reserved_capacity()
    );

    // Insert some values. Each allocation returns a four-byte handle that
    // uniquely owns its value.
    let first = pool.allocate(0xdead_beef);
    let second = pool.allocate(0xcafe_babe);
    let third = pool.allocate(0xfeed_face);

    println!(
        "Allocated 3 values; len {}, reserved {}",
        pool.len(),
        pool.reserved_capacity()
    );

    println!("First:  {:#x} (handle index {})", pool.get(&first), first.index());
    println!("Second: {:#x} (handle index {})", pool.get(&second), second.index());
    println!("Third:  {:#x} (handle index {})", pool.get(&third), third.index());

    // Values can be modified in place through the handle.
    *pool.get_mut(&second) = 0x0badf00d;
    println!("Second after update: {:#x}", pool.get(&second));

    // Releasing a handle recycles its slot; the next allocation reuses it.
    let second_index = second.index();
    pool.release(second);

    let recycled = pool.allocate(0x5eed);
    println!(
        "Recycled slot {} for a new value (was slot {})",
        recycled.index(),
        second_index
    );

    pool.release(first);
    pool.release(third);
    pool.release(recycled);

    println!("All released; len {}", pool.len());
}
