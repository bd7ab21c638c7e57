//! Demonstrates how `GrowingPool` reserves and reclaims backing storage.
//!
//! Buckets materialize lazily as the pool grows. When values drain from the
//! top of the pool, the periodic eviction check returns whole buckets to the
//! global allocator; `shrink_to_fit()` does the same eagerly.

use growing_pool::GrowingPool;

const MAX_ELEMENTS: usize = 200;
const BUCKET_SIZE: usize = 8;

#[allow(
    clippy::cast_possible_truncation,
    clippy::arithmetic_side_effects,
    reason = "example code with small values"
)]
fn main() {
    let mut pool = GrowingPool::<u64, MAX_ELEMENTS, BUCKET_SIZE>::new();

    println!("Empty pool reserves nothing: {} slots", pool.reserved_capacity());

    // Fill the pool; storage is reserved one bucket at a time.
    let mut handles: Vec<_> = (0..MAX_ELEMENTS as u64).map(|i| pool.allocate(i)).collect();

    println!(
        "Full pool: len {}, reserved {} slots",
        pool.len(),
        pool.reserved_capacity()
    );

    // Drain from the top down. Once every BUCKET_SIZE releases, the pool
    // checks whether the highest bucket is entirely free and releases its
    // storage if so.
    for _ in 0..MAX_ELEMENTS / 2 {
        if let Some(ptr) = handles.pop() {
            pool.release(ptr);
        }
    }

    println!(
        "After draining half from the top: len {}, reserved {} slots",
        pool.len(),
        pool.reserved_capacity()
    );

    // Release the rest and reclaim eagerly.
    for ptr in handles {
        pool.release(ptr);
    }

    pool.shrink_to_fit();

    println!(
        "After releasing everything and shrinking: len {}, reserved {} slots",
        pool.len(),
        pool.reserved_capacity()
    );
}
