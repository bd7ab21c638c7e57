//! Integration tests for the `growing_pool` package.
//!
//! These exercise the pool end to end: construction and destruction
//! ordering, non-default-constructible payloads, capacity exhaustion and
//! refill, storage reclamation, and randomized churn.

#![allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    reason = "we do not need to worry about these things when writing test code"
)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use growing_pool::{DropPolicy, GrowingPool, PoolPtr};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Records its construction at creation and its label at destruction.
struct Tracked {
    label: &'static str,
    constructed: Rc<Cell<usize>>,
    destroyed: Rc<RefCell<Vec<&'static str>>>,
}

impl Tracked {
    fn new(
        label: &'static str,
        constructed: &Rc<Cell<usize>>,
        destroyed: &Rc<RefCell<Vec<&'static str>>>,
    ) -> Self {
        constructed.set(constructed.get() + 1);

        Self {
            label,
            constructed: Rc::clone(constructed),
            destroyed: Rc::clone(destroyed),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.destroyed.borrow_mut().push(self.label);
    }
}

#[test]
fn construction_and_destruction_accounting() {
    let constructed = Rc::new(Cell::new(0));
    let destroyed = Rc::new(RefCell::new(Vec::new()));

    {
        let mut pool = GrowingPool::<Tracked, 10, 8>::new();

        let a = pool.allocate(Tracked::new("a", &constructed, &destroyed));
        assert_eq!(constructed.get(), 1);

        {
            let b = pool.allocate(Tracked::new("b", &constructed, &destroyed));
            assert_eq!(constructed.get(), 2);
            assert!(destroyed.borrow().is_empty());

            pool.release(b);
        }

        assert_eq!(*destroyed.borrow(), ["b"]);

        let c = pool.allocate(Tracked::new("c", &constructed, &destroyed));
        assert_eq!(constructed.get(), 3);

        pool.release(c);
        assert_eq!(*destroyed.borrow(), ["b", "c"]);

        pool.release(a);
    }

    assert_eq!(constructed.get(), 3);
    assert_eq!(*destroyed.borrow(), ["b", "c", "a"]);
}

#[test]
fn non_default_constructible_payload() {
    let mut pool = GrowingPool::<Box<u32>, 10, 8>::new();

    let outer = pool.allocate(Box::new(10));

    {
        let inner = pool.allocate(Box::new(42));

        assert_eq!(**pool.get(&inner), 42);
        assert_eq!(**pool.get(&outer), 10);

        pool.release(inner);
    }

    assert_eq!(**pool.get(&outer), 10);

    pool.release(outer);
}

#[test]
fn len_tracks_nested_scopes() {
    let mut pool = GrowingPool::<u64, 10, 8>::new();
    assert_eq!(pool.len(), 0);

    let outer: Vec<_> = (0..5)
        .map(|i| {
            let ptr = pool.allocate(i);
            assert_eq!(pool.len(), usize::try_from(i).unwrap() + 1);
            ptr
        })
        .collect();

    {
        let inner: Vec<_> = (0..5).map(|i| pool.allocate(100 + i)).collect();
        assert_eq!(pool.len(), 10);

        for ptr in inner {
            pool.release(ptr);
        }
    }

    assert_eq!(pool.len(), 5);

    for ptr in outer {
        pool.release(ptr);
    }

    assert_eq!(pool.len(), 0);
}

#[test]
fn fill_to_capacity_release_refill() {
    let mut pool = GrowingPool::<u64, 10, 8>::new();

    let mut handles: Vec<_> = (0..10).map(|i| pool.allocate(i)).collect();
    assert!(handles.iter().all(|ptr| !ptr.is_null()));
    assert_eq!(pool.len(), 10);

    assert!(pool.allocate(10).is_null());
    assert_eq!(pool.len(), 10);

    pool.release(handles.remove(0));
    assert_eq!(pool.len(), 9);

    let refill = pool.allocate(10);
    assert!(!refill.is_null());
    assert_eq!(pool.len(), 10);

    handles.push(refill);
    for ptr in handles {
        pool.release(ptr);
    }
}

#[test]
fn dropping_top_down_releases_storage() {
    let mut pool = GrowingPool::<u64, 200, 8>::new();

    let mut handles: Vec<_> = (0..200).map(|i| pool.allocate(i)).collect();
    assert_eq!(pool.reserved_capacity(), 200);

    // Walk the pool down from the top. Eviction happens on the periodic
    // check once the free slots clear the hysteresis margin, so storage
    // falls away bucket by bucket while the low buckets stay put.
    while let Some(ptr) = handles.pop() {
        pool.release(ptr);
    }

    assert_eq!(pool.len(), 0);
    assert!(pool.reserved_capacity() < 200);

    pool.shrink_to_fit();
    assert_eq!(pool.reserved_capacity(), 0);
}

#[test]
fn random_churn_preserves_values_and_leaks_nothing() {
    let mut rng = StdRng::seed_from_u64(100);

    // The strict drop policy turns any leaked value into a test failure at
    // the end of this function.
    let mut pool = GrowingPool::<u64, 200, 8>::builder()
        .drop_policy(DropPolicy::MustNotDropItems)
        .build();

    let mut live: Vec<(u64, PoolPtr<u64, 200, 8>)> = Vec::new();
    let mut next_value = 0_u64;

    for _ in 0..10 {
        // Fill the pool back up to capacity.
        while pool.len() < pool.capacity() {
            let ptr = pool.allocate(next_value);
            assert!(!ptr.is_null());
            live.push((next_value, ptr));
            next_value += 1;
        }

        assert!(pool.allocate(u64::MAX).is_null());

        // Prune roughly half of the live values at random.
        let mut kept = Vec::new();
        for (value, ptr) in live.drain(..) {
            if rng.random_bool(0.5) {
                pool.release(ptr);
            } else {
                kept.push((value, ptr));
            }
        }

        // The survivors still read back what was written into them.
        for (value, ptr) in &kept {
            assert_eq!(pool.get(ptr), value);
        }

        live = kept;
    }

    for (_, ptr) in live.drain(..) {
        pool.release(ptr);
    }

    assert_eq!(pool.len(), 0);
    drop(pool);
}

#[test]
fn handles_do_not_mix_across_shapes() {
    // Handles carry the pool shape in their type; a handle from a pool of a
    // different element type or different shape parameters does not
    // compile:
    //
    // ```compile_fail
    // let mut a = GrowingPool::<u64, 10, 8>::new();
    // let mut b = GrowingPool::<u64, 200, 8>::new();
    // let ptr = a.allocate(1);
    // b.release(ptr);
    // ```
    //
    // What remains at runtime is the null/live distinction within one pool.
    let mut pool = GrowingPool::<u64, 10, 8>::new();

    let ptr = pool.allocate(1);
    assert!(!ptr.is_null());
    assert!(PoolPtr::<u64, 10, 8>::null().is_null());

    pool.release(ptr);
}
