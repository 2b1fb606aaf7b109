//! Mask Pool Tests

use std::sync::Arc;

use crossbeam::thread;
use pdlkit::config::PoolConfig;
use pdlkit::wire::{decode_from_slice, MaskPool, PooledMask, WireMessage, WireReader, WireWriter};

use crate::fixtures::{full_sample, Sample, Wide};

#[test]
fn test_acquired_masks_are_cleared() {
    let pool = MaskPool::default();
    let mut mask = pool.acquire(2);
    mask.set(3);
    mask.set(33);
    pool.release(mask);

    let mask = pool.acquire(2);
    assert_eq!(mask.word_count(), 2);
    assert!(mask.is_empty());
    assert_eq!(pool.stats().reused, 1);
}

#[test]
fn test_sub_pools_are_keyed_by_word_count() {
    let pool = MaskPool::default();
    pool.release(pool.acquire(1));
    pool.release(pool.acquire(2));

    assert_eq!(pool.retained(1), 1);
    assert_eq!(pool.retained(2), 1);

    let mask = pool.acquire(2);
    assert_eq!(mask.word_count(), 2);
    assert_eq!(pool.retained(1), 1);
    assert_eq!(pool.retained(2), 0);
}

#[test]
fn test_full_sub_pool_discards() {
    let pool = MaskPool::new(PoolConfig {
        base_capacity: 2,
        max_capacity: 2,
    });
    let masks: Vec<_> = (0..5).map(|_| pool.acquire(1)).collect();
    for mask in masks {
        pool.release(mask);
    }

    assert_eq!(pool.retained(1), 2);
    assert_eq!(pool.stats().discarded, 3);
    assert_eq!(pool.stats().allocated, 5);
}

#[test]
fn test_capacity_scales_with_words() {
    let pool = MaskPool::new(PoolConfig {
        base_capacity: 4,
        max_capacity: 10,
    });
    assert_eq!(pool.capacity(1), 4);
    assert_eq!(pool.capacity(2), 8);
    assert_eq!(pool.capacity(3), 10);
}

#[test]
fn test_pooled_mask_returns_on_drop() {
    let pool = Arc::new(MaskPool::default());
    {
        let mut mask = PooledMask::acquire(Some(Arc::clone(&pool)), 3);
        mask.set(70);
        assert!(mask.is_set(70));
    }
    assert_eq!(pool.retained(3), 1);
}

#[test]
fn test_zero_words_bypass_pool() {
    let pool = MaskPool::default();
    let mask = pool.acquire(0);
    assert_eq!(mask.word_count(), 0);
    pool.release(mask);
    assert_eq!(pool.stats().allocated, 0);
    assert_eq!(pool.retained(0), 0);
}

#[test]
fn test_concurrent_encode_decode_with_shared_pool() {
    let pool = Arc::new(MaskPool::default());
    let sample = full_sample();
    let expected = {
        let mut wide = Wide::default();
        wide.values[1] = 1;
        wide.values[39] = 39;
        wide
    };

    thread::scope(|s| {
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            let sample = &sample;
            let expected = &expected;
            s.spawn(move |_| {
                for _ in 0..200 {
                    let mut w = WireWriter::with_pool(Arc::clone(&pool));
                    sample.write_message(&mut w).unwrap();
                    expected.write_message(&mut w).unwrap();

                    let bytes = w.into_vec();
                    let mut r = WireReader::with_pool(&bytes, Arc::clone(&pool));
                    assert_eq!(&Sample::read_message(&mut r).unwrap(), sample);
                    assert_eq!(&Wide::read_message(&mut r).unwrap(), expected);
                    assert!(r.is_empty());
                }
            });
        }
    })
    .unwrap();

    let stats = pool.stats();
    assert!(stats.reused > stats.allocated);
    assert!(pool.retained(1) <= pool.capacity(1));
    assert!(pool.retained(2) <= pool.capacity(2));

    let bytes = pdlkit::wire::encode_to_vec(&expected).unwrap();
    assert_eq!(decode_from_slice::<Wide>(&bytes).unwrap(), expected);
}
