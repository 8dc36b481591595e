//! Integration Tests for the Cache
//!
//! Exercises the public surface end to end: storage and retrieval at scale,
//! expiry, eviction under capacity pressure, promotion of hot keys,
//! concurrent access, statistics, and the background vacuum task.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ringcache::{Cache, CacheError, Config, ManualClock, spawn_vacuum_task};

// == Helper Functions ==

/// Installs the logging subscriber once; later calls are no-ops.
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ringcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init()
        .ok();
}

// == Storage and Retrieval Tests ==

/// A distinct 100-byte value for key number `i`.
fn payload(i: usize) -> Vec<u8> {
    let mut value = format!("value-{:03}", i).into_bytes();
    value.resize(100, b'.');
    value
}

#[test]
fn test_thousand_keys_all_retrievable() {
    init_logging();
    // 1000 records of ~130 bytes sit far below 1 MiB: nothing may evict.
    let cache = Cache::new(1024 * 1024);

    for i in 0..1_000 {
        let key = format!("k{}", i);
        cache.set(key.as_bytes(), &payload(i), 0).unwrap();
    }
    assert_eq!(cache.len(), 1_000);

    for i in 0..1_000 {
        let key = format!("k{}", i);
        assert_eq!(cache.get(key.as_bytes()).unwrap(), payload(i));
    }

    let stats = cache.stats();
    assert_eq!(stats.hits, 1_000);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.total_count, 1_000);
    assert_eq!(stats.evictions, 0);
}

#[test]
fn test_offsets_stable_until_value_outgrows_slack() {
    init_logging();
    let cache = Cache::new(1024 * 1024);

    cache.set(b"record", &[b'a'; 64], 0).unwrap();
    let offset = cache.offset_of(b"record").unwrap();

    // Equal and smaller values reuse the reserved region in place.
    cache.set(b"record", &[b'b'; 64], 0).unwrap();
    assert_eq!(cache.offset_of(b"record"), Some(offset));
    cache.set(b"record", &[b'c'; 16], 0).unwrap();
    assert_eq!(cache.offset_of(b"record"), Some(offset));
    assert_eq!(cache.stats().overwrites, 2);

    // Outgrowing the slack retires the record and appends a fresh one.
    cache.set(b"record", &[b'd'; 100], 0).unwrap();
    assert_ne!(cache.offset_of(b"record"), Some(offset));
    assert_eq!(cache.get(b"record").unwrap(), vec![b'd'; 100]);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_delete_semantics() {
    init_logging();
    let cache = Cache::new(1024 * 1024);

    cache.set(b"doomed", b"value", 0).unwrap();
    assert_eq!(cache.delete(b"doomed"), Ok(()));
    assert_eq!(cache.get(b"doomed"), Err(CacheError::NotFound));
    assert_eq!(cache.delete(b"doomed"), Err(CacheError::NotFound));

    // A deleted key can be stored again.
    cache.set(b"doomed", b"revived", 0).unwrap();
    assert_eq!(cache.get(b"doomed").unwrap(), b"revived");
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_empty_and_binary_payloads() {
    init_logging();
    let cache = Cache::new(1024 * 1024);

    cache.set(b"empty", b"", 0).unwrap();
    assert_eq!(cache.get(b"empty").unwrap(), b"");

    // Keys and values are raw bytes, not strings.
    let key = [0u8, 255, 1, 254, 127, 128];
    let value: Vec<u8> = (0u8..=255).collect();
    cache.set(&key, &value, 0).unwrap();
    assert_eq!(cache.get(&key).unwrap(), value);
}

#[test]
fn test_maximum_key_length_boundary() {
    init_logging();
    // Half-megabyte shards leave room for a full-length key in one record.
    let cache = Cache::new(128 * 1024 * 1024);

    let key = vec![b'k'; ringcache::cache::MAX_KEY_LEN];
    cache.set(&key, b"tip", 0).unwrap();
    assert_eq!(cache.get(&key).unwrap(), b"tip");

    let too_long = vec![b'k'; ringcache::cache::MAX_KEY_LEN + 1];
    assert!(matches!(
        cache.set(&too_long, b"tip", 0),
        Err(CacheError::KeyTooLarge(_))
    ));
}

// == Expiry Tests ==

#[test]
fn test_expiry_follows_the_clock() {
    init_logging();
    let clock = Arc::new(ManualClock::new(10_000));
    let cache = Cache::with_clock(1024 * 1024, clock.clone());

    cache.set(b"sticky", b"stays", 0).unwrap();
    cache.set(b"brief", b"goes", 120).unwrap();

    clock.advance(119);
    assert_eq!(cache.get(b"brief").unwrap(), b"goes");
    assert_eq!(cache.get(b"sticky").unwrap(), b"stays");

    // The deadline itself is already a miss.
    clock.advance(1);
    assert_eq!(cache.get(b"brief"), Err(CacheError::NotFound));
    assert_eq!(cache.get(b"sticky").unwrap(), b"stays");

    assert_eq!(cache.stats().expirations, 1);
    assert_eq!(cache.len(), 1);
}

// == Eviction and Promotion Tests ==

#[test]
fn test_eviction_under_sustained_pressure() {
    init_logging();
    // Zero requested capacity floors to 512 KiB: 2 KiB per shard.
    let cache = Cache::new(0);
    let value = vec![b'p'; 300];

    for i in 0..6_000 {
        let key = format!("evict-{}", i);
        cache.set(key.as_bytes(), &value, 0).unwrap();
    }

    // The newest record is always addressable.
    assert_eq!(cache.get(b"evict-5999").unwrap(), value);

    // Roughly 1.9 MiB went into 512 KiB of rings, so at most a quarter of
    // the records can still be addressable, and they skew recent.
    let mut missing = 0;
    let mut missing_in_oldest_half = 0;
    for i in 0..6_000 {
        let key = format!("evict-{}", i);
        if cache.get(key.as_bytes()) == Err(CacheError::NotFound) {
            missing += 1;
            if i < 3_000 {
                missing_in_oldest_half += 1;
            }
        }
    }

    assert!(missing >= 4_000, "only {} of 6000 records evicted", missing);
    assert!(
        missing_in_oldest_half >= 1_200,
        "only {} of the oldest 3000 records evicted",
        missing_in_oldest_half
    );
    assert!(cache.len() <= 1_600);

    let stats = cache.stats();
    assert!(stats.evictions > 0);
    assert_eq!(stats.hits + stats.misses, 6_001);
}

#[test]
fn test_hot_key_survives_sustained_pressure() {
    init_logging();
    let cache = Cache::new(0);
    let hot_value = vec![b'h'; 200];
    cache.set(b"hot", &hot_value, 0).unwrap();

    // Write several times the cache's capacity in filler while reading the
    // hot key back every few stores. Promotion keeps re-appending it ahead
    // of the window, so it outlives records stored long after it.
    let filler = vec![b'f'; 40];
    for i in 0..20_000 {
        let key = format!("fill-{}", i);
        cache.set(key.as_bytes(), &filler, 0).unwrap();
        if i % 16 == 15 {
            assert_eq!(cache.get(b"hot").unwrap(), hot_value);
        }
    }

    assert_eq!(cache.get(b"hot").unwrap(), hot_value);
    assert!(cache.stats().touches >= 1, "hot key was never promoted");
}

// == Concurrency Tests ==

#[test]
fn test_parallel_workers_mixed_operations() {
    init_logging();
    let cache = Arc::new(Cache::new(16 * 1024 * 1024));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..250 {
                    let key = format!("worker-{}-item-{}", worker, i);
                    let value = format!("payload-{}-{}", worker, i);
                    cache.set(key.as_bytes(), value.as_bytes(), 0).unwrap();
                    assert_eq!(cache.get(key.as_bytes()).unwrap(), value.as_bytes());
                    if i % 5 == 0 {
                        cache.delete(key.as_bytes()).unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Each worker deleted 50 of its 250 keys again.
    assert_eq!(cache.len(), 8 * 200);

    let stats = cache.stats();
    assert_eq!(stats.hits, 8 * 250);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.evictions, 0);
}

// == Statistics Tests ==

#[test]
fn test_stats_snapshot_over_workload() {
    init_logging();
    let cache = Cache::new(1024 * 1024);
    let value = vec![b's'; 32];

    for i in 0..100 {
        let key = format!("stat-{}", i);
        cache.set(key.as_bytes(), &value, 0).unwrap();
    }
    for i in 0..60 {
        let key = format!("stat-{}", i);
        cache.get(key.as_bytes()).unwrap();
    }
    for i in 0..40 {
        let key = format!("absent-{}", i);
        assert_eq!(cache.get(key.as_bytes()), Err(CacheError::NotFound));
    }
    for i in 0..10 {
        let key = format!("stat-{}", i);
        cache.delete(key.as_bytes()).unwrap();
    }
    // Same-size stores land in place and count as overwrites.
    for i in 10..15 {
        let key = format!("stat-{}", i);
        cache.set(key.as_bytes(), &value, 0).unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.hits, 60);
    assert_eq!(stats.misses, 40);
    assert_eq!(stats.entry_count, 90);
    assert_eq!(stats.total_count, 100);
    assert_eq!(stats.overwrites, 5);
    assert_eq!(stats.evictions, 0);
    assert_eq!(stats.expirations, 0);
    assert_eq!(stats.hit_rate(), 0.6);
    assert_eq!(cache.len(), 90);

    // Snapshots serialize for reporting endpoints.
    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["hits"], 60);
    assert_eq!(json["entry_count"], 90);
}

// == Background Vacuum Tests ==

#[tokio::test]
async fn test_vacuum_task_reclaims_in_background() {
    init_logging();
    let config = Config {
        capacity_bytes: 1024 * 1024,
        vacuum_interval: 1,
    };
    let cache = Arc::new(Cache::from_config(&config));

    cache.set(b"brief", b"value", 1).unwrap();
    cache.set(b"stays", b"value", 0).unwrap();

    let handle = spawn_vacuum_task(cache.clone(), config.vacuum_interval);

    // Two sweeps pass; the second runs well after the deadline.
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    // The expired record is gone without anyone having looked it up.
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(b"stays").unwrap(), b"value");
    assert_eq!(cache.stats().expirations, 1);

    handle.abort();
}
