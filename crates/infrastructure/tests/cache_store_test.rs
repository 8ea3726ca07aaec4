mod helpers;

use futures::future::join_all;
use helpers::builders::*;
use relay_dns_application::ports::CacheStore;
use relay_dns_domain::config::EvictionStrategy;
use relay_dns_infrastructure::dns::{DnsCache, DnsCacheConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn cache() -> DnsCache {
    DnsCache::new(DnsCacheConfig::default())
}

fn bounded(max_entries: usize, strategy: EvictionStrategy) -> DnsCache {
    DnsCache::new(DnsCacheConfig {
        max_entries,
        eviction_strategy: strategy,
        ..DnsCacheConfig::default()
    })
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn test_hit_before_expiry_miss_at_expiry() {
    let cache = cache();
    let t0 = Instant::now();

    cache.insert(key("example.com"), positive("example.com", 30), t0);

    let hit = cache.lookup(&key("example.com"), t0 + secs(29)).unwrap();
    assert!(hit.is_some());

    let at_expiry = cache.lookup(&key("example.com"), t0 + secs(30)).unwrap();
    assert!(at_expiry.is_none());
    assert_eq!(cache.len(), 0, "expired entry is removed at lookup");

    let snapshot = cache.metrics_snapshot();
    assert_eq!(snapshot.hits, 1);
    assert_eq!(snapshot.misses, 1);
    assert_eq!(snapshot.expired_removals, 1);
}

#[test]
fn test_expiry_uses_minimum_ttl_of_record_set() {
    let cache = cache();
    let t0 = Instant::now();
    let mut answer = (*positive("example.com", 300)).clone();
    answer.answers.push(a_record("example.com", 45, [192, 0, 2, 2]));

    let entry = cache
        .insert(key("example.com"), Arc::new(answer), t0)
        .unwrap();

    assert_eq!(entry.expires_at, t0 + secs(45));
}

#[test]
fn test_zero_ttl_is_not_stored() {
    let cache = cache();

    let stored = cache.insert(key("example.com"), positive("example.com", 0), Instant::now());

    assert!(stored.is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_failure_rcodes_are_never_cached() {
    let cache = cache();

    assert!(cache
        .insert(key("example.com"), servfail(), Instant::now())
        .is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_negative_answer_cached_with_soa_minimum() {
    let cache = cache();
    let t0 = Instant::now();

    let entry = cache
        .insert(key("missing.example.com"), nxdomain("example.com", 3600, 120), t0)
        .unwrap();

    assert_eq!(entry.expires_at, t0 + secs(120));
    assert!(entry.answer.is_negative());
    assert!(cache
        .lookup(&key("missing.example.com"), t0 + secs(119))
        .unwrap()
        .is_some());
}

#[test]
fn test_negative_answer_without_soa_is_not_cached() {
    let cache = cache();

    assert!(cache
        .insert(key("missing.example.com"), nxdomain_without_soa(), Instant::now())
        .is_none());
}

#[test]
fn test_ttl_clamped_to_configured_bounds() {
    let cache = DnsCache::new(DnsCacheConfig {
        min_ttl: 30,
        max_ttl: 3600,
        ..DnsCacheConfig::default()
    });
    let t0 = Instant::now();

    let low = cache.insert(key("low.example.com"), positive("low.example.com", 5), t0).unwrap();
    let high = cache
        .insert(key("high.example.com"), positive("high.example.com", 604_800), t0)
        .unwrap();

    assert_eq!(low.expires_at, t0 + secs(30));
    assert_eq!(high.expires_at, t0 + secs(3600));
    assert!(cache
        .insert(key("zero.example.com"), positive("zero.example.com", 0), t0)
        .is_none());
}

#[test]
fn test_insert_overwrites_previous_entry() {
    let cache = cache();
    let t0 = Instant::now();

    cache.insert(key("example.com"), positive("example.com", 60), t0);
    cache.insert(key("example.com"), positive("example.com", 600), t0 + secs(10));

    let entry = cache.lookup(&key("example.com"), t0 + secs(100)).unwrap().unwrap();
    assert_eq!(entry.inserted_at, t0 + secs(10));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_lookup_is_case_insensitive() {
    let cache = cache();
    let t0 = Instant::now();

    cache.insert(key("Example.COM."), positive("example.com", 60), t0);

    assert!(cache.lookup(&key("example.com"), t0).unwrap().is_some());
}

#[test]
fn test_lru_evicts_least_recently_read() {
    let cache = bounded(3, EvictionStrategy::Lru);
    let t0 = Instant::now();

    cache.insert(key("a.example"), positive("a.example", 300), t0);
    cache.insert(key("b.example"), positive("b.example", 300), t0);
    cache.insert(key("c.example"), positive("c.example", 300), t0);
    cache.lookup(&key("a.example"), t0 + secs(1)).unwrap();
    cache.lookup(&key("c.example"), t0 + secs(1)).unwrap();

    cache.insert(key("d.example"), positive("d.example", 300), t0 + secs(2));

    assert_eq!(cache.len(), 3);
    assert!(cache.lookup(&key("b.example"), t0 + secs(3)).unwrap().is_none());
    assert!(cache.lookup(&key("a.example"), t0 + secs(3)).unwrap().is_some());
    assert!(cache.lookup(&key("d.example"), t0 + secs(3)).unwrap().is_some());
    assert_eq!(cache.metrics_snapshot().evictions, 1);
}

#[test]
fn test_expiry_strategy_evicts_soonest_to_expire() {
    let cache = bounded(3, EvictionStrategy::Expiry);
    let t0 = Instant::now();

    cache.insert(key("a.example"), positive("a.example", 300), t0);
    cache.insert(key("b.example"), positive("b.example", 60), t0);
    cache.insert(key("c.example"), positive("c.example", 600), t0);

    cache.insert(key("d.example"), positive("d.example", 120), t0 + secs(1));

    assert_eq!(cache.len(), 3);
    assert!(cache.lookup(&key("b.example"), t0 + secs(2)).unwrap().is_none());
    assert!(cache.lookup(&key("a.example"), t0 + secs(2)).unwrap().is_some());
}

#[test]
fn test_full_cache_purges_expired_before_evicting() {
    let cache = bounded(2, EvictionStrategy::Lru);
    let t0 = Instant::now();

    cache.insert(key("short.example"), positive("short.example", 10), t0);
    cache.insert(key("long.example"), positive("long.example", 300), t0);

    cache.insert(key("new.example"), positive("new.example", 300), t0 + secs(20));

    let snapshot = cache.metrics_snapshot();
    assert_eq!(snapshot.evictions, 0);
    assert_eq!(snapshot.expired_removals, 1);
    assert!(cache.lookup(&key("long.example"), t0 + secs(21)).unwrap().is_some());
    assert!(cache.lookup(&key("new.example"), t0 + secs(21)).unwrap().is_some());
}

#[test]
fn test_refreshing_existing_key_does_not_evict() {
    let cache = bounded(2, EvictionStrategy::Lru);
    let t0 = Instant::now();

    cache.insert(key("a.example"), positive("a.example", 300), t0);
    cache.insert(key("b.example"), positive("b.example", 300), t0);
    cache.insert(key("a.example"), positive("a.example", 300), t0 + secs(1));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.metrics_snapshot().evictions, 0);
}

#[test]
fn test_zero_max_entries_is_unbounded() {
    let cache = bounded(0, EvictionStrategy::Lru);
    let t0 = Instant::now();

    for i in 0..200 {
        let name = format!("host{}.example", i);
        cache.insert(key(&name), positive(&name, 300), t0);
    }

    assert_eq!(cache.len(), 200);
    assert_eq!(cache.metrics_snapshot().evictions, 0);
}

#[test]
fn test_remove() {
    let cache = cache();
    cache.insert(key("example.com"), positive("example.com", 60), Instant::now());

    assert!(cache.remove(&key("example.com")));
    assert!(!cache.remove(&key("example.com")));
}

#[tokio::test]
async fn test_concurrent_readers_see_whole_entries() {
    let cache = Arc::new(cache());
    let t0 = Instant::now();
    cache.insert(key("example.com"), positive("example.com", 60), t0);

    let tasks = (0..50u64).map(|i| {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            if i % 5 == 0 {
                cache.insert(key("example.com"), positive("example.com", 120), t0 + secs(1));
                None
            } else {
                cache.lookup(&key("example.com"), t0 + secs(2)).unwrap()
            }
        })
    });

    for result in join_all(tasks).await {
        if let Some(entry) = result.unwrap() {
            assert_eq!(entry.key, key("example.com"));
            assert_eq!(entry.answer.answers.len(), 1);
        }
    }
    assert_eq!(cache.len(), 1);
}
