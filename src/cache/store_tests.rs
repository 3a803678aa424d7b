//! Tests for the in-memory store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use crate::cache::{CacheStore, MemoryCacheStore};
use crate::time::Clock;

/// Clock whose time only moves when told to.
#[derive(Default)]
struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.secs.load(Ordering::SeqCst))
    }
}

#[tokio::test]
async fn set_then_get() {
    let store = MemoryCacheStore::new();
    store
        .set("k", "v".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
}

#[tokio::test]
async fn missing_key_is_none() {
    let store = MemoryCacheStore::new();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let store = MemoryCacheStore::with_clock(ManualClock::default());
    store
        .set("k", "v".to_string(), Duration::from_secs(10))
        .await
        .unwrap();

    store.clock().advance(9);
    assert!(store.get("k").await.unwrap().is_some());

    store.clock().advance(1);
    assert_eq!(store.get("k").await.unwrap(), None);
    assert!(store.is_empty());
}

#[tokio::test]
async fn overflowing_ttl_never_expires() {
    let store = MemoryCacheStore::with_clock(ManualClock::default());
    store.set("k", "v".to_string(), Duration::MAX).await.unwrap();

    store.clock().advance(u64::from(u32::MAX));
    assert!(store.get("k").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = MemoryCacheStore::new();
    store
        .set("k", "v".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    store.delete("k").await.unwrap();
    store.delete("k").await.unwrap();

    assert_eq!(store.get("k").await.unwrap(), None);
}
