//! Tests for the checksum cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use crate::cache::{
    CacheStore, ChecksumCache, DeviceDependencies, DocumentSource, MemoryCacheStore, StoreError,
    cache_key, checksum,
};
use crate::compose::ComposeError;
use crate::error::{CoreError, ErrorKind};
use crate::model::DeviceId;
use crate::time::Clock;

const TTL: Duration = Duration::from_secs(3600);

/// Document source serving fixed bytes per device and counting renders.
#[derive(Default)]
struct CountingSource {
    documents: Mutex<HashMap<DeviceId, Vec<u8>>>,
    renders: AtomicUsize,
}

impl CountingSource {
    fn with(devices: &[&str]) -> Self {
        let source = Self::default();
        for device in devices {
            source.put(device, format!("{{\"id\":\"{device}\"}}").as_bytes());
        }
        source
    }

    fn put(&self, device: &str, bytes: &[u8]) {
        self.documents
            .lock()
            .unwrap()
            .insert(device.into(), bytes.to_vec());
    }

    fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl DocumentSource for CountingSource {
    fn render(&self, device: &DeviceId) -> Result<Vec<u8>, CoreError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.documents
            .lock()
            .unwrap()
            .get(device)
            .cloned()
            .ok_or_else(|| {
                CoreError::from(ComposeError::MissingVariable {
                    source_name: "t1".to_string(),
                    variable: "ip".to_string(),
                })
            })
    }
}

/// Store whose every operation fails.
struct FailingStore;

impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[derive(Default)]
struct ManualClock {
    secs: AtomicU64,
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.secs.load(Ordering::SeqCst))
    }
}

fn cache(source: CountingSource) -> ChecksumCache<CountingSource> {
    ChecksumCache::new(source, MemoryCacheStore::new(), TTL)
}

fn deps(templates: &[&str], org: &str) -> DeviceDependencies {
    DeviceDependencies {
        templates: templates.iter().map(|t| (*t).into()).collect(),
        vpn_servers: Vec::new(),
        organization: org.into(),
        group: None,
    }
}

mod hashing {
    use super::*;

    #[test]
    fn checksum_is_sha256_hex() {
        assert_eq!(
            checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn key_is_namespaced_by_device() {
        assert_eq!(cache_key(&"d1".into()), "config:checksum:d1");
    }
}

mod lookups {
    use super::*;

    #[tokio::test]
    async fn miss_renders_and_hit_does_not() {
        let cache = cache(CountingSource::with(&["d1"]));
        let device = DeviceId::from("d1");

        let first = cache.get_checksum(&device).await.unwrap();
        let second = cache.get_checksum(&device).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, checksum(br#"{"id":"d1"}"#));
        assert_eq!(cache.source().renders(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_render_once() {
        let cache = Arc::new(cache(CountingSource::with(&["d1"])));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_checksum(&"d1".into()).await.unwrap() })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(cache.source().renders(), 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn render_failure_writes_nothing() {
        let cache = cache(CountingSource::default());
        let device = DeviceId::from("d1");

        let err = cache.get_checksum(&device).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingVariable);
        assert_eq!(cache.cached(&device).await.unwrap(), None);
    }

    #[tokio::test]
    async fn store_failure_fails_the_call() {
        let cache = ChecksumCache::new(CountingSource::with(&["d1"]), FailingStore, TTL);

        let err = cache.get_checksum(&"d1".into()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CacheUnavailable);
        assert_eq!(cache.source().renders(), 0);
    }

    #[tokio::test]
    async fn expired_entry_is_rendered_again() {
        let cache = ChecksumCache::new(
            CountingSource::with(&["d1"]),
            MemoryCacheStore::with_clock(ManualClock::default()),
            Duration::from_secs(30),
        );
        let device = DeviceId::from("d1");
        cache.get_checksum(&device).await.unwrap();

        cache.store().clock().secs.store(30, Ordering::SeqCst);
        cache.get_checksum(&device).await.unwrap();

        assert_eq!(cache.source().renders(), 2);
    }
}

mod invalidation {
    use super::*;

    #[tokio::test]
    async fn invalidate_forces_new_render_with_new_content() {
        let cache = cache(CountingSource::with(&["d1"]));
        let device = DeviceId::from("d1");
        let before = cache.get_checksum(&device).await.unwrap();

        cache.source().put("d1", br#"{"id":"changed"}"#);
        // Still cached until invalidated.
        assert_eq!(cache.get_checksum(&device).await.unwrap(), before);

        cache.invalidate(&device).await.unwrap();
        let after = cache.get_checksum(&device).await.unwrap();

        assert_ne!(before, after);
    }

    #[tokio::test]
    async fn invalidate_absent_entry_is_noop() {
        let cache = cache(CountingSource::default());
        cache.invalidate(&"ghost".into()).await.unwrap();
        cache.invalidate(&"ghost".into()).await.unwrap();
    }

    #[tokio::test]
    async fn template_fan_out_touches_only_dependents() {
        let cache = cache(CountingSource::with(&["a", "b", "c", "other"]));
        for device in ["a", "b", "c"] {
            cache.index().record(&device.into(), deps(&["shared"], "org1"));
        }
        cache.index().record(&"other".into(), deps(&["private"], "org1"));
        for device in ["a", "b", "c", "other"] {
            cache.get_checksum(&device.into()).await.unwrap();
        }

        let count = cache.invalidate_by_template(&"shared".into()).await.unwrap();

        assert_eq!(count, 3);
        for device in ["a", "b", "c"] {
            assert_eq!(cache.cached(&device.into()).await.unwrap(), None);
        }
        assert!(cache.cached(&"other".into()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn org_fan_out() {
        let cache = cache(CountingSource::with(&["a", "b"]));
        cache.index().record(&"a".into(), deps(&[], "org1"));
        cache.index().record(&"b".into(), deps(&[], "org2"));
        cache.get_checksum(&"a".into()).await.unwrap();
        cache.get_checksum(&"b".into()).await.unwrap();

        assert_eq!(cache.invalidate_by_org(&"org1".into()).await.unwrap(), 1);
        assert!(cache.cached(&"b".into()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn fan_out_over_unknown_dependency_is_noop() {
        let cache = cache(CountingSource::default());
        assert_eq!(cache.invalidate_by_group(&"g".into()).await.unwrap(), 0);
        assert_eq!(cache.invalidate_by_vpn_server(&"v".into()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fan_out_reports_store_failure_after_trying_all() {
        let cache = ChecksumCache::new(CountingSource::default(), FailingStore, TTL);
        cache.index().record(&"a".into(), deps(&["t"], "org1"));
        cache.index().record(&"b".into(), deps(&["t"], "org1"));

        let err = cache.invalidate_by_template(&"t".into()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CacheUnavailable);
    }

    #[tokio::test]
    async fn forget_drops_index_entry() {
        let cache = cache(CountingSource::with(&["a"]));
        cache.index().record(&"a".into(), deps(&["t"], "org1"));
        cache.get_checksum(&"a".into()).await.unwrap();

        cache.forget(&"a".into()).await.unwrap();

        assert!(cache.index().devices_for_template(&"t".into()).is_empty());
        assert_eq!(cache.cached(&"a".into()).await.unwrap(), None);
    }
}
