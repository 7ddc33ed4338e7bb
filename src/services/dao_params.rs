//! DAO parameter lookups behind a TTL cache
//!
//! Derived per-DAO governance parameters change rarely, so lookups go
//! through a small read-through cache with a fixed expiry. The cache is
//! an explicit component with an injectable clock: stale entries return
//! None and are evicted lazily on the access that finds them expired,
//! and the whole cache can be cleared as a unit.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::services::governor::{Governor, GovernorParams};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Expiry policy for cached entries
#[derive(Debug, Clone, Copy)]
pub struct TtlPolicy {
    pub ttl: Duration,
}

impl TtlPolicy {
    pub fn minutes(minutes: u64) -> Self {
        Self {
            ttl: Duration::from_secs(minutes * 60),
        }
    }
}

pub struct TtlCache<V: Clone> {
    entries: RwLock<HashMap<String, (V, Instant)>>,
    policy: TtlPolicy,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(policy: TtlPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some((value, stored_at))
                    if now.duration_since(*stored_at) < self.policy.ttl =>
                {
                    return Some(value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // expired: evict lazily on this access
        self.entries.write().remove(key);
        None
    }

    pub fn set(&self, key: String, value: V) {
        let now = self.clock.now();
        self.entries.write().insert(key, (value, now));
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Read-through lookup of derived governance parameters per DAO
#[derive(Clone)]
pub struct DaoParamsService {
    governors: Arc<HashMap<String, Governor>>,
    cache: Arc<TtlCache<GovernorParams>>,
}

impl DaoParamsService {
    pub fn new(governors: HashMap<String, Governor>, policy: TtlPolicy) -> Self {
        Self::with_clock(governors, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        governors: HashMap<String, Governor>,
        policy: TtlPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            governors: Arc::new(governors),
            cache: Arc::new(TtlCache::new(policy, clock)),
        }
    }

    /// Parameters for one DAO, recomputed lazily on a cache miss
    pub fn params_for(&self, dao_id: &str) -> Option<GovernorParams> {
        if let Some(params) = self.cache.get(dao_id) {
            return Some(params);
        }

        let governor = self.governors.get(dao_id)?;
        let params = governor.params().clone();
        debug!(dao_id = %dao_id, "DAO params recomputed");
        self.cache.set(dao_id.to_string(), params.clone());
        Some(params)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::governor::GovernorFamily;
    use parking_lot::Mutex;

    struct FakeClock {
        now: Mutex<Instant>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock();
            *now += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.now.lock()
        }
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let clock = Arc::new(FakeClock::new());
        let cache: TtlCache<u32> = TtlCache::new(TtlPolicy::minutes(5), clock.clone());

        cache.set("key".to_string(), 7);
        assert_eq!(cache.get("key"), Some(7));

        clock.advance(Duration::from_secs(4 * 60));
        assert_eq!(cache.get("key"), Some(7));

        clock.advance(Duration::from_secs(2 * 60));
        assert_eq!(cache.get("key"), None);
        // the expired entry was evicted, not retained
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache: TtlCache<u32> =
            TtlCache::new(TtlPolicy::minutes(5), Arc::new(SystemClock));
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_params_are_recomputed_after_expiry() {
        let clock = Arc::new(FakeClock::new());
        let governors = HashMap::from([(
            "testdao".to_string(),
            Governor::with_default_params(GovernorFamily::Standard),
        )]);
        let service =
            DaoParamsService::with_clock(governors, TtlPolicy::minutes(5), clock.clone());

        let first = service.params_for("testdao").unwrap();
        clock.advance(Duration::from_secs(10 * 60));
        let second = service.params_for("testdao").unwrap();
        assert_eq!(first, second);
        assert!(service.params_for("unknown").is_none());
    }
}
