//! Short-lived cache for raw provider responses.
//!
//! Entries only spare duplicate upstream calls; serving a value that is up to one TTL
//! old is acceptable. Backings implement [`ResponseCache`] and are injected into the
//! weather service.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::Coordinates;
use crate::types::geo::round4;

/// Upstream operation a cached body belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOp {
    OneCall,
    Forecast,
    Current,
    Geocode,
}

impl CacheOp {
    fn as_str(self) -> &'static str {
        match self {
            CacheOp::OneCall => "onecall",
            CacheOp::Forecast => "forecast",
            CacheOp::Current => "current",
            CacheOp::Geocode => "geocode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    op: CacheOp,
    subject: String,
    units: String,
    lang: String,
}

impl CacheKey {
    /// Key for a coordinate query; coordinates are rounded to 4 decimals so nearby
    /// requests share an entry.
    pub fn at(op: CacheOp, coords: Coordinates, units: &str, lang: &str) -> Self {
        Self {
            op,
            subject: format!("{:.4},{:.4}", round4(coords.lat), round4(coords.lon)),
            units: units.to_string(),
            lang: lang.to_string(),
        }
    }

    pub fn query(op: CacheOp, query: &str) -> Self {
        Self {
            op,
            subject: query.trim().to_lowercase(),
            units: String::new(),
            lang: String::new(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.op.as_str(),
            self.subject,
            self.units,
            self.lang
        )
    }
}

pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Arc<str>>;
    fn put(&self, key: CacheKey, body: Arc<str>, ttl: Duration);
}

/// In-process map with lazy expiry.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, (Arc<str>, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<Arc<str>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((body, expires_at)) if Instant::now() < *expires_at => Some(body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: CacheKey, body: Arc<str>, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, (_, expires_at)| now < *expires_at);
        entries.insert(key, (body, now + ttl));
    }
}

/// Backing used when caching is disabled.
pub struct NoopCache;

impl ResponseCache for NoopCache {
    fn get(&self, _key: &CacheKey) -> Option<Arc<str>> {
        None
    }

    fn put(&self, _key: CacheKey, _body: Arc<str>, _ttl: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn key_rounds_coordinates_and_keeps_dimensions() {
        let a = CacheKey::at(CacheOp::OneCall, coords(48.856_61, 2.351_49), "metric", "en");
        let b = CacheKey::at(CacheOp::OneCall, coords(48.856_59, 2.351_51), "metric", "en");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "onecall:48.8566,2.3515:metric:en");

        let other_units = CacheKey::at(CacheOp::OneCall, coords(48.8566, 2.3515), "imperial", "en");
        assert_ne!(a, other_units);
        let other_op = CacheKey::at(CacheOp::Forecast, coords(48.8566, 2.3515), "metric", "en");
        assert_ne!(a, other_op);
    }

    #[test]
    fn memory_cache_hits_until_expiry() {
        let cache = MemoryCache::new();
        let key = CacheKey::query(CacheOp::Geocode, " Paris ");
        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), Arc::from("[]"), Duration::from_secs(60));
        assert_eq!(cache.get(&CacheKey::query(CacheOp::Geocode, "paris")).as_deref(), Some("[]"));

        let stale = CacheKey::query(CacheOp::Geocode, "oslo");
        cache.put(stale.clone(), Arc::from("[1]"), Duration::ZERO);
        assert!(cache.get(&stale).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn noop_cache_never_stores() {
        let key = CacheKey::query(CacheOp::Geocode, "rome");
        NoopCache.put(key.clone(), Arc::from("x"), Duration::from_secs(60));
        assert!(NoopCache.get(&key).is_none());
    }
}
