//! Fixed-window request counters keyed by arbitrary strings.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    hits: u32,
}

/// Rejection carrying how long the caller should wait before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: Duration,
}

impl RateLimited {
    /// Whole seconds until the window resets, never zero.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        let rounded = if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        };
        rounded.max(1)
    }
}

/// Allows `max_attempts` hits per key within a window that opens on the first
/// hit and resets once `window` has elapsed.
///
/// Check and increment happen under the map's per-key entry lock, so
/// concurrent hits on the same key are never undercounted.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_attempts: u32,
    window: Duration,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_attempts,
            window,
        }
    }

    /// Records a hit against `key`, or rejects it when the key is exhausted.
    /// Rejected attempts are not counted.
    pub fn hit(&self, key: &str) -> Result<u32, RateLimited> {
        self.hit_at(key, Instant::now())
    }

    pub(crate) fn hit_at(&self, key: &str, now: Instant) -> Result<u32, RateLimited> {
        let mut window = self.windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            hits: 0,
        });

        let elapsed = now.saturating_duration_since(window.started_at);
        if elapsed >= self.window {
            *window = Window {
                started_at: now,
                hits: 0,
            };
        }

        if window.hits >= self.max_attempts {
            let retry_after = self
                .window
                .saturating_sub(now.saturating_duration_since(window.started_at));
            debug!(key = %key, retry_after_ms = retry_after.as_millis(), "Rate limit exceeded");
            return Err(RateLimited { retry_after });
        }

        window.hits += 1;
        Ok(self.max_attempts - window.hits)
    }

    /// Drops windows that have fully elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started_at) < self.window);
        before.saturating_sub(self.windows.len())
    }
}

/// Lowercase ASCII slug of `input` after transliteration: alphanumerics kept,
/// every other run collapsed into a single `-`, no leading or trailing
/// separator. Input that leaves nothing to slug falls back to its trimmed,
/// lowercased self so distinct names never share a key.
#[must_use]
pub fn slugify(input: &str) -> String {
    let slug = ascii_slug(&deunicode::deunicode(input));
    if slug.is_empty() {
        input.trim().to_lowercase()
    } else {
        slug
    }
}

fn ascii_slug(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Aspirin"), "aspirin");
        assert_eq!(slugify("  Tylenol  PM "), "tylenol-pm");
        assert_eq!(slugify("co-codamol 30/500"), "co-codamol-30-500");
        assert_eq!(slugify("Café"), "cafe");
        assert_eq!(slugify("Cafè"), "cafe");
        assert_eq!(slugify("Ibuprofène 400"), "ibuprofene-400");
        assert_eq!(slugify(" --- "), "---");
    }

    #[test]
    fn test_non_latin_names_get_distinct_slugs() {
        let aspirin = slugify("アスピリン");
        let amoxicillin = slugify("アモキシシリン");

        assert!(!aspirin.is_empty());
        assert!(!amoxicillin.is_empty());
        assert_ne!(aspirin, amoxicillin);
    }

    #[test]
    fn test_non_latin_names_have_independent_windows() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        let key = |name: &str| format!("drug-search:{}:1.1.1.1", slugify(name));

        for _ in 0..10 {
            assert!(limiter.hit(&key("アスピリン")).is_ok());
        }
        assert!(limiter.hit(&key("アスピリン")).is_err());
        assert!(limiter.hit(&key("アモキシシリン")).is_ok());
    }

    #[test]
    fn test_eleventh_hit_is_rejected() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..10 {
            let remaining = limiter.hit_at("k", start + Duration::from_secs(i)).unwrap();
            assert_eq!(remaining, 9 - u32::try_from(i).unwrap());
        }

        let rejected = limiter
            .hit_at("k", start + Duration::from_secs(15))
            .unwrap_err();
        assert_eq!(rejected.retry_after, Duration::from_secs(45));
        assert_eq!(rejected.retry_after_secs(), 45);
    }

    #[test]
    fn test_window_resets_after_elapsing() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.hit_at("k", start).is_ok());
        assert!(limiter.hit_at("k", start).is_ok());
        assert!(limiter.hit_at("k", start + Duration::from_secs(59)).is_err());
        assert!(limiter.hit_at("k", start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.hit("drug-search:aspirin:1.1.1.1").is_ok());
        assert!(limiter.hit("drug-search:aspirin:1.1.1.1").is_err());
        assert!(limiter.hit("drug-search:aspirin:2.2.2.2").is_ok());
        assert!(limiter.hit("drug-search:ibuprofen:1.1.1.1").is_ok());
    }

    #[test]
    fn test_retry_after_is_never_zero() {
        let rejected = RateLimited {
            retry_after: Duration::ZERO,
        };
        assert_eq!(rejected.retry_after_secs(), 1);

        let rejected = RateLimited {
            retry_after: Duration::from_millis(1500),
        };
        assert_eq!(rejected.retry_after_secs(), 2);
    }

    #[test]
    fn test_concurrent_hits_are_not_undercounted() {
        let limiter = Arc::new(RateLimiter::new(50, Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || (0..20).filter(|_| limiter.hit("k").is_ok()).count())
            })
            .collect();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(accepted, 50);
    }

    #[test]
    fn test_purge_expired() {
        let limiter = RateLimiter::new(5, Duration::from_millis(1));
        limiter.hit("a").unwrap();
        limiter.hit("b").unwrap();

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(limiter.purge_expired(), 2);
    }
}
