// src/normalize/memo.rs
use log::info;
use lru::LruCache;
use std::num::NonZero;

// Default cache size - can be configured via environment variable
const DEFAULT_CACHE_SIZE: usize = 50000;

/// A service for memoizing profile cleaning results. Source feeds repeat the
/// same raw names many times, so cleaning each distinct string once is a
/// large ingest speedup.
pub struct CleaningCache {
    cache: LruCache<String, String>,
    pub hits: usize,
    pub misses: usize,
}

impl CleaningCache {
    pub fn new() -> Self {
        let cache_size = std::env::var("CLEANING_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_CACHE_SIZE);

        info!("Initializing CleaningCache with cache size: {}", cache_size);

        Self {
            cache: LruCache::new(NonZero::new(cache_size).unwrap()),
            hits: 0,
            misses: 0,
        }
    }

    /// Clean `name` with `clean_fn`, returning the cached result when this
    /// exact string was cleaned before.
    pub fn get_or_clean(&mut self, name: &str, clean_fn: fn(&str) -> String) -> String {
        if let Some(cleaned) = self.cache.get(name) {
            self.hits += 1;
            if self.hits % 10000 == 0 {
                info!(
                    "CleaningCache stats - hits: {}, misses: {}, hit rate: {:.2}%",
                    self.hits,
                    self.misses,
                    (self.hits as f64 / (self.hits + self.misses) as f64) * 100.0
                );
            }
            return cleaned.clone();
        }

        self.misses += 1;
        let cleaned = clean_fn(name);
        self.cache.put(name.to_string(), cleaned.clone());
        cleaned
    }

    pub fn log_final_stats(&self) {
        let total = self.hits + self.misses;
        if total > 0 {
            info!(
                "CleaningCache final stats - hits: {}, misses: {}, hit rate: {:.2}%",
                self.hits,
                self.misses,
                (self.hits as f64 / total as f64) * 100.0
            );
        }
    }
}

impl Default for CleaningCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shout(s: &str) -> String {
        s.to_uppercase()
    }

    #[test]
    fn second_lookup_is_a_hit() {
        let mut cache = CleaningCache::new();
        assert_eq!(cache.get_or_clean("aspirin", shout), "ASPIRIN");
        assert_eq!(cache.get_or_clean("aspirin", shout), "ASPIRIN");
        assert_eq!(cache.hits, 1);
        assert_eq!(cache.misses, 1);
    }

    #[test]
    fn distinct_strings_are_distinct_entries() {
        let mut cache = CleaningCache::new();
        cache.get_or_clean("a", shout);
        cache.get_or_clean("b", shout);
        assert_eq!(cache.misses, 2);
        assert_eq!(cache.hits, 0);
    }
}
