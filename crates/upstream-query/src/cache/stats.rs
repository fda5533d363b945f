/// Snapshot of a cache's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    /// `hits / (hits + misses)`, 0 before the first lookup.
    pub hit_ratio: f64,
    /// Failed parses, only ever incremented by the syntax cache.
    pub parse_errors: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub parse_errors: u64,
}

impl Counters {
    pub fn snapshot(&self, size: usize) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size,
            hit_ratio: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
            parse_errors: self.parse_errors,
        }
    }
}
