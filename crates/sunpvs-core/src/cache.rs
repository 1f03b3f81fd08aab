// ── Telemetry cache policy ──
//
// The supervisor holds the cached variable sets; the client only tracks
// which cache ids it has primed. A primed id is queried by name alone, an
// unprimed one re-supplies its match pattern so the set is rebuilt.

use std::collections::HashSet;

use sunpvs_api::{CacheId, LocalApiClient, VarMap, VarQuery};
use tracing::debug;

#[derive(Debug, Default)]
pub struct TelemetryCache {
    primed: HashSet<CacheId>,
}

impl TelemetryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_primed(&self, cache: CacheId) -> bool {
        self.primed.contains(&cache)
    }

    /// The query to send for `cache` right now.
    pub fn query(&self, cache: CacheId) -> VarQuery {
        VarQuery::for_cache(cache, !self.is_primed(cache))
    }

    /// Fetch one category, priming its cache id on success.
    pub async fn fetch(
        &mut self,
        api: &mut LocalApiClient,
        cache: CacheId,
    ) -> Result<VarMap, sunpvs_api::Error> {
        let query = self.query(cache);
        let vars = api.query_vars(&query).await?;
        if self.primed.insert(cache) {
            debug!(%cache, "cache primed");
        }
        Ok(vars)
    }

    /// Force the next fetch of `cache` to rebuild the server-side set.
    pub fn invalidate(&mut self, cache: CacheId) {
        self.primed.remove(&cache);
    }

    pub fn invalidate_all(&mut self) {
        self.primed.clear();
    }
}
