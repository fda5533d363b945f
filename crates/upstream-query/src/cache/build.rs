use std::{borrow::Cow, ops::Deref, sync::Arc, time::Instant};

use indexmap::IndexMap;

use super::{Cache, CacheConfig};
use crate::{BuiltQuery, QueryMetadata, Result};

/// The variable-independent part of a [`BuiltQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct CachedQuery {
    pub query: String,
    pub operation_name: String,
    pub metadata: QueryMetadata,
}

impl CachedQuery {
    pub(crate) fn from_built(built: &BuiltQuery) -> Self {
        CachedQuery {
            query: built.query.clone(),
            operation_name: built.operation_name.clone(),
            metadata: built.metadata,
        }
    }

    /// Re-attaches the runtime variables of the current call.
    pub(crate) fn with_variables(&self, variables: IndexMap<String, serde_json::Value>) -> BuiltQuery {
        BuiltQuery {
            query: self.query.clone(),
            operation_name: self.operation_name.clone(),
            variables,
            metadata: self.metadata,
        }
    }
}

/// Built queries keyed by their structural signature. Runtime variables are never stored.
pub struct BuildCache {
    cache: Cache<Arc<CachedQuery>>,
}

impl BuildCache {
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(BuildCache {
            cache: Cache::new(config, signature_key)?,
        })
    }

    pub fn with_clock(self, now: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        BuildCache {
            cache: self.cache.with_clock(now),
        }
    }
}

// Signatures are already canonical.
fn signature_key(signature: &str) -> Cow<'_, str> {
    Cow::Borrowed(signature)
}

impl Default for BuildCache {
    fn default() -> Self {
        BuildCache {
            cache: Cache::with_default_config(signature_key),
        }
    }
}

impl Deref for BuildCache {
    type Target = Cache<Arc<CachedQuery>>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}
