use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{CacheConfig, ComplexityOptions, Error, Result};

/// Immutable snapshot of the limits and rewriting rules used by the validator and the builder.
///
/// Snapshots are never mutated once shared: [`ConfigStore`] swaps whole snapshots, so a build or a
/// validation in flight always sees one consistent configuration.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Deepest allowed nesting of selections, root-level fields are at depth 1.
    pub max_depth: usize,
    /// Maximum number of fields in a selection tree, counted at every depth.
    pub max_fields: usize,
    /// Field names never forwarded upstream, matched case-insensitively.
    pub blocked_fields: Vec<String>,
    /// Field names always added to the top-level selection of a built query.
    pub required_fields: Vec<String>,
    /// Maps the caller's field names to the upstream ones.
    pub field_mappings: BTreeMap<String, String>,
    /// When false, meta-fields starting with `__` are treated as blocked.
    pub allow_introspection: bool,
    pub complexity: ComplexityOptions,
    pub syntax_cache: CacheConfig,
    pub build_cache: CacheConfig,
    /// Per-upstream overrides, keyed by upstream name.
    pub upstreams: BTreeMap<String, UpstreamConfig>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_fields: 100,
            blocked_fields: Vec::new(),
            required_fields: Vec::new(),
            field_mappings: BTreeMap::new(),
            allow_introspection: true,
            complexity: ComplexityOptions::default(),
            syntax_cache: CacheConfig::default(),
            build_cache: CacheConfig::default(),
            upstreams: BTreeMap::new(),
        }
    }
}

/// Overrides applied on top of the global values for a single upstream service.
/// Lists and maps replace the global ones rather than being merged with them.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    pub max_depth: Option<usize>,
    pub max_fields: Option<usize>,
    pub blocked_fields: Option<Vec<String>>,
    pub required_fields: Option<Vec<String>>,
    pub field_mappings: Option<BTreeMap<String, String>>,
    pub allow_introspection: Option<bool>,
}

impl QueryConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: QueryConfig = toml::from_str(input).map_err(|err| Error::configuration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|err| Error::configuration(format!("could not read {}: {err}", path.display())))?;

        tracing::debug!(path = %path.display(), "loading query configuration");

        Self::from_toml_str(&input)
    }

    /// Rejects out-of-range values, naming the offending key.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("max_depth", self.max_depth as u64)?;
        ensure_positive("max_fields", self.max_fields as u64)?;
        self.complexity.validate()?;
        self.syntax_cache.validate("syntax_cache")?;
        self.build_cache.validate("build_cache")?;

        for (name, upstream) in &self.upstreams {
            if let Some(max_depth) = upstream.max_depth {
                ensure_positive(&format!("upstreams.{name}.max_depth"), max_depth as u64)?;
            }
            if let Some(max_fields) = upstream.max_fields {
                ensure_positive(&format!("upstreams.{name}.max_fields"), max_fields as u64)?;
            }
        }

        Ok(())
    }

    /// The snapshot to use for the named upstream. Unknown names yield the global values.
    pub fn for_upstream(&self, name: &str) -> QueryConfig {
        let mut config = QueryConfig {
            upstreams: BTreeMap::new(),
            ..self.clone()
        };

        let Some(upstream) = self.upstreams.get(name) else {
            return config;
        };

        if let Some(max_depth) = upstream.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(max_fields) = upstream.max_fields {
            config.max_fields = max_fields;
        }
        if let Some(blocked_fields) = &upstream.blocked_fields {
            config.blocked_fields = blocked_fields.clone();
        }
        if let Some(required_fields) = &upstream.required_fields {
            config.required_fields = required_fields.clone();
        }
        if let Some(field_mappings) = &upstream.field_mappings {
            config.field_mappings = field_mappings.clone();
        }
        if let Some(allow_introspection) = upstream.allow_introspection {
            config.allow_introspection = allow_introspection;
        }

        config
    }
}

pub(crate) fn ensure_positive(key: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::configuration(format!("`{key}` must be greater than zero")));
    }
    Ok(())
}

/// Process-wide holder of the current [`QueryConfig`] snapshot.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Arc<QueryConfig>>,
}

impl ConfigStore {
    pub fn new(config: QueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(config)),
        })
    }

    pub fn snapshot(&self) -> Arc<QueryConfig> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Validates and installs a new snapshot. Holders of the previous one are unaffected.
    pub fn replace(&self, config: QueryConfig) -> Result<Arc<QueryConfig>> {
        config.validate()?;
        let config = Arc::new(config);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&config);
        tracing::debug!("query configuration replaced");
        Ok(config)
    }

    /// Derives a new snapshot from the current one and installs it.
    pub fn update(&self, f: impl FnOnce(&mut QueryConfig)) -> Result<Arc<QueryConfig>> {
        let mut config = QueryConfig::clone(&self.snapshot());
        f(&mut config);
        self.replace(config)
    }

    pub fn reset(&self) -> Arc<QueryConfig> {
        let config = Arc::new(QueryConfig::default());
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&config);
        config
    }
}
