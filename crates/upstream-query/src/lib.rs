//! Builds the GraphQL operations sent to upstream services from client field selections.
//!
//! A [`FieldSelection`] tree is checked by the [`SecurityValidator`] against depth, field count,
//! blocked fields and complexity limits, then serialized by [`build_query`] or a [`QueryBuilder`]
//! into a [`BuiltQuery`]. Parsed documents and built operation texts can be kept in the bounded
//! [`SyntaxCache`] and [`BuildCache`].

mod builder;
mod cache;
mod config;
mod error;
mod selection;
mod validation;

pub use builder::{
    BuildOptions, BuiltQuery, OperationType, QueryBuilder, QueryMetadata, build_cached, build_mutation, build_query,
    build_query_from_paths,
};
pub use cache::{BuildCache, Cache, CacheConfig, CacheStats, CachedQuery, SyntaxCache, normalize_query};
pub use config::{ConfigStore, QueryConfig, UpstreamConfig};
pub use error::{Error, Result};
pub use selection::{ArgumentValue, FieldSelection, VariableRef};
pub use validation::{
    ComplexityOptions, INTROSPECTION_FIELDS, Limits, Middleware, SecurityValidator, ValidationResult,
    calculate_complexity, create_middleware, get_blocked_fields, is_field_allowed, limit_depth, sanitize,
};
