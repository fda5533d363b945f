mod blocked;
mod complexity;
mod transform;

use std::sync::Arc;

use itertools::Itertools;

use crate::{Error, FieldSelection, QueryConfig, Result, config::ensure_positive};

pub use blocked::{INTROSPECTION_FIELDS, get_blocked_fields, is_field_allowed};
pub use complexity::{ComplexityOptions, calculate_complexity};
pub use transform::{limit_depth, sanitize};

use blocked::BlockedFields;

/// Outcome of a validation pass. Errors are accumulated, one per violated rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub(crate) fn from_errors(errors: Vec<String>) -> Self {
        ValidationResult {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(Error::Validation { errors: self.errors })
        }
    }
}

/// Limits for a single validation. Unset values fall back to the validator's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: Option<usize>,
    pub max_fields: Option<usize>,
    /// Replaces the configured blocked fields, introspection rules included, when set.
    pub blocked_fields: Option<Vec<String>>,
}

impl Limits {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_max_fields(mut self, max_fields: usize) -> Self {
        self.max_fields = Some(max_fields);
        self
    }

    pub fn with_blocked_fields<S: Into<String>>(mut self, blocked_fields: impl IntoIterator<Item = S>) -> Self {
        self.blocked_fields = Some(blocked_fields.into_iter().map(Into::into).collect());
        self
    }

    fn check(&self) -> Result<()> {
        if let Some(max_depth) = self.max_depth {
            ensure_positive("max_depth", max_depth as u64)?;
        }
        if let Some(max_fields) = self.max_fields {
            ensure_positive("max_fields", max_fields as u64)?;
        }
        Ok(())
    }

    fn resolve(&self, config: &QueryConfig) -> ResolvedLimits {
        ResolvedLimits {
            max_depth: self.max_depth.unwrap_or(config.max_depth),
            max_fields: self.max_fields.unwrap_or(config.max_fields),
            blocked: match &self.blocked_fields {
                Some(names) => BlockedFields::new(names),
                None => BlockedFields::from_config(config),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct ResolvedLimits {
    max_depth: usize,
    max_fields: usize,
    blocked: BlockedFields,
}

impl ResolvedLimits {
    fn validate(&self, fields: &[FieldSelection]) -> ValidationResult {
        let mut visitor = Visitor {
            blocked: &self.blocked,
            field_count: 0,
            max_depth: 0,
            blocked_matches: Vec::new(),
        };
        visitor.visit_selection_set(fields, 1);

        let mut errors = Vec::new();

        if visitor.max_depth > self.max_depth {
            errors.push(format!(
                "Query depth of {} exceeds the maximum allowed depth of {}",
                visitor.max_depth, self.max_depth
            ));
        }

        if visitor.field_count > self.max_fields {
            errors.push(format!(
                "Query requests {} fields, exceeding the maximum of {}",
                visitor.field_count, self.max_fields
            ));
        }

        if !visitor.blocked_matches.is_empty() {
            errors.push(format!(
                "Query requests blocked fields: {}",
                visitor.blocked_matches.iter().join(", ")
            ));
        }

        if !errors.is_empty() {
            tracing::debug!(
                errors = errors.len(),
                depth = visitor.max_depth,
                fields = visitor.field_count,
                "selection rejected"
            );
        }

        ValidationResult::from_errors(errors)
    }
}

struct Visitor<'a> {
    blocked: &'a BlockedFields,
    field_count: usize,
    max_depth: usize,
    blocked_matches: Vec<&'a str>,
}

impl<'a> Visitor<'a> {
    fn visit_selection_set(&mut self, fields: &'a [FieldSelection], depth: usize) {
        for field in fields {
            self.field_count += 1;
            self.max_depth = self.max_depth.max(depth);

            if self.blocked.matches(&field.name) && !self.blocked_matches.contains(&field.name.as_str()) {
                self.blocked_matches.push(&field.name);
            }

            self.visit_selection_set(&field.selections, depth + 1);
        }
    }
}

/// A pre-configured gate rejecting selection trees that violate its limits.
pub type Middleware = Box<dyn Fn(&[FieldSelection]) -> Result<()> + Send + Sync>;

/// Builds a [`Middleware`] from `limits`, resolved once against `config`.
/// Out-of-range limits are reported here rather than on every call.
pub fn create_middleware(config: &QueryConfig, limits: &Limits) -> Result<Middleware> {
    limits.check()?;
    let limits = limits.resolve(config);

    Ok(Box::new(move |fields: &[FieldSelection]| limits.validate(fields).into_result()))
}

/// Decides whether a selection tree is safe to forward upstream.
#[derive(Debug, Clone, Default)]
pub struct SecurityValidator {
    config: Arc<QueryConfig>,
}

impl SecurityValidator {
    pub fn new(config: Arc<QueryConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// A validator using the merged configuration of the named upstream.
    pub fn for_upstream(&self, name: &str) -> Self {
        Self::new(Arc::new(self.config.for_upstream(name)))
    }

    /// Checks depth, field count and blocked fields in a single traversal. Never fails: every
    /// violation is reported in the result.
    pub fn validate(&self, fields: &[FieldSelection], limits: &Limits) -> ValidationResult {
        limits.resolve(&self.config).validate(fields)
    }

    pub fn assert_valid(&self, fields: &[FieldSelection], limits: &Limits) -> Result<()> {
        self.validate(fields, limits).into_result()
    }

    /// Removes the fields blocked by the configuration, introspection rules included.
    pub fn sanitize(&self, fields: &[FieldSelection]) -> Vec<FieldSelection> {
        transform::sanitize_with(fields, &BlockedFields::from_config(&self.config))
    }

    pub fn limit_depth(&self, fields: &[FieldSelection]) -> Vec<FieldSelection> {
        limit_depth(fields, self.config.max_depth)
    }

    pub fn is_field_allowed(&self, name: &str) -> bool {
        is_field_allowed(name, &self.config)
    }

    pub fn blocked_fields(&self) -> Vec<String> {
        get_blocked_fields(&self.config)
    }

    pub fn calculate_complexity(&self, fields: &[FieldSelection]) -> u64 {
        calculate_complexity(fields, &self.config.complexity)
    }

    /// Computes the complexity score and rejects trees above `max_complexity`.
    pub fn check_complexity(&self, fields: &[FieldSelection]) -> Result<u64> {
        let complexity = self.calculate_complexity(fields);
        let max_complexity = self.config.complexity.max_complexity;

        if complexity > max_complexity {
            return Err(Error::Validation {
                errors: vec![format!(
                    "Query complexity of {complexity} exceeds the maximum allowed complexity of {max_complexity}"
                )],
            });
        }

        Ok(complexity)
    }

    pub fn middleware(&self, limits: &Limits) -> Result<Middleware> {
        create_middleware(&self.config, limits)
    }
}
