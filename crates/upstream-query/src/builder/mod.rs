mod signature;
mod variables;
mod writer;

use std::{collections::BTreeMap, sync::Arc};

use indexmap::IndexMap;
use serde_json::Value;

use crate::{ArgumentValue, BuildCache, CachedQuery, FieldSelection, QueryConfig};

use writer::QueryWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationType {
    #[default]
    Query,
    Mutation,
}

impl OperationType {
    pub fn keyword(self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
        }
    }

    fn default_name_suffix(self) -> &'static str {
        match self {
            OperationType::Query => "Query",
            OperationType::Mutation => "Mutation",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Per-call options of a build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub operation_type: OperationType,
    /// Defaults to the root field name in PascalCase followed by `Query` or `Mutation`.
    pub operation_name: Option<String>,
    pub root_arguments: IndexMap<String, ArgumentValue>,
    /// Runtime values, bound to the built query but never part of its text.
    pub variables: IndexMap<String, Value>,
    pub field_mappings: BTreeMap<String, String>,
    pub required_fields: Vec<String>,
}

impl BuildOptions {
    pub fn mutation(mut self) -> Self {
        self.operation_type = OperationType::Mutation;
        self
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn with_root_argument(mut self, name: impl Into<String>, value: impl Into<ArgumentValue>) -> Self {
        self.root_arguments.insert(name.into(), value.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_field_mapping(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.field_mappings.insert(from.into(), to.into());
        self
    }

    pub fn with_required_field(mut self, name: impl Into<String>) -> Self {
        self.required_fields.push(name.into());
        self
    }
}

/// An operation ready to be sent upstream as-is.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltQuery {
    pub query: String,
    pub operation_name: String,
    pub variables: IndexMap<String, Value>,
    pub metadata: QueryMetadata,
}

/// Shape of the serialized selection tree. The root field and appended required fields are not
/// counted, so the values match what the validator computes for the same tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    pub field_count: usize,
    pub depth: usize,
    pub has_variables: bool,
}

pub fn build_query(root: &str, fields: &[FieldSelection], options: &BuildOptions) -> BuiltQuery {
    let mut writer = QueryWriter::new(&options.field_mappings);

    let mut body = String::with_capacity(64);
    writer.write_root(&mut body, root, &options.root_arguments, fields, &options.required_fields);

    let operation_name = match &options.operation_name {
        Some(name) => name.clone(),
        None => default_operation_name(root, options.operation_type),
    };

    let mut query = String::with_capacity(body.len() + operation_name.len() + 16);
    query.push_str(options.operation_type.keyword());
    query.push(' ');
    query.push_str(&operation_name);
    if let Some(definitions) = writer.variable_definitions(options) {
        query.push('(');
        query.push_str(&definitions);
        query.push(')');
    }
    query.push_str(" { ");
    query.push_str(&body);
    query.push_str(" }");

    let metadata = writer.metadata();

    tracing::trace!(
        operation_name = %operation_name,
        field_count = metadata.field_count,
        depth = metadata.depth,
        "built upstream operation"
    );

    BuiltQuery {
        query,
        operation_name,
        variables: options.variables.clone(),
        metadata,
    }
}

/// Expands dot-separated paths such as `profile.settings.theme` before building.
pub fn build_query_from_paths<I, S>(root: &str, paths: I, options: &BuildOptions) -> BuiltQuery
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    build_query(root, &FieldSelection::from_paths(paths), options)
}

/// Builds a mutation taking a single `input` argument and selecting `returning` on the result.
/// Other root arguments of `options` are kept after `input`.
pub fn build_mutation(
    root: &str,
    input: IndexMap<String, ArgumentValue>,
    returning: &[FieldSelection],
    options: &BuildOptions,
) -> BuiltQuery {
    let root_arguments = [("input".to_string(), ArgumentValue::Object(input))]
        .into_iter()
        .chain(
            options
                .root_arguments
                .iter()
                .filter(|(name, _)| name.as_str() != "input")
                .map(|(name, value)| (name.clone(), value.clone())),
        )
        .collect();

    let options = BuildOptions {
        operation_type: OperationType::Mutation,
        root_arguments,
        ..options.clone()
    };

    build_query(root, returning, &options)
}

/// Same as [`build_query`], reusing the text of a previous build with the same shape. The returned
/// query always carries the variables of this call.
pub fn build_cached(cache: &BuildCache, root: &str, fields: &[FieldSelection], options: &BuildOptions) -> BuiltQuery {
    let key = signature::compute(root, fields, options);

    if let Some(cached) = cache.get(&key) {
        return cached.with_variables(options.variables.clone());
    }

    let built = build_query(root, fields, options);
    cache.set(&key, Arc::new(CachedQuery::from_built(&built)));

    built
}

fn default_operation_name(root: &str, operation_type: OperationType) -> String {
    let mut name = String::with_capacity(root.len() + 8);

    for segment in root.split(['_', '-']).filter(|segment| !segment.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }

    name.push_str(operation_type.default_name_suffix());
    name
}

/// Builds operations against one configuration snapshot, applying its field mappings and required
/// fields on top of the per-call options.
#[derive(Clone, Default)]
pub struct QueryBuilder {
    config: Arc<QueryConfig>,
    cache: Option<Arc<BuildCache>>,
}

impl QueryBuilder {
    pub fn new(config: Arc<QueryConfig>) -> Self {
        QueryBuilder { config, cache: None }
    }

    pub fn with_cache(mut self, cache: Arc<BuildCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// A builder using the merged snapshot of the named upstream, sharing the same cache.
    pub fn for_upstream(&self, name: &str) -> Self {
        QueryBuilder {
            config: Arc::new(self.config.for_upstream(name)),
            cache: self.cache.clone(),
        }
    }

    pub fn build(&self, root: &str, fields: &[FieldSelection], options: &BuildOptions) -> BuiltQuery {
        build_query(root, fields, &self.effective_options(options))
    }

    pub fn build_from_paths<I, S>(&self, root: &str, paths: I, options: &BuildOptions) -> BuiltQuery
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.build(root, &FieldSelection::from_paths(paths), options)
    }

    pub fn build_mutation(
        &self,
        root: &str,
        input: IndexMap<String, ArgumentValue>,
        returning: &[FieldSelection],
        options: &BuildOptions,
    ) -> BuiltQuery {
        build_mutation(root, input, returning, &self.effective_options(options))
    }

    /// Goes through the build cache when one is attached, builds directly otherwise.
    pub fn build_cached(&self, root: &str, fields: &[FieldSelection], options: &BuildOptions) -> BuiltQuery {
        let options = self.effective_options(options);

        match &self.cache {
            Some(cache) => build_cached(cache, root, fields, &options),
            None => build_query(root, fields, &options),
        }
    }

    fn effective_options(&self, options: &BuildOptions) -> BuildOptions {
        let mut field_mappings = self.config.field_mappings.clone();
        field_mappings.extend(options.field_mappings.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut required_fields = self.config.required_fields.clone();
        for required in &options.required_fields {
            if !required_fields.contains(required) {
                required_fields.push(required.clone());
            }
        }

        BuildOptions {
            field_mappings,
            required_fields,
            ..options.clone()
        }
    }
}
