use std::collections::BTreeMap;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{ArgumentValue, FieldSelection, QueryMetadata};

use super::{BuildOptions, variables::infer_variable_type};

/// Serializes a selection tree in a single traversal, collecting variable references and the
/// tree's field count and depth on the way.
pub(super) struct QueryWriter<'a> {
    field_mappings: &'a BTreeMap<String, String>,
    // variable name -> explicitly declared type, in order of first appearance
    variables: IndexMap<String, Option<String>>,
    field_count: usize,
    depth: usize,
}

impl<'a> QueryWriter<'a> {
    pub fn new(field_mappings: &'a BTreeMap<String, String>) -> Self {
        QueryWriter {
            field_mappings,
            variables: IndexMap::new(),
            field_count: 0,
            depth: 0,
        }
    }

    /// Writes the root field with its arguments and sub-selection, required fields included.
    pub fn write_root(
        &mut self,
        out: &mut String,
        root: &str,
        root_arguments: &IndexMap<String, ArgumentValue>,
        fields: &[FieldSelection],
        required_fields: &[String],
    ) {
        out.push_str(root);
        self.write_arguments(out, root_arguments);

        let missing_required = required_fields
            .iter()
            .unique()
            .filter(|required| !fields.iter().any(|field| field.name == **required))
            .collect::<Vec<_>>();

        if fields.is_empty() && missing_required.is_empty() {
            return;
        }

        out.push_str(" {");
        for field in fields {
            out.push(' ');
            self.write_field(out, field, 1);
        }
        for required in missing_required {
            out.push(' ');
            out.push_str(self.upstream_name(required));
        }
        out.push_str(" }");
    }

    fn write_field(&mut self, out: &mut String, field: &FieldSelection, depth: usize) {
        self.field_count += 1;
        self.depth = self.depth.max(depth);

        if let Some(alias) = &field.alias {
            out.push_str(alias);
            out.push_str(": ");
        }
        out.push_str(self.upstream_name(&field.name));

        self.write_arguments(out, &field.arguments);

        if !field.selections.is_empty() {
            out.push_str(" {");
            for child in &field.selections {
                out.push(' ');
                self.write_field(out, child, depth + 1);
            }
            out.push_str(" }");
        }
    }

    fn write_arguments(&mut self, out: &mut String, arguments: &IndexMap<String, ArgumentValue>) {
        if arguments.is_empty() {
            return;
        }

        let variables = &mut self.variables;
        out.push('(');
        for (i, (name, value)) in arguments.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(name);
            out.push_str(": ");
            value.write(out, &mut |variable| {
                variables
                    .entry(variable.name.clone())
                    .or_insert_with(|| variable.ty.clone());
            });
        }
        out.push(')');
    }

    fn upstream_name<'n>(&self, name: &'n str) -> &'n str
    where
        'a: 'n,
    {
        self.field_mappings.get(name).map(String::as_str).unwrap_or(name)
    }

    /// `$name: Type` declarations of every variable met so far, types resolved against the
    /// runtime values of `options`.
    pub fn variable_definitions(&self, options: &BuildOptions) -> Option<String> {
        if self.variables.is_empty() {
            return None;
        }

        let definitions = self
            .variables
            .iter()
            .format_with(", ", |(name, declared), f| {
                let ty = declared
                    .clone()
                    .unwrap_or_else(|| infer_variable_type(name, options.variables.get(name)));
                f(&format_args!("${name}: {ty}"))
            })
            .to_string();

        Some(definitions)
    }

    pub fn metadata(&self) -> QueryMetadata {
        QueryMetadata {
            field_count: self.field_count,
            depth: self.depth,
            has_variables: !self.variables.is_empty(),
        }
    }
}
