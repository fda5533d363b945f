use blake3::Hasher;

use crate::{ArgumentValue, FieldSelection};

use super::{BuildOptions, variables::infer_variable_type};

/// Structural signature of a build: root, selection shape and every option affecting the emitted
/// text. Runtime variable values are left out, only the types inferred from them are hashed.
pub(crate) fn compute(root: &str, fields: &[FieldSelection], options: &BuildOptions) -> String {
    let mut hasher = Hasher::new();

    update_str(&mut hasher, options.operation_type.keyword());
    update_str(&mut hasher, options.operation_name.as_deref().unwrap_or_default());
    hasher.update(&[options.operation_name.is_some() as u8]);
    update_str(&mut hasher, root);
    update_arguments(&mut hasher, options.root_arguments.iter());

    hasher.update(&options.field_mappings.len().to_ne_bytes());
    for (from, to) in &options.field_mappings {
        update_str(&mut hasher, from);
        update_str(&mut hasher, to);
    }

    hasher.update(&options.required_fields.len().to_ne_bytes());
    for required in &options.required_fields {
        update_str(&mut hasher, required);
    }

    let mut variable_types = options
        .variables
        .iter()
        .map(|(name, value)| (name.as_str(), infer_variable_type(name, Some(value))))
        .collect::<Vec<_>>();
    variable_types.sort_unstable();

    hasher.update(&variable_types.len().to_ne_bytes());
    for (name, ty) in &variable_types {
        update_str(&mut hasher, name);
        update_str(&mut hasher, ty);
    }

    update_selection_set(&mut hasher, fields);

    hasher.finalize().to_hex().to_string()
}

fn update_selection_set(hasher: &mut Hasher, fields: &[FieldSelection]) {
    hasher.update(&fields.len().to_ne_bytes());
    for field in fields {
        update_str(hasher, &field.name);
        update_str(hasher, field.alias.as_deref().unwrap_or_default());
        hasher.update(&[field.alias.is_some() as u8]);
        update_arguments(hasher, field.arguments.iter());
        update_selection_set(hasher, &field.selections);
    }
}

fn update_arguments<'a>(hasher: &mut Hasher, arguments: impl ExactSizeIterator<Item = (&'a String, &'a ArgumentValue)>) {
    hasher.update(&arguments.len().to_ne_bytes());
    for (name, value) in arguments {
        let mut rendered = String::new();
        let mut declared_types = Vec::new();
        value.write(&mut rendered, &mut |variable| declared_types.push(variable.ty.clone()));

        update_str(hasher, name);
        update_str(hasher, &rendered);

        // explicit types of every variable in the value, nested ones included
        hasher.update(&declared_types.len().to_ne_bytes());
        for ty in &declared_types {
            update_str(hasher, ty.as_deref().unwrap_or_default());
            hasher.update(&[ty.is_some() as u8]);
        }
    }
}

fn update_str(hasher: &mut Hasher, value: &str) {
    hasher.update(&value.len().to_ne_bytes());
    hasher.update(value.as_bytes());
}
