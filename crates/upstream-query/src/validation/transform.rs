use crate::FieldSelection;

use super::blocked::BlockedFields;

/// Removes every field whose name is blocked, at any depth. The input is left untouched.
pub fn sanitize<S: AsRef<str>>(fields: &[FieldSelection], blocked_fields: &[S]) -> Vec<FieldSelection> {
    sanitize_with(fields, &BlockedFields::new(blocked_fields))
}

pub(crate) fn sanitize_with(fields: &[FieldSelection], blocked: &BlockedFields) -> Vec<FieldSelection> {
    fields
        .iter()
        .filter(|field| !blocked.matches(&field.name))
        .map(|field| {
            // children first, the parent is assembled from the already filtered subtree
            let selections = sanitize_with(&field.selections, blocked);
            copy_with_selections(field, selections)
        })
        .collect()
}

/// Drops every selection nested deeper than `max_depth`. Root-level fields are at depth 1, so a
/// limit of 0 yields an empty tree.
pub fn limit_depth(fields: &[FieldSelection], max_depth: usize) -> Vec<FieldSelection> {
    truncate(fields, 1, max_depth)
}

fn truncate(fields: &[FieldSelection], level: usize, max_depth: usize) -> Vec<FieldSelection> {
    if level > max_depth {
        return Vec::new();
    }

    fields
        .iter()
        .map(|field| {
            let selections = truncate(&field.selections, level + 1, max_depth);
            copy_with_selections(field, selections)
        })
        .collect()
}

fn copy_with_selections(field: &FieldSelection, selections: Vec<FieldSelection>) -> FieldSelection {
    FieldSelection {
        name: field.name.clone(),
        alias: field.alias.clone(),
        path: field.path.clone(),
        depth: field.depth,
        arguments: field.arguments.clone(),
        selections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<FieldSelection> {
        vec![
            FieldSelection::new("id"),
            FieldSelection::new("Password"),
            FieldSelection::new("profile").with_selections([
                FieldSelection::new("secret"),
                FieldSelection::new("settings").with_selections([FieldSelection::new("theme")]),
            ]),
        ]
    }

    fn names(fields: &[FieldSelection]) -> Vec<String> {
        fields
            .iter()
            .flat_map(|field| std::iter::once(field.path.join(".")).chain(names(&field.selections)))
            .collect()
    }

    #[test]
    fn sanitize_removes_blocked_fields_at_every_depth() {
        let input = tree();

        let sanitized = sanitize(&input, &["password", "SECRET"]);

        assert_eq!(
            names(&sanitized),
            ["id", "profile", "profile.settings", "profile.settings.theme"]
        );
        assert_eq!(input, tree());
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = sanitize(&tree(), &["secret"]);
        let twice = sanitize(&once, &["secret"]);

        assert_eq!(once, twice);
    }

    #[test]
    fn limit_depth_keeps_everything_up_to_the_limit() {
        assert_eq!(
            names(&limit_depth(&tree(), 2)),
            ["id", "Password", "profile", "profile.secret", "profile.settings"]
        );
        assert_eq!(names(&limit_depth(&tree(), 1)), ["id", "Password", "profile"]);
        assert!(limit_depth(&tree(), 0).is_empty());
        assert_eq!(limit_depth(&tree(), 3), tree());
    }
}
