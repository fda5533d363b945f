use super::FieldSelection;

impl FieldSelection {
    /// Expands dot-separated paths such as `"profile.settings.theme"` into a selection tree.
    ///
    /// Shared prefixes are merged into a single parent node, nodes keep the order in which they
    /// were first seen and empty segments are ignored.
    pub fn from_paths<I, S>(paths: I) -> Vec<FieldSelection>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roots = Vec::new();

        for path in paths {
            let segments = path
                .as_ref()
                .split('.')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>();

            insert(&mut roots, &segments, &[], 0);
        }

        roots
    }
}

fn insert(level: &mut Vec<FieldSelection>, segments: &[&str], parent_path: &[String], parent_depth: usize) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    let position = match level.iter().position(|field| field.name == *head) {
        Some(position) => position,
        None => {
            let mut field = FieldSelection::new(*head);
            field.depth = parent_depth + 1;
            field.path = parent_path.iter().cloned().chain([head.to_string()]).collect();
            level.push(field);
            level.len() - 1
        }
    };

    let node = &mut level[position];
    insert(&mut node.selections, rest, &node.path, node.depth);
}
