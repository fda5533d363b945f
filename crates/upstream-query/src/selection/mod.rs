mod paths;
mod value;

use indexmap::IndexMap;

pub use value::{ArgumentValue, VariableRef};

/// A node of the client-requested selection tree.
///
/// `depth` is 1-based and `path` lists the names from the root down to and including this node.
/// Use [`FieldSelection::new`] and [`FieldSelection::with_selections`] to keep both consistent, children
/// are re-rooted under their parent when attached.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelection {
    pub name: String,
    pub alias: Option<String>,
    pub path: Vec<String>,
    pub depth: usize,
    pub arguments: IndexMap<String, ArgumentValue>,
    pub selections: Vec<FieldSelection>,
}

impl FieldSelection {
    /// A root-level field without alias, arguments or sub-selections.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        FieldSelection {
            path: vec![name.clone()],
            name,
            alias: None,
            depth: 1,
            arguments: IndexMap::new(),
            selections: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<ArgumentValue>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Appends children, rewriting their `depth` and `path` so they sit right below this node.
    pub fn with_selections(mut self, selections: impl IntoIterator<Item = FieldSelection>) -> Self {
        for child in selections {
            let child = child.reroot(&self.path, self.depth);
            self.selections.push(child);
        }
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.selections.is_empty()
    }

    /// Key under which the upstream response will hold this field.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn reroot(mut self, parent_path: &[String], parent_depth: usize) -> Self {
        self.depth = parent_depth + 1;
        self.path = parent_path.iter().cloned().chain([self.name.clone()]).collect();

        let children = std::mem::take(&mut self.selections);
        self.selections = children
            .into_iter()
            .map(|child| child.reroot(&self.path, self.depth))
            .collect();

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_are_rerooted_under_their_parent() {
        let tree = FieldSelection::new("profile").with_selections([
            FieldSelection::new("settings").with_selections([FieldSelection::new("theme")]),
            FieldSelection::new("name"),
        ]);

        let settings = &tree.selections[0];
        let theme = &settings.selections[0];

        assert_eq!(tree.depth, 1);
        assert_eq!(settings.depth, 2);
        assert_eq!(settings.path, ["profile", "settings"]);
        assert_eq!(theme.depth, 3);
        assert_eq!(theme.path, ["profile", "settings", "theme"]);
        assert_eq!(tree.selections[1].path, ["profile", "name"]);
    }

    #[test]
    fn response_key_prefers_alias() {
        let field = FieldSelection::new("email").with_alias("contact");

        assert_eq!(field.response_key(), "contact");
        assert_eq!(FieldSelection::new("email").response_key(), "email");
    }
}
