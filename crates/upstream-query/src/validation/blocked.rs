use std::collections::HashSet;

use crate::QueryConfig;

/// Introspection meta-fields reported by [`get_blocked_fields`] when introspection is disallowed.
/// Any other name starting with `__` is rejected as well.
pub const INTROSPECTION_FIELDS: [&str; 3] = ["__schema", "__type", "__typename"];

/// Case-insensitive set of field names that must never reach an upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BlockedFields {
    names: HashSet<String>,
    introspection: bool,
}

impl BlockedFields {
    pub(crate) fn new<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        BlockedFields {
            names: names.into_iter().map(|name| name.as_ref().to_lowercase()).collect(),
            introspection: false,
        }
    }

    pub(crate) fn from_config(config: &QueryConfig) -> Self {
        BlockedFields {
            introspection: !config.allow_introspection,
            ..Self::new(&config.blocked_fields)
        }
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        (self.introspection && name.starts_with("__")) || self.names.contains(&name.to_lowercase())
    }
}

pub fn is_field_allowed(name: &str, config: &QueryConfig) -> bool {
    !BlockedFields::from_config(config).matches(name)
}

/// Every name blocked by `config`: the explicit list followed by the introspection meta-fields when
/// introspection is disallowed.
pub fn get_blocked_fields(config: &QueryConfig) -> Vec<String> {
    let mut blocked = config.blocked_fields.clone();

    if !config.allow_introspection {
        for name in INTROSPECTION_FIELDS {
            if !blocked.iter().any(|blocked| blocked.eq_ignore_ascii_case(name)) {
                blocked.push(name.to_string());
            }
        }
    }

    blocked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(blocked: &[&str], allow_introspection: bool) -> QueryConfig {
        QueryConfig {
            blocked_fields: blocked.iter().map(ToString::to_string).collect(),
            allow_introspection,
            ..Default::default()
        }
    }

    #[test]
    fn blocked_names_are_case_insensitive() {
        let config = config(&["Password"], true);

        assert!(!is_field_allowed("password", &config));
        assert!(!is_field_allowed("PASSWORD", &config));
        assert!(is_field_allowed("email", &config));
    }

    #[test]
    fn introspection_follows_the_flag() {
        assert!(is_field_allowed("__schema", &config(&[], true)));
        assert!(!is_field_allowed("__schema", &config(&[], false)));
        assert!(!is_field_allowed("__whatever", &config(&[], false)));
    }

    #[test]
    fn blocked_list_includes_introspection_when_disallowed() {
        assert_eq!(get_blocked_fields(&config(&["ssn"], true)), ["ssn"]);
        assert_eq!(
            get_blocked_fields(&config(&["ssn", "__TYPE"], false)),
            ["ssn", "__TYPE", "__schema", "__typename"]
        );
    }
}
