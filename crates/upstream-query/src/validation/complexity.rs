use crate::{FieldSelection, Result, config::ensure_positive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComplexityOptions {
    /// Cost of a single field.
    pub field_cost: u64,
    /// Factor applied to the cost of a sub-selection, which may expand into a list.
    pub list_multiplier: u64,
    /// Highest accepted score.
    pub max_complexity: u64,
}

impl Default for ComplexityOptions {
    fn default() -> Self {
        Self {
            field_cost: 1,
            list_multiplier: 10,
            max_complexity: 1000,
        }
    }
}

impl ComplexityOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        ensure_positive("complexity.field_cost", self.field_cost)?;
        ensure_positive("complexity.list_multiplier", self.list_multiplier)?;
        ensure_positive("complexity.max_complexity", self.max_complexity)
    }
}

/// Estimated cost of a selection tree.
///
/// Every field costs `field_cost`. A field with a sub-selection is treated as a potential list and
/// adds its children's cost multiplied by `list_multiplier`, so nested fan-out weighs far more than
/// the same number of flat fields. Saturates instead of overflowing.
pub fn calculate_complexity(fields: &[FieldSelection], options: &ComplexityOptions) -> u64 {
    fields
        .iter()
        .fold(0u64, |total, field| total.saturating_add(field_complexity(field, options)))
}

fn field_complexity(field: &FieldSelection, options: &ComplexityOptions) -> u64 {
    if field.selections.is_empty() {
        return options.field_cost;
    }

    let children = calculate_complexity(&field.selections, options);
    options
        .field_cost
        .saturating_add(children.saturating_mul(options.list_multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(field_cost: u64, list_multiplier: u64) -> ComplexityOptions {
        ComplexityOptions {
            field_cost,
            list_multiplier,
            ..Default::default()
        }
    }

    #[test]
    fn single_leaf_costs_one_field() {
        let fields = [FieldSelection::new("id")];

        assert_eq!(calculate_complexity(&fields, &options(1, 10)), 1);
    }

    #[test]
    fn nested_selection_is_multiplied() {
        let fields = [FieldSelection::new("posts").with_selections([FieldSelection::new("id")])];

        assert_eq!(calculate_complexity(&fields, &options(1, 10)), 11);
    }

    #[test]
    fn nested_lists_compound() {
        let fields = [FieldSelection::new("users").with_selections([
            FieldSelection::new("id"),
            FieldSelection::new("posts").with_selections([FieldSelection::new("title")]),
        ])];

        // users: 1 + 10 * (id: 1 + posts: 1 + 10 * 1)
        assert_eq!(calculate_complexity(&fields, &options(1, 10)), 121);
    }

    #[test]
    fn flat_selection_is_cheaper_than_nested_one() {
        let flat = [FieldSelection::new("a"), FieldSelection::new("b")];
        let nested = [FieldSelection::new("a").with_selections([FieldSelection::new("b")])];

        assert!(calculate_complexity(&flat, &options(1, 10)) < calculate_complexity(&nested, &options(1, 10)));
    }

    #[test]
    fn adding_fields_never_decreases_the_score() {
        let mut fields = vec![FieldSelection::new("a")];
        let mut previous = calculate_complexity(&fields, &options(3, 7));

        for name in ["b", "c"] {
            fields.push(FieldSelection::new(name));
            let score = calculate_complexity(&fields, &options(3, 7));
            assert!(score >= previous);
            previous = score;
        }

        let deeper = vec![fields[0].clone().with_selections([FieldSelection::new("child")])];
        assert!(calculate_complexity(&deeper, &options(3, 7)) >= calculate_complexity(&fields[..1], &options(3, 7)));
    }

    #[test]
    fn saturates_on_overflow() {
        let mut field = FieldSelection::new("leaf");
        for _ in 0..40 {
            field = FieldSelection::new("list").with_selections([field]);
        }

        assert_eq!(calculate_complexity(&[field], &options(1, 1000)), u64::MAX);
    }

    #[test]
    fn empty_tree_is_free() {
        assert_eq!(calculate_complexity(&[], &ComplexityOptions::default()), 0);
    }
}
