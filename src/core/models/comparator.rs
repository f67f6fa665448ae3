//! Comparator registry
//!
//! Maps the validator id written as a rule constraint's key onto the
//! validator that evaluates it and the option that carries its operand.

/// One entry of the comparator registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparator {
    /// Constraint key (e.g. `equals`)
    pub id: &'static str,
    /// Human-readable label
    pub name: &'static str,
    /// Validator that evaluates the constraint
    pub validator: &'static str,
    /// Option of the validator holding the operand
    pub option: &'static str,
    /// Short description for editors
    pub description: &'static str,
}

const fn entry(
    id: &'static str,
    name: &'static str,
    validator: &'static str,
    option: &'static str,
    description: &'static str,
) -> Comparator {
    Comparator {
        id,
        name,
        validator,
        option,
        description,
    }
}

/// All known comparators, in editor display order
pub const COMPARATORS: &[Comparator] = &[
    entry("equals", "= (Equals)", "equals", "value", "The attribute must equal this value."),
    entry("doesNotEqual", "!= (Does not equal)", "doesNotEqual", "value", "The attribute must not equal this value."),
    entry("contains", "Contains", "contains", "value", "The attribute must contain this value."),
    entry("doesNotContain", "Does not contain", "doesNotContain", "value", "The attribute must not contain this value."),
    entry("startsWith", "Starts with", "startsWith", "value", "The attribute must start with this value."),
    entry("endsWith", "Ends with", "endsWith", "value", "The attribute must end with this value."),
    entry("onlyInteger", "Only Integers", "numericality", "onlyInteger", "Real numbers won't be allowed."),
    entry("greaterThan", "> (Greater than)", "numericality", "greaterThan", "The attribute has to be greater than this value."),
    entry(
        "greaterThanOrEqualTo",
        ">= (Greater than or equal to)",
        "numericality",
        "greaterThanOrEqualTo",
        "The attribute has to be at least this value.",
    ),
    entry(
        "lessThanOrEqualTo",
        "<= (Less than or equal to)",
        "numericality",
        "lessThanOrEqualTo",
        "The attribute can be this value at the most.",
    ),
    entry("lessThan", "< (Less than)", "numericality", "lessThan", "The attribute has to be less than this value."),
    entry("odd", "Odd", "numericality", "odd", "The attribute has to be odd."),
    entry("even", "Even", "numericality", "even", "The attribute has to be even."),
];

/// Find a comparator by its constraint key
#[must_use]
pub fn find_comparator(id: &str) -> Option<&'static Comparator> {
    COMPARATORS.iter().find(|c| c.id == id)
}
