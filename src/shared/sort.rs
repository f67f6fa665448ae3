//! Multi-key sorting
//!
//! Sorts a slice by an ordered list of `(key, order)` specifiers. The first
//! specifier that distinguishes two items decides their order; items that tie
//! on every key keep their relative order (the sort is stable).

use std::cmp::Ordering;

/// Direction of a single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// A comparable value extracted from an item
///
/// Missing values always sort after present ones, whatever the direction.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    /// Numeric key
    Number(f64),
    /// Textual key
    Text(String),
    /// Key absent (or not a number)
    Missing,
}

impl SortValue {
    /// Build a numeric key, mapping `NaN` to [`SortValue::Missing`]
    #[must_use]
    pub fn number(value: f64) -> Self {
        if value.is_nan() { Self::Missing } else { Self::Number(value) }
    }

    /// Build a key from an optional number
    #[must_use]
    pub fn from_option<N: Into<f64>>(value: Option<N>) -> Self {
        value.map_or(Self::Missing, |v| Self::number(v.into()))
    }

    fn compare(&self, other: &Self, order: SortOrder) -> Ordering {
        let natural = match (self, other) {
            (Self::Missing, Self::Missing) => return Ordering::Equal,
            (Self::Missing, _) => return Ordering::Greater,
            (_, Self::Missing) => return Ordering::Less,
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        };
        match order {
            SortOrder::Asc => natural,
            SortOrder::Desc => natural.reverse(),
        }
    }
}

/// Extracts one sort key from an item
pub type SortKey<T> = fn(&T) -> SortValue;

/// Sort `list` in place by the given specifiers
pub fn sort_by_specifiers<T>(list: &mut [T], specifiers: &[(SortKey<T>, SortOrder)]) {
    list.sort_by(|a, b| {
        for (key, order) in specifiers {
            let ordering = key(a).compare(&key(b), *order);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
