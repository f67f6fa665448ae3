//! Domain models for hanging protocols
//!
//! Pure data structures with no I/O dependencies.
//!
//! - [`Rule`] - One weighted constraint on a metadata attribute
//! - [`Protocol`] / [`Stage`] / [`Screen`] / [`Viewport`] - The protocol tree
//! - [`StudyMetadata`] and friends - What rules are scored against
//! - [`AttributeCache`] - Custom attributes resolved during matching

mod attributes;
pub mod comparator;
pub mod dictionary;
mod ids;
mod metadata;
mod protocol;
mod rule;
mod screen;
mod stage;
mod study;
pub mod value;
mod viewport;

pub use attributes::AttributeCache;
pub use comparator::{COMPARATORS, Comparator, find_comparator};
pub use ids::generate_id;
pub use metadata::{AttributeMap, Metadata, TagMap};
pub use protocol::{ANY_USER, Protocol};
pub use rule::{ABSTRACT_PRIOR_VALUE, Constraint, Rule, RuleLevel, ValidatorAndValue};
pub use screen::{GRID_LAYOUT, Layout, Screen};
pub use stage::Stage;
pub use study::{InstanceMetadata, PriorStudy, SeriesMetadata, StudyMetadata, StudySummary};
pub use viewport::{ReferencedPrior, Viewport, ViewportSettings};
