//! Desired-rule model.
//!
//! # Data Flow
//! ```text
//! RawRow[] (tabular import)
//!     → condition.rs (field/value → Condition, or rejection)
//!     → grouping.rs (GroupKey + MergePolicy → RuleSpec[])
//!     → handed to the synchronizer
//! ```
//!
//! # Design Decisions
//! - One grouping engine; merge behaviour is a policy value, not a code path
//! - Conditions are unique per field inside a rule (cloud rules AND fields)

pub mod condition;
pub mod grouping;
pub mod spec;

pub use condition::{Condition, ConditionField, ConditionNormalizer};
pub use grouping::{GroupingOutcome, MergePolicy, RuleGrouper};
pub use spec::{GroupKey, RuleSpec};
