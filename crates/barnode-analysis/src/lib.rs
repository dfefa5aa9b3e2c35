//! BARnode analysis — duplicate-article grouping and consolidation.
//!
//! A pure, synchronous engine over an in-memory snapshot of articles:
//! normalize names, tokenize them into keywords, cluster articles that share
//! keywords, and plan the merge a user confirms. Nothing here touches
//! storage except [`consolidate::apply_plan`], which executes a finished
//! plan in an order that never strands a missing-item reference.

pub mod consolidate;
pub mod error;
pub mod grouping;
pub mod normalize;
pub mod similarity;
pub mod tokenize;

pub use consolidate::{ConsolidationPlan, apply_plan, plan_consolidation};
pub use error::InvalidSelection;
pub use grouping::{DuplicateGroup, group_duplicates};
pub use normalize::normalize_name;
pub use similarity::{edit_distance, is_fuzzy_similar};
pub use tokenize::tokenize;
