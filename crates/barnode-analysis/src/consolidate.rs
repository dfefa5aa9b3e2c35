use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use barnode_core::Database;

use crate::error::InvalidSelection;
use crate::grouping::DuplicateGroup;
use crate::normalize::normalize_name;

/// The exact set of mutations that merges a duplicate group into one record.
///
/// Ephemeral: computed on demand from a user's selection and consumed
/// immediately by [`apply_plan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidationPlan {
    pub master_id: Uuid,
    /// Normalized name the surviving article will carry.
    pub final_name: String,
    /// Selected members other than the master, sorted for deterministic
    /// application.
    pub delete_ids: Vec<Uuid>,
    /// Old article id → master id, one entry per deleted article.
    pub reassignments: HashMap<Uuid, Uuid>,
}

/// Compute the mutation plan for merging `selected_ids` of `group` into the
/// article `master_id`, renamed to `final_name`.
///
/// The selection must be a non-empty subset of the group's members and must
/// contain the master; the final name must survive normalization. Nothing is
/// validated against storage; the plan is pure data.
pub fn plan_consolidation(
    group: &DuplicateGroup,
    selected_ids: &[Uuid],
    final_name: &str,
    master_id: Uuid,
) -> Result<ConsolidationPlan, InvalidSelection> {
    if selected_ids.is_empty() {
        return Err(InvalidSelection::EmptySelection);
    }
    if !selected_ids.contains(&master_id) {
        return Err(InvalidSelection::MasterNotSelected(master_id));
    }
    for id in selected_ids {
        if !group.articles.iter().any(|a| a.id == *id) {
            return Err(InvalidSelection::NotInGroup(*id));
        }
    }

    let final_name = normalize_name(final_name);
    if final_name.is_empty() {
        return Err(InvalidSelection::EmptyFinalName);
    }

    let mut delete_ids: Vec<Uuid> = selected_ids
        .iter()
        .copied()
        .filter(|id| *id != master_id)
        .collect();
    delete_ids.sort();
    delete_ids.dedup();

    let reassignments: HashMap<Uuid, Uuid> =
        delete_ids.iter().map(|id| (*id, master_id)).collect();

    Ok(ConsolidationPlan {
        master_id,
        final_name,
        delete_ids,
        reassignments,
    })
}

/// Execute a plan against storage.
///
/// The order is load-bearing: missing-item references are repointed first,
/// then the master is renamed, then the losers are deleted, so a partial
/// failure never leaves a reference pointing at a deleted article or
/// showing a stale name. A half-applied plan must not be replayed; retries
/// re-derive the plan from a fresh grouping pass.
pub fn apply_plan(plan: &ConsolidationPlan, db: &Database) -> barnode_core::Result<()> {
    for (old_id, master_id) in &plan.reassignments {
        db.reassign_missing_items(old_id, master_id, &plan.final_name)?;
    }

    db.rename_article(&plan.master_id, &plan.final_name)?;

    for id in &plan.delete_ids {
        db.delete_article(id)?;
    }

    tracing::info!(
        master = %plan.master_id,
        merged = plan.delete_ids.len(),
        final_name = %plan.final_name,
        "applied consolidation plan"
    );
    Ok(())
}
