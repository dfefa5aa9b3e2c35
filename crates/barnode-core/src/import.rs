use std::collections::HashSet;

use crate::models::Article;

/// Outcome of planning a text import: names to create, plus what was
/// filtered out along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPlan {
    /// New article names, in first-seen order, keeping the first spelling
    /// of each case-insensitive duplicate.
    pub candidates: Vec<String>,
    /// Lines dropped because an article with that name already exists.
    pub skipped_existing: usize,
    /// Lines dropped as case-insensitive repeats within the pasted text.
    pub skipped_duplicates: usize,
}

/// Plan an import of pasted text: one candidate article name per line.
///
/// Lines are trimmed; blanks are dropped silently. Comparison against both
/// the pasted text and the existing articles is case-insensitive.
pub fn plan_text_import(text: &str, existing: &[Article]) -> ImportPlan {
    let existing_names: HashSet<String> = existing
        .iter()
        .map(|a| a.name.to_lowercase())
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut plan = ImportPlan {
        candidates: Vec::new(),
        skipped_existing: 0,
        skipped_duplicates: 0,
    };

    for line in text.lines() {
        let name = line.trim();
        if name.is_empty() {
            continue;
        }

        let key = name.to_lowercase();
        if !seen.insert(key.clone()) {
            plan.skipped_duplicates += 1;
            continue;
        }
        if existing_names.contains(&key) {
            plan.skipped_existing += 1;
            continue;
        }

        plan.candidates.push(name.to_string());
    }

    tracing::debug!(
        candidates = plan.candidates.len(),
        skipped_existing = plan.skipped_existing,
        skipped_duplicates = plan.skipped_duplicates,
        "planned text import"
    );

    plan
}
