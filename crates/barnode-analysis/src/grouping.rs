use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use barnode_core::Article;

use crate::tokenize::tokenize;

/// A cluster of articles suspected to be the same product.
///
/// Advisory only: a human picks members and confirms before anything is
/// merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// Canonical key: the sorted member ids joined with `+`. A pure function
    /// of membership, so an unchanged cluster keeps its id across
    /// recomputations and callers can track ignored groups between passes.
    pub id: String,
    /// Members, sorted by name ascending.
    pub articles: Vec<Article>,
    /// Up to three of the seed article's keywords. A display hint, not
    /// necessarily shared by every member.
    pub shared_keywords: Vec<String>,
}

/// Partition the article list into ranked candidate duplicate groups.
///
/// Deterministic for a given input list and ordering. Each article with at
/// least one keyword seeds a group of everything that shares a keyword with
/// it: single-hop co-occurrence, not a transitive closure, so two articles
/// with no common keyword only meet in a group seeded by an article that
/// overlaps both. Groups with identical membership collapse to one; the
/// largest clusters sort first.
pub fn group_duplicates(articles: &[Article]) -> Vec<DuplicateGroup> {
    let token_sets: Vec<Vec<String>> = articles.iter().map(|a| tokenize(&a.name)).collect();

    // Inverted index: keyword -> indices of the articles containing it.
    let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, tokens) in token_sets.iter().enumerate() {
        for token in tokens {
            buckets.entry(token.as_str()).or_default().push(idx);
        }
    }

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for (seed, tokens) in token_sets.iter().enumerate() {
        if tokens.is_empty() {
            continue;
        }

        let mut members: HashSet<usize> = HashSet::new();
        for token in tokens {
            if let Some(bucket) = buckets.get(token.as_str()) {
                members.extend(bucket.iter().copied());
            }
        }
        debug_assert!(members.contains(&seed));
        if members.len() < 2 {
            continue;
        }

        let id = group_id(members.iter().map(|&i| articles[i].id));
        if !seen_ids.insert(id.clone()) {
            continue;
        }

        let mut member_articles: Vec<Article> =
            members.into_iter().map(|i| articles[i].clone()).collect();
        member_articles.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });

        groups.push(DuplicateGroup {
            id,
            articles: member_articles,
            shared_keywords: tokens.iter().take(3).cloned().collect(),
        });
    }

    // Largest clusters surface first; the stable sort keeps encounter order
    // on ties.
    groups.sort_by(|a, b| b.articles.len().cmp(&a.articles.len()));
    groups
}

/// Canonical, order-independent group key.
fn group_id(ids: impl Iterator<Item = Uuid>) -> String {
    let mut ids: Vec<String> = ids.map(|id| id.to_string()).collect();
    ids.sort();
    ids.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_article(id: u128, name: &str) -> Article {
        let mut article = Article::new(name);
        article.id = Uuid::from_u128(id);
        article
    }

    #[test]
    fn groups_articles_sharing_a_keyword() {
        let articles = vec![
            build_article(1, "Vodka Smirnoff"),
            build_article(2, "Smirnoff Ice"),
            build_article(3, "Aperol Spritz"),
        ];

        let groups = group_duplicates(&articles);

        assert_eq!(groups.len(), 1);
        let members: Vec<Uuid> = groups[0].articles.iter().map(|a| a.id).collect();
        assert!(members.contains(&Uuid::from_u128(1)));
        assert!(members.contains(&Uuid::from_u128(2)));
        assert!(!members.contains(&Uuid::from_u128(3)));
        assert_eq!(groups[0].shared_keywords, vec!["smirnoff"]);
    }

    #[test]
    fn members_are_sorted_by_name() {
        let articles = vec![
            build_article(1, "smirnoff vodka"),
            build_article(2, "Ice Smirnoff"),
        ];

        let groups = group_duplicates(&articles);
        let names: Vec<&str> = groups[0].articles.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Ice Smirnoff", "smirnoff vodka"]);
    }

    #[test]
    fn singleton_connected_sets_are_discarded() {
        let articles = vec![
            build_article(1, "Aperol Spritz"),
            build_article(2, "Montenegro"),
        ];
        assert!(group_duplicates(&articles).is_empty());
    }

    #[test]
    fn names_without_tokens_contribute_nothing() {
        let articles = vec![
            build_article(1, "Vodka 40 ml"),
            build_article(2, "Vodka 70 cl"),
            build_article(3, "Vodka Smirnoff"),
        ];
        // Articles 1 and 2 tokenize to nothing; "smirnoff" finds no partner.
        assert!(group_duplicates(&articles).is_empty());
    }

    #[test]
    fn identical_connected_sets_collapse_to_one_group() {
        let articles = vec![
            build_article(1, "Vodka Smirnoff"),
            build_article(2, "Smirnoff vodka"),
        ];

        let groups = group_duplicates(&articles);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].articles.len(), 2);
    }

    #[test]
    fn grouping_is_single_hop_not_transitive() {
        // 1–2 share "montenegro", 2–3 share "nardini", 1–3 share nothing.
        let articles = vec![
            build_article(1, "Montenegro Rosso"),
            build_article(2, "Montenegro Nardini"),
            build_article(3, "Nardini Grappa"),
        ];

        let groups = group_duplicates(&articles);

        // Three distinct neighborhoods, the full one (seeded by 2) first.
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].articles.len(), 3);

        let pair_groups: Vec<&DuplicateGroup> =
            groups.iter().filter(|g| g.articles.len() == 2).collect();
        assert_eq!(pair_groups.len(), 2);
        for group in pair_groups {
            let ids: Vec<Uuid> = group.articles.iter().map(|a| a.id).collect();
            // No pair group joins 1 and 3 directly.
            assert!(!(ids.contains(&Uuid::from_u128(1)) && ids.contains(&Uuid::from_u128(3))));
        }
    }

    #[test]
    fn larger_groups_rank_first() {
        let articles = vec![
            build_article(1, "Aperol Spritz"),
            build_article(2, "Spritz Campari"),
            build_article(3, "Smirnoff Red"),
            build_article(4, "Smirnoff Blue"),
            build_article(5, "Smirnoff Ice"),
        ];

        let groups = group_duplicates(&articles);
        assert!(groups[0].articles.len() >= groups[groups.len() - 1].articles.len());
        assert_eq!(groups[0].articles.len(), 3);
    }

    #[test]
    fn group_id_is_stable_across_runs_and_input_order() {
        let articles = vec![
            build_article(1, "Vodka Smirnoff"),
            build_article(2, "Smirnoff Ice"),
            build_article(3, "Aperol Spritz"),
        ];

        let first = group_duplicates(&articles);
        let second = group_duplicates(&articles);
        assert_eq!(first, second);

        // Same membership, different input order: same canonical id.
        let reordered = vec![
            articles[2].clone(),
            articles[1].clone(),
            articles[0].clone(),
        ];
        let third = group_duplicates(&reordered);
        assert_eq!(first[0].id, third[0].id);
    }

    #[test]
    fn shared_keywords_cap_at_three() {
        let articles = vec![
            build_article(1, "Sciroppo Zucchero Canna Biologico Premium"),
            build_article(2, "Sciroppo Semplice"),
        ];

        let groups = group_duplicates(&articles);
        assert_eq!(
            groups[0].shared_keywords,
            vec!["sciroppo", "zucchero", "canna"]
        );
    }
}
