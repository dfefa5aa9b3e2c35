use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Article;

/// An entry on the "missing" list, pointing at an [`Article`].
///
/// `article_name` is a denormalized copy of the referenced article's current
/// name. Every operation that renames an article, consolidation included,
/// must rewrite it, so the list never shows a stale spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingItem {
    pub id: Uuid,
    pub article_id: Uuid,
    pub article_name: String,
    pub created_at: DateTime<Utc>,
}

impl MissingItem {
    pub fn for_article(article: &Article) -> Self {
        Self {
            id: Uuid::now_v7(),
            article_id: article.id,
            article_name: article.name.clone(),
            created_at: Utc::now(),
        }
    }
}
