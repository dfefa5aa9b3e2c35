use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked product in the bar inventory.
///
/// Names are free text entered by staff, so near-duplicate spellings
/// accumulate over time; the analysis engine exists to merge them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_new() {
        let article = Article::new("Gin Mare");
        assert_eq!(article.name, "Gin Mare");
        assert!(!article.id.is_nil());
    }

    #[test]
    fn test_article_json_roundtrip() {
        let article = Article::new("Vodka Smirnoff");

        let json = serde_json::to_string(&article).unwrap();
        let restored: Article = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, article);
    }
}
