use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Article;

/// The shared shopping note. A single row, seeded from the article list on
/// first access and free-text edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            content: content.into(),
            updated_at: Utc::now(),
        }
    }
}

/// Render the article list as note text: one name per line, blanks skipped.
pub fn note_text(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|a| a.name.trim())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_text_joins_names() {
        let articles = vec![
            Article::new("Aperol"),
            Article::new("Gin Mare"),
            Article::new("Prosecco"),
        ];
        assert_eq!(note_text(&articles), "Aperol\nGin Mare\nProsecco");
    }

    #[test]
    fn test_note_text_skips_blank_names() {
        let articles = vec![
            Article::new("Aperol"),
            Article::new("   "),
            Article::new("Prosecco"),
        ];
        assert_eq!(note_text(&articles), "Aperol\nProsecco");
    }

    #[test]
    fn test_note_text_empty_list() {
        assert_eq!(note_text(&[]), "");
    }
}
