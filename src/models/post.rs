use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published article in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Unique identifier for the post
    pub id: Uuid,
    /// Post title, used together with the body for lexical similarity
    pub title: String,
    /// Post body text
    pub body: String,
    /// Category labels, stored normalized (trimmed + lower-cased)
    pub categories: Vec<String>,
    /// Owning user; immutable after creation
    pub author_id: Uuid,
    /// Users with an active like edge to this post; mirrors the like-graph
    pub liked_by: HashSet<Uuid>,
    /// Creation time, used as the recency tie-break in rankings
    pub created_at: DateTime<Utc>,
}

/// Normalizes a category label for storage and comparison.
///
/// Labels are matched case-insensitively ("Technology" and "technology"
/// are the same category), so every label is trimmed and lower-cased
/// before it enters the catalog.
pub fn normalize_category(label: &str) -> String {
    label.trim().to_lowercase()
}

impl Post {
    /// Creates a new post with normalized categories
    pub fn new(title: String, body: String, categories: Vec<String>, author_id: Uuid) -> Self {
        let mut seen = HashSet::new();
        let categories = categories
            .iter()
            .map(|c| normalize_category(c))
            .filter(|c| !c.is_empty() && seen.insert(c.clone()))
            .collect();

        Self {
            id: Uuid::new_v4(),
            title,
            body,
            categories,
            author_id,
            liked_by: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Number of active likes on this post
    pub fn like_count(&self) -> usize {
        self.liked_by.len()
    }

    /// Combined title + body, the document used for text similarity
    pub fn document(&self) -> String {
        format!("{} {}", self.title, self.body)
    }

    /// Whether the post carries the given normalized category label
    pub fn has_category(&self, normalized: &str) -> bool {
        self.categories.iter().any(|c| c == normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_normalizes_categories() {
        let author = Uuid::new_v4();
        let post = Post::new(
            "Hello".to_string(),
            "World".to_string(),
            vec![
                "Technology".to_string(),
                "  technology ".to_string(),
                "Travel".to_string(),
            ],
            author,
        );

        // Duplicate after normalization collapses to one label
        assert_eq!(post.categories, vec!["technology", "travel"]);
        assert!(post.has_category("technology"));
        assert!(!post.has_category("Technology"));
    }

    #[test]
    fn test_new_post_drops_blank_categories() {
        let post = Post::new(
            "Hello".to_string(),
            "World".to_string(),
            vec!["  ".to_string(), "food".to_string()],
            Uuid::new_v4(),
        );
        assert_eq!(post.categories, vec!["food"]);
    }

    #[test]
    fn test_document_combines_title_and_body() {
        let post = Post::new(
            "cats and dogs".to_string(),
            "a story about pets".to_string(),
            vec![],
            Uuid::new_v4(),
        );
        assert_eq!(post.document(), "cats and dogs a story about pets");
    }

    #[test]
    fn test_like_count_tracks_liked_by() {
        let mut post = Post::new("t".to_string(), "b".to_string(), vec![], Uuid::new_v4());
        assert_eq!(post.like_count(), 0);
        post.liked_by.insert(Uuid::new_v4());
        assert_eq!(post.like_count(), 1);
    }
}
