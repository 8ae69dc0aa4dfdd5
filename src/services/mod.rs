use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod category_affinity;
pub mod collaborative;
pub mod snapshot;
pub mod text_similarity;

pub use snapshot::Snapshot;

/// Error types for the recommendation core
///
/// Empty output is never an error; every strategy returns an empty
/// ranking when there is nothing to recommend. Computations are
/// deterministic over a fixed snapshot, so nothing here is retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error("Query must not be empty")]
    InvalidQuery,
    #[error("Unknown user: {0}")]
    UnknownUser(Uuid),
    #[error("Unknown post: {0}")]
    UnknownPost(Uuid),
}

/// A post id paired with its relevance score
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScoredPost {
    pub post_id: Uuid,
    pub score: f64,
}

/// Strategy selector passed to the common `Recommender` interface
#[derive(Debug, Clone, Default)]
pub struct RecommendContext {
    /// Querying user, required by the user-centric strategies
    pub user_id: Option<Uuid>,
    /// Free-text query, required by the content strategy
    pub query: Option<String>,
}

impl RecommendContext {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            query: None,
        }
    }

    pub fn for_query(query: impl Into<String>) -> Self {
        Self {
            user_id: None,
            query: Some(query.into()),
        }
    }
}

/// Common capability interface over the three strategies
///
/// Each strategy is a pure function over a snapshot; this trait lets
/// callers compose or swap them without coupling to any one module.
#[cfg_attr(test, mockall::automock)]
pub trait Recommender: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Ranked post ids for the given context
    fn recommend(
        &self,
        snapshot: &Snapshot,
        ctx: &RecommendContext,
    ) -> Result<Vec<Uuid>, RecommendError>;
}

/// Content Similarity Scorer behind the common interface
pub struct ContentSimilarity;

impl Recommender for ContentSimilarity {
    fn name(&self) -> &'static str {
        "content-similarity"
    }

    fn recommend(
        &self,
        snapshot: &Snapshot,
        ctx: &RecommendContext,
    ) -> Result<Vec<Uuid>, RecommendError> {
        let query = ctx.query.as_deref().ok_or(RecommendError::InvalidQuery)?;
        let ranked = text_similarity::score_by_text(query, snapshot)?;
        Ok(ranked.into_iter().map(|s| s.post_id).collect())
    }
}

/// Category Affinity Recommender behind the common interface
pub struct CategoryAffinity;

impl Recommender for CategoryAffinity {
    fn name(&self) -> &'static str {
        "category-affinity"
    }

    fn recommend(
        &self,
        snapshot: &Snapshot,
        ctx: &RecommendContext,
    ) -> Result<Vec<Uuid>, RecommendError> {
        let user_id = ctx.user_id.ok_or(RecommendError::InvalidQuery)?;
        category_affinity::recommend_by_category(user_id, snapshot)
    }
}

/// Collaborative Filter behind the common interface
pub struct Collaborative;

impl Recommender for Collaborative {
    fn name(&self) -> &'static str {
        "collaborative"
    }

    fn recommend(
        &self,
        snapshot: &Snapshot,
        ctx: &RecommendContext,
    ) -> Result<Vec<Uuid>, RecommendError> {
        let user_id = ctx.user_id.ok_or(RecommendError::InvalidQuery)?;
        let ranked = collaborative::recommend_collaborative(user_id, snapshot)?;
        Ok(ranked.into_iter().map(|s| s.post_id).collect())
    }
}

/// Orders scored candidates by score descending, then recency, then id
///
/// The post id is the final tie-break so equal-score, equal-time entries
/// keep a stable order across calls over the same snapshot.
pub(crate) fn sort_by_score_then_recency(
    candidates: &mut [(f64, DateTime<Utc>, Uuid)],
) {
    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.1.cmp(&a.1))
            .then_with(|| a.2.cmp(&b.2))
    });
}
