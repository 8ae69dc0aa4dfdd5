use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::{RecommendError, Snapshot};

/// How many of the user's most-liked categories count as preferred
///
/// Bounds the candidate set; ties on frequency break alphabetically so
/// the preferred set is deterministic.
const PREFERRED_CATEGORY_LIMIT: usize = 5;

/// Recommends unseen posts from the categories a user likes most.
///
/// Preferred categories are inferred from the user's like history, then
/// candidate posts (sharing a preferred category, not yet liked, not
/// authored by the user) are ranked by like count and recency. A user
/// with no like history gets an empty ranking, not an error.
pub fn recommend_by_category(
    user_id: Uuid,
    snapshot: &Snapshot,
) -> Result<Vec<Uuid>, RecommendError> {
    if !snapshot.knows_user(user_id) {
        return Err(RecommendError::UnknownUser(user_id));
    }

    let liked = snapshot.likes().likes_of(user_id);
    if liked.is_empty() {
        return Ok(Vec::new());
    }

    let preferred = preferred_categories(&liked, snapshot);
    if preferred.is_empty() {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<(f64, chrono::DateTime<chrono::Utc>, Uuid)> = snapshot
        .posts()
        .iter()
        .filter(|post| !liked.contains(&post.id))
        .filter(|post| post.author_id != user_id)
        .filter(|post| post.categories.iter().any(|c| preferred.contains(c)))
        .map(|post| (post.like_count() as f64, post.created_at, post.id))
        .collect();

    super::sort_by_score_then_recency(&mut candidates);
    Ok(candidates.into_iter().map(|(_, _, id)| id).collect())
}

/// Top categories across the posts the user liked
fn preferred_categories(liked: &HashSet<Uuid>, snapshot: &Snapshot) -> HashSet<String> {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for post_id in liked {
        if let Some(post) = snapshot.post(*post_id) {
            for category in &post.categories {
                *frequency.entry(category.as_str()).or_default() += 1;
            }
        }
    }

    let mut ordered: Vec<(&str, usize)> = frequency.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ordered
        .into_iter()
        .take(PREFERRED_CATEGORY_LIMIT)
        .map(|(category, _)| category.to_string())
        .collect()
}
