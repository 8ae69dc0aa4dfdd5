use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::{sort_by_score_then_recency, RecommendError, ScoredPost, Snapshot};

/// Recommends posts liked by users with overlapping like histories.
///
/// Neighbors are every user sharing at least one liked post with the
/// query user, discovered through the post-to-likers index rather than
/// a scan over all user pairs. Each neighbor is weighted by the Jaccard
/// index of the two like-sets; candidate posts accumulate the weights of
/// the neighbors that liked them. Posts the user already liked or wrote
/// are excluded, as is anything with a non-positive score.
pub fn recommend_collaborative(
    user_id: Uuid,
    snapshot: &Snapshot,
) -> Result<Vec<ScoredPost>, RecommendError> {
    if !snapshot.knows_user(user_id) {
        return Err(RecommendError::UnknownUser(user_id));
    }

    let likes = snapshot.likes();
    let own_likes = likes.likes_of(user_id);
    if own_likes.is_empty() {
        return Ok(Vec::new());
    }

    let weights = neighbor_weights(user_id, &own_likes, snapshot);

    let mut scores: HashMap<Uuid, f64> = HashMap::new();
    for (&neighbor, &weight) in &weights {
        for post_id in likes.likes_of(neighbor) {
            if own_likes.contains(&post_id) {
                continue;
            }
            let authored_by_user = snapshot
                .post(post_id)
                .is_some_and(|post| post.author_id == user_id);
            if authored_by_user {
                continue;
            }
            *scores.entry(post_id).or_default() += weight;
        }
    }

    let mut ranked: Vec<(f64, chrono::DateTime<chrono::Utc>, Uuid)> = scores
        .into_iter()
        .filter(|&(_, score)| score > 0.0)
        .filter_map(|(post_id, score)| {
            snapshot
                .post(post_id)
                .map(|post| (score, post.created_at, post_id))
        })
        .collect();

    sort_by_score_then_recency(&mut ranked);
    Ok(ranked
        .into_iter()
        .map(|(score, _, post_id)| ScoredPost { post_id, score })
        .collect())
}

/// Jaccard weight for every user sharing a liked post with the query user
fn neighbor_weights(
    user_id: Uuid,
    own_likes: &HashSet<Uuid>,
    snapshot: &Snapshot,
) -> HashMap<Uuid, f64> {
    let likes = snapshot.likes();

    let mut neighbors: HashSet<Uuid> = HashSet::new();
    for &post_id in own_likes {
        for liker in likes.likers_of(post_id) {
            if liker != user_id {
                neighbors.insert(liker);
            }
        }
    }

    neighbors
        .into_iter()
        .map(|neighbor| {
            let their_likes = likes.likes_of(neighbor);
            (neighbor, jaccard(own_likes, &their_likes))
        })
        .collect()
}

/// Intersection over union of two like-sets, in [0, 1]
fn jaccard(a: &HashSet<Uuid>, b: &HashSet<Uuid>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}
