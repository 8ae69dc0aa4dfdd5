use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{LikeGraph, Post};

/// An immutable view of the catalog and like-graph at call time
///
/// Every recommendation request computes over its own snapshot, taken
/// under a read lock by the caller, so concurrent requests share no
/// mutable state and the core needs no locking of its own.
#[derive(Debug, Clone)]
pub struct Snapshot {
    posts: Vec<Post>,
    likes: LikeGraph,
    user_ids: HashSet<Uuid>,
    by_id: HashMap<Uuid, usize>,
}

impl Snapshot {
    pub fn new(posts: Vec<Post>, likes: LikeGraph, user_ids: HashSet<Uuid>) -> Self {
        let by_id = posts
            .iter()
            .enumerate()
            .map(|(idx, post)| (post.id, idx))
            .collect();
        Self {
            posts,
            likes,
            user_ids,
            by_id,
        }
    }

    /// All posts in the catalog, in insertion order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn likes(&self) -> &LikeGraph {
        &self.likes
    }

    pub fn post(&self, id: Uuid) -> Option<&Post> {
        self.by_id.get(&id).map(|&idx| &self.posts[idx])
    }

    /// Whether the id resolves to a known user
    pub fn knows_user(&self, id: Uuid) -> bool {
        self.user_ids.contains(&id)
    }

    /// Normalized category labels present anywhere in the catalog
    pub fn category_labels(&self) -> HashSet<&str> {
        self.posts
            .iter()
            .flat_map(|post| post.categories.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_lookup() {
        let author = Uuid::new_v4();
        let post = Post::new("t".to_string(), "b".to_string(), vec![], author);
        let id = post.id;

        let snapshot = Snapshot::new(vec![post], LikeGraph::new(), HashSet::from([author]));
        assert_eq!(snapshot.post(id).unwrap().id, id);
        assert!(snapshot.post(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_knows_user() {
        let user = Uuid::new_v4();
        let snapshot = Snapshot::new(Vec::new(), LikeGraph::new(), HashSet::from([user]));
        assert!(snapshot.knows_user(user));
        assert!(!snapshot.knows_user(Uuid::new_v4()));
    }

    #[test]
    fn test_category_labels_are_deduplicated() {
        let author = Uuid::new_v4();
        let p1 = Post::new(
            "a".to_string(),
            "b".to_string(),
            vec!["Pets".to_string()],
            author,
        );
        let p2 = Post::new(
            "c".to_string(),
            "d".to_string(),
            vec!["pets".to_string(), "finance".to_string()],
            author,
        );

        let snapshot = Snapshot::new(vec![p1, p2], LikeGraph::new(), HashSet::new());
        assert_eq!(snapshot.category_labels(), HashSet::from(["pets", "finance"]));
    }
}
