use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The bipartite user-to-post like relation
///
/// Kept as a pair of adjacency maps (user to liked posts, post to likers)
/// so neighbor discovery and candidate generation never scan the full
/// edge list. Both directions are updated together; at most one edge
/// exists per (user, post) pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikeGraph {
    user_likes: HashMap<Uuid, HashSet<Uuid>>,
    post_likers: HashMap<Uuid, HashSet<Uuid>>,
}

impl LikeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles the (user, post) edge; returns true when the edge now exists
    pub fn toggle(&mut self, user_id: Uuid, post_id: Uuid) -> bool {
        if self.contains(user_id, post_id) {
            self.remove_edge(user_id, post_id);
            false
        } else {
            self.user_likes.entry(user_id).or_default().insert(post_id);
            self.post_likers.entry(post_id).or_default().insert(user_id);
            true
        }
    }

    fn remove_edge(&mut self, user_id: Uuid, post_id: Uuid) {
        if let Some(posts) = self.user_likes.get_mut(&user_id) {
            posts.remove(&post_id);
            if posts.is_empty() {
                self.user_likes.remove(&user_id);
            }
        }
        if let Some(users) = self.post_likers.get_mut(&post_id) {
            users.remove(&user_id);
            if users.is_empty() {
                self.post_likers.remove(&post_id);
            }
        }
    }

    /// Removes every edge touching the post (cascade on post deletion)
    pub fn remove_post(&mut self, post_id: Uuid) {
        if let Some(users) = self.post_likers.remove(&post_id) {
            for user_id in users {
                if let Some(posts) = self.user_likes.get_mut(&user_id) {
                    posts.remove(&post_id);
                    if posts.is_empty() {
                        self.user_likes.remove(&user_id);
                    }
                }
            }
        }
    }

    /// Removes every edge touching the user (cascade on user deletion)
    pub fn remove_user(&mut self, user_id: Uuid) {
        if let Some(posts) = self.user_likes.remove(&user_id) {
            for post_id in posts {
                if let Some(users) = self.post_likers.get_mut(&post_id) {
                    users.remove(&user_id);
                    if users.is_empty() {
                        self.post_likers.remove(&post_id);
                    }
                }
            }
        }
    }

    pub fn contains(&self, user_id: Uuid, post_id: Uuid) -> bool {
        self.user_likes
            .get(&user_id)
            .is_some_and(|posts| posts.contains(&post_id))
    }

    /// Posts the user has liked; empty set for unknown users
    pub fn likes_of(&self, user_id: Uuid) -> HashSet<Uuid> {
        self.user_likes.get(&user_id).cloned().unwrap_or_default()
    }

    /// Users that liked the post; empty set for unknown posts
    pub fn likers_of(&self, post_id: Uuid) -> HashSet<Uuid> {
        self.post_likers.get(&post_id).cloned().unwrap_or_default()
    }

    /// Total number of like edges
    pub fn edge_count(&self) -> usize {
        self.user_likes.values().map(HashSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_and_removes_one_edge() {
        let mut graph = LikeGraph::new();
        let user = Uuid::new_v4();
        let post = Uuid::new_v4();

        assert!(graph.toggle(user, post));
        assert!(graph.contains(user, post));
        assert_eq!(graph.edge_count(), 1);

        // Second toggle of the same pair removes exactly that edge
        assert!(!graph.toggle(user, post));
        assert!(!graph.contains(user, post));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_both_directions_stay_in_sync() {
        let mut graph = LikeGraph::new();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let post = Uuid::new_v4();

        graph.toggle(u1, post);
        graph.toggle(u2, post);

        assert_eq!(graph.likers_of(post), HashSet::from([u1, u2]));
        assert_eq!(graph.likes_of(u1), HashSet::from([post]));

        graph.toggle(u1, post);
        assert_eq!(graph.likers_of(post), HashSet::from([u2]));
        assert!(graph.likes_of(u1).is_empty());
    }

    #[test]
    fn test_remove_post_cascades() {
        let mut graph = LikeGraph::new();
        let user = Uuid::new_v4();
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());

        graph.toggle(user, p1);
        graph.toggle(user, p2);
        graph.remove_post(p1);

        assert!(!graph.contains(user, p1));
        assert!(graph.contains(user, p2));
        assert!(graph.likers_of(p1).is_empty());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_remove_user_cascades() {
        let mut graph = LikeGraph::new();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let post = Uuid::new_v4();

        graph.toggle(u1, post);
        graph.toggle(u2, post);
        graph.remove_user(u1);

        assert_eq!(graph.likers_of(post), HashSet::from([u2]));
        assert!(graph.likes_of(u1).is_empty());
    }

    #[test]
    fn test_unknown_ids_return_empty_sets() {
        let graph = LikeGraph::new();
        assert!(graph.likes_of(Uuid::new_v4()).is_empty());
        assert!(graph.likers_of(Uuid::new_v4()).is_empty());
    }
}
