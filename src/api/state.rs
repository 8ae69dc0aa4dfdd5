use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{LikeGraph, Post, User};
use crate::services::Snapshot;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub config: Arc<Config>,
}

/// Inner state that can be modified
///
/// `posts[..].liked_by` mirrors the like-graph; every mutation of one
/// updates the other under the same write lock.
pub struct AppStateInner {
    pub users: HashMap<Uuid, User>,
    pub posts: HashMap<Uuid, Post>,
    pub likes: LikeGraph,
}

/// Read-side seam between the shared state and the recommendation core
///
/// The data fetch is async (it takes the state lock); the computation the
/// snapshot feeds is synchronous. Mockable in tests that drive the core
/// without a live state.
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Materializes a point-in-time view of the catalog and like-graph
    async fn snapshot(&self) -> Snapshot;
}

impl AppState {
    /// Creates a new empty application state
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner {
                users: HashMap::new(),
                posts: HashMap::new(),
                likes: LikeGraph::new(),
            })),
            config: Arc::new(config),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[async_trait::async_trait]
impl SnapshotSource for AppState {
    async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().await;
        Snapshot::new(
            inner.posts.values().cloned().collect(),
            inner.likes.clone(),
            inner.users.keys().copied().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_reflects_state_at_call_time() {
        let state = AppState::default();
        let user = User::new("Asha".to_string());
        let post = Post::new("t".to_string(), "b".to_string(), vec![], user.id);
        let (user_id, post_id) = (user.id, post.id);

        {
            let mut inner = state.inner.write().await;
            inner.users.insert(user_id, user);
            inner.posts.insert(post_id, post);
        }

        let snapshot = state.snapshot().await;
        assert!(snapshot.knows_user(user_id));
        assert!(snapshot.post(post_id).is_some());

        // Later writes do not leak into the earlier snapshot
        {
            let mut inner = state.inner.write().await;
            inner.posts.clear();
        }
        assert!(snapshot.post(post_id).is_some());
    }
}
