use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A platform user
///
/// The `following` set feeds list composition in the presentation layer;
/// the recommendation strategies themselves operate purely on posts and
/// likes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Ids of users this user follows
    pub following: HashSet<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with an empty following set
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            following: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Toggles following of another user; returns true when now following
    pub fn toggle_follow(&mut self, target: Uuid) -> bool {
        if self.following.remove(&target) {
            false
        } else {
            self.following.insert(target);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user() {
        let user = User::new("Asha".to_string());
        assert_eq!(user.name, "Asha");
        assert!(user.following.is_empty());
    }

    #[test]
    fn test_toggle_follow() {
        let mut user = User::new("Asha".to_string());
        let target = Uuid::new_v4();

        assert!(user.toggle_follow(target));
        assert!(user.following.contains(&target));

        // Toggling again removes the edge
        assert!(!user.toggle_follow(target));
        assert!(user.following.is_empty());
    }
}
