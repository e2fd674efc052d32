//! Demo users and posts served by the protected API.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A demo account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
}

/// A post owned by a demo account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    /// Owner; not exposed in API responses.
    #[serde(skip_serializing)]
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Account summary returned by `/api/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub user: User,
    pub stats: ProfileStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_posts: usize,
}

/// Read-only store of demo users and their posts.
#[derive(Debug, Clone, Default)]
pub struct DemoDirectory {
    users: HashMap<String, User>,
    posts: Vec<Post>,
}

impl DemoDirectory {
    /// An empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The directory seeded with `user-1` and two posts.
    #[must_use]
    pub fn seeded() -> Self {
        let now = Utc::now();
        let mut directory = Self::new();
        directory.add_user(User {
            id: "user-1".into(),
            username: "demo-user".into(),
            email: "demo@example.com".into(),
            name: "Demo User".into(),
        });
        directory.add_post(Post {
            id: "post-1".into(),
            user_id: "user-1".into(),
            title: "Hello MCP OAuth!".into(),
            content: "This is a demo post from our protected API.".into(),
            created_at: now,
        });
        directory.add_post(Post {
            id: "post-2".into(),
            user_id: "user-1".into(),
            title: "OAuth 2.1 essentials".into(),
            content: "Authorization codes are single use; PKCE binds them to the client that asked."
                .into(),
            created_at: now,
        });
        directory
    }

    pub fn add_user(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn add_post(&mut self, post: Post) {
        self.posts.push(post);
    }

    #[must_use]
    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// Posts owned by `user_id`, in insertion order.
    #[must_use]
    pub fn posts_for(&self, user_id: &str) -> Vec<&Post> {
        self.posts.iter().filter(|post| post.user_id == user_id).collect()
    }

    /// The user's record with post statistics.
    #[must_use]
    pub fn profile(&self, user_id: &str) -> Option<Profile> {
        let user = self.user(user_id)?.clone();
        let total_posts = self.posts_for(user_id).len();
        Some(Profile { user, stats: ProfileStats { total_posts } })
    }
}
