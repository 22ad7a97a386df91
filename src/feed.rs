//! In-memory social feed

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub username: String,
    pub user_handle: String,
    pub content: String,
    pub likes: u32,
    pub comments: u32,
    pub posted_at: DateTime<Utc>,
}

impl Post {
    /// "Just now", "5 minutes ago", "3 hours ago", "2 days ago"
    pub fn relative_time(&self, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(self.posted_at);
        let (value, unit) = if elapsed.num_days() > 0 {
            (elapsed.num_days(), "day")
        } else if elapsed.num_hours() > 0 {
            (elapsed.num_hours(), "hour")
        } else if elapsed.num_minutes() > 0 {
            (elapsed.num_minutes(), "minute")
        } else {
            return "Just now".to_string();
        };

        let plural = if value == 1 { "" } else { "s" };
        format!("{} {}{} ago", value, unit, plural)
    }
}

/// Newest-first list of posts
#[derive(Debug, Clone)]
pub struct Feed {
    posts: Vec<Post>,
    next_id: u64,
}

impl Feed {
    /// Feed pre-filled with a few sample posts relative to `now`
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let seed = |id, username: &str, handle: &str, content: &str, likes, comments, hours| Post {
            id,
            username: username.to_string(),
            user_handle: handle.to_string(),
            content: content.to_string(),
            likes,
            comments,
            posted_at: now - Duration::hours(hours),
        };

        Self {
            posts: vec![
                seed(1, "BlockMaster", "@blockmaster", "Solana price surged today! 🚀", 24, 5, 1),
                seed(
                    2,
                    "ChainExplorer",
                    "@chainexplorer",
                    "New NFT collection launching tomorrow! #NFT #Solana",
                    56,
                    12,
                    3,
                ),
                seed(
                    3,
                    "EthereumFan",
                    "@eth_lover",
                    "Ethereum 2.0 update is progressing faster than expected. What are your thoughts?",
                    89,
                    32,
                    5,
                ),
            ],
            next_id: 4,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Publish a post from the current account at the top of the feed
    pub fn submit(&mut self, content: &str) -> Result<&Post> {
        if content.trim().is_empty() {
            return Err(Error::Validation("Post content cannot be empty".to_string()));
        }

        let post = Post {
            id: self.next_id,
            username: "My Account".to_string(),
            user_handle: "@me".to_string(),
            content: content.to_string(),
            likes: 0,
            comments: 0,
            posted_at: Utc::now(),
        };
        self.next_id += 1;
        self.posts.insert(0, post);
        Ok(&self.posts[0])
    }

    /// Increment a post's likes, returning the new count
    pub fn like(&mut self, id: u64) -> Option<u32> {
        let post = self.posts.iter_mut().find(|p| p.id == id)?;
        post.likes += 1;
        Some(post.likes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_feed() {
        let now = Utc::now();
        let feed = Feed::seeded(now);
        assert_eq!(feed.posts().len(), 3);
        assert_eq!(feed.posts()[0].relative_time(now), "1 hour ago");
        assert_eq!(feed.posts()[2].relative_time(now), "5 hours ago");
    }

    #[test]
    fn test_submit_prepends() {
        let mut feed = Feed::seeded(Utc::now());
        assert!(feed.submit("   ").is_err());
        assert_eq!(feed.posts().len(), 3);

        let id = feed.submit("gm").unwrap().id;
        assert_eq!(feed.posts()[0].id, id);
        assert_eq!(feed.posts()[0].user_handle, "@me");
        assert_eq!(feed.posts()[0].relative_time(Utc::now()), "Just now");
        assert_eq!(feed.posts().len(), 4);
    }

    #[test]
    fn test_like() {
        let mut feed = Feed::seeded(Utc::now());
        assert_eq!(feed.like(1), Some(25));
        assert_eq!(feed.like(99), None);
    }
}
