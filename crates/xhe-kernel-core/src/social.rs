//! Social graph, posts, feeds and channels.
//!
//! Feeds and channels hold posts most-recent-first. They are views: the
//! content store remains the source of truth for post bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::address::Address;
use crate::crypto::{random_hex, ContentHash};
use crate::error::SocialError;
use crate::identity::did_fragment;
use crate::pulse::PulseKind;

/// Follow/follower/block sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialGraph {
    pub following: BTreeSet<String>,
    pub followers: BTreeSet<String>,
    pub blocked: BTreeSet<String>,
}

impl SocialGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow `did` on behalf of `own`.
    ///
    /// Returns `Ok(false)` when already following.
    pub fn follow(&mut self, own: &str, did: &str) -> Result<bool, SocialError> {
        if own == did {
            return Err(SocialError::SelfFollow);
        }
        if self.blocked.contains(did) {
            return Err(SocialError::Blocked(did.to_string()));
        }
        Ok(self.following.insert(did.to_string()))
    }

    /// Stop following `did`. Returns whether it was followed.
    pub fn unfollow(&mut self, did: &str) -> bool {
        self.following.remove(did)
    }

    /// Block `did`, dropping any follow. Returns whether it was newly blocked.
    pub fn block(&mut self, own: &str, did: &str) -> Result<bool, SocialError> {
        if own == did {
            return Err(SocialError::SelfFollow);
        }
        self.following.remove(did);
        Ok(self.blocked.insert(did.to_string()))
    }

    /// Lift a block. Returns whether it was blocked.
    pub fn unblock(&mut self, did: &str) -> bool {
        self.blocked.remove(did)
    }

    /// Whether the did appears in the following or followers sets.
    pub fn relation(&self, did: &str) -> Option<Relation> {
        if self.following.contains(did) {
            Some(Relation::Following)
        } else if self.followers.contains(did) {
            Some(Relation::Follower)
        } else {
            None
        }
    }
}

/// How a known identity relates to the kernel's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Following,
    Follower,
}

/// Optional links attached to a new post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repost_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl PostOptions {
    /// A reply to another post.
    pub fn reply_to(post: impl Into<String>) -> Self {
        Self {
            reply_to: Some(post.into()),
            ..Self::default()
        }
    }

    /// A repost of another post.
    pub fn repost_of(post: impl Into<String>) -> Self {
        Self {
            repost_of: Some(post.into()),
            ..Self::default()
        }
    }

    /// A post into a channel.
    pub fn in_channel(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            ..Self::default()
        }
    }

    /// Pulse kind by priority: reply, then repost, then plain create.
    pub fn pulse_kind(&self) -> PulseKind {
        if self.reply_to.is_some() {
            PulseKind::PostReply
        } else if self.repost_of.is_some() {
            PulseKind::PostRepost
        } else {
            PulseKind::PostCreate
        }
    }
}

/// A post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub content: String,
    pub hash: ContentHash,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repost_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub address: String,
}

impl Post {
    /// Build a post; the caller validates the content.
    pub fn new(
        content: &str,
        author: &str,
        options: &PostOptions,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let hash = ContentHash::of_str(content);
        Self {
            id: random_hex(16),
            content: content.to_string(),
            hash,
            author: author.to_string(),
            timestamp,
            reply_to: options.reply_to.clone(),
            repost_of: options.repost_of.clone(),
            channel: options.channel.clone(),
            address: Address::content(&hash).to_string(),
        }
    }
}

/// A personal feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    pub owner: String,
    pub created: DateTime<Utc>,
    pub posts: Vec<Post>,
}

impl Feed {
    /// Create the empty personal feed of `owner`.
    pub fn personal(owner: &str, created: DateTime<Utc>) -> Self {
        Self {
            id: feed_id_for(owner),
            owner: owner.to_string(),
            created,
            posts: Vec::new(),
        }
    }

    /// Insert a post at the head.
    pub fn prepend(&mut self, post: Post) {
        self.posts.insert(0, post);
    }
}

/// A named, owned collection of posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner: String,
    pub created: DateTime<Utc>,
    pub members: BTreeSet<String>,
    pub posts: Vec<Post>,
}

impl Channel {
    /// Create a channel whose only member is its owner.
    pub fn new(name: &str, description: &str, owner: &str, created: DateTime<Utc>) -> Self {
        Self {
            id: random_hex(16),
            name: name.to_string(),
            description: description.to_string(),
            owner: owner.to_string(),
            created,
            members: BTreeSet::from([owner.to_string()]),
            posts: Vec::new(),
        }
    }

    /// Insert a post at the head.
    pub fn prepend(&mut self, post: Post) {
        self.posts.insert(0, post);
    }

    /// Address of this channel.
    pub fn address(&self) -> String {
        Address::Channel {
            id: self.id.clone(),
        }
        .to_string()
    }
}

/// Personal feed id for a did.
pub fn feed_id_for(did: &str) -> String {
    did_fragment(did).to_string()
}

/// Merge feeds and channels into one timeline.
///
/// Posts are de-duplicated by content hash (first occurrence wins), sorted by
/// timestamp descending, and truncated to `limit`.
pub fn global_feed<'a>(
    feeds: impl IntoIterator<Item = &'a Feed>,
    channels: impl IntoIterator<Item = &'a Channel>,
    limit: usize,
) -> Vec<Post> {
    let mut seen = HashSet::new();
    let mut posts: Vec<Post> = feeds
        .into_iter()
        .flat_map(|feed| feed.posts.iter())
        .chain(channels.into_iter().flat_map(|channel| channel.posts.iter()))
        .filter(|post| seen.insert(post.hash))
        .cloned()
        .collect();

    posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    posts.truncate(limit);
    posts
}
