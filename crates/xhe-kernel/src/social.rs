//! Social graph, posts, feeds and channels.

use serde_json::json;
use tracing::debug;
use xhe_kernel_core::social::feed_id_for;
use xhe_kernel_core::{
    global_feed, now, validate_content, validate_did, Channel, ContentEntry, Feed, Post,
    PostOptions, PulseKind, Scheme, SocialGraph,
};
use xhe_kernel_store::{Store, StoreKey};

use crate::error::{KernelError, Result};
use crate::kernel::Kernel;

impl<S: Store> Kernel<S> {
    // ─────────────────────────────────────────────────────────────────────────
    // Graph
    // ─────────────────────────────────────────────────────────────────────────

    /// Follow `did`.
    ///
    /// Returns `false` (and emits nothing) when already following.
    pub async fn follow(&self, did: &str) -> Result<bool> {
        validate_did(did)?;

        let mut state = self.begin().await?;
        let own = state.identity.did.clone();
        if !state.social.follow(&own, did)? {
            return Ok(false);
        }
        state.mark(StoreKey::Social);
        state.emit(PulseKind::Follow, json!({ "did": did }))?;
        self.persist(&mut state).await;
        Ok(true)
    }

    /// Stop following `did`. Always emits `UNFOLLOW`.
    ///
    /// Returns whether `did` was followed.
    pub async fn unfollow(&self, did: &str) -> Result<bool> {
        validate_did(did)?;

        let mut state = self.begin().await?;
        let removed = state.social.unfollow(did);
        if removed {
            state.mark(StoreKey::Social);
        }
        state.emit(PulseKind::Unfollow, json!({ "did": did, "removed": removed }))?;
        self.persist(&mut state).await;
        Ok(removed)
    }

    /// Block `did`, dropping any follow. Emits only when newly blocked.
    pub async fn block(&self, did: &str) -> Result<bool> {
        validate_did(did)?;

        let mut state = self.begin().await?;
        let own = state.identity.did.clone();
        if !state.social.block(&own, did)? {
            return Ok(false);
        }
        state.mark(StoreKey::Social);
        state.emit(PulseKind::Block, json!({ "did": did }))?;
        self.persist(&mut state).await;
        Ok(true)
    }

    /// Lift a block. Emits only when `did` was blocked.
    pub async fn unblock(&self, did: &str) -> Result<bool> {
        validate_did(did)?;

        let mut state = self.begin().await?;
        if !state.social.unblock(did) {
            return Ok(false);
        }
        state.mark(StoreKey::Social);
        state.emit(PulseKind::Unblock, json!({ "did": did }))?;
        self.persist(&mut state).await;
        Ok(true)
    }

    pub async fn social_graph(&self) -> SocialGraph {
        self.lock().await.social.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Posts and feeds
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish a post to the personal feed, and to `options.channel` when
    /// that channel exists.
    pub async fn create_post(&self, content: &str, options: PostOptions) -> Result<Post> {
        validate_content(content)?;

        let mut state = self.begin().await?;
        let author = state.identity.did.clone();
        let timestamp = now();
        let post = Post::new(content, &author, &options, timestamp);

        state.content.insert(
            post.hash,
            ContentEntry {
                content: content.to_string(),
                timestamp,
                author: author.clone(),
                scheme: Scheme::Content,
            },
        );
        state.mark(StoreKey::Content);

        state
            .feeds
            .entry(feed_id_for(&author))
            .or_insert_with(|| Feed::personal(&author, timestamp))
            .prepend(post.clone());
        state.mark(StoreKey::Feeds);

        let in_channel = match options.channel.as_deref() {
            Some(id) => match state.channels.get_mut(id) {
                Some(channel) => {
                    channel.prepend(post.clone());
                    true
                }
                None => false,
            },
            None => false,
        };
        if in_channel {
            state.mark(StoreKey::Channels);
        }

        let kind = options.pulse_kind();
        state.emit(
            kind,
            json!({
                "postId": post.id,
                "hash": post.hash.to_hex(),
                "address": post.address,
                "replyTo": post.reply_to,
                "repostOf": post.repost_of,
                "channel": in_channel.then(|| post.channel.clone()).flatten(),
            }),
        )?;
        self.persist(&mut state).await;

        debug!(post = %post.id, kind = kind.as_str(), "post created");
        Ok(post)
    }

    /// The current identity's feed (empty if nothing was posted yet).
    pub async fn own_feed(&self) -> Feed {
        let state = self.lock().await;
        let did = &state.identity.did;
        state
            .feeds
            .get(&feed_id_for(did))
            .cloned()
            .unwrap_or_else(|| Feed::personal(did, state.meta.created))
    }

    /// A feed by id.
    pub async fn feed(&self, id: &str) -> Option<Feed> {
        self.lock().await.feeds.get(id).cloned()
    }

    /// Posts from every feed and channel, newest first.
    ///
    /// `None` uses the configured default limit.
    pub async fn global_feed(&self, limit: Option<usize>) -> Vec<Post> {
        let state = self.lock().await;
        global_feed(
            state.feeds.values(),
            state.channels.values(),
            limit.unwrap_or(self.config.default_feed_limit),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Channels
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a channel owned by the current identity.
    pub async fn create_channel(&self, name: &str, description: &str) -> Result<Channel> {
        let mut state = self.begin().await?;
        let owner = state.identity.did.clone();
        let channel = Channel::new(name, description, &owner, now());

        state.channels.insert(channel.id.clone(), channel.clone());
        state.mark(StoreKey::Channels);
        state.emit(
            PulseKind::ChannelCreate,
            json!({
                "channelId": channel.id,
                "name": channel.name,
                "address": channel.address(),
            }),
        )?;
        self.persist(&mut state).await;
        Ok(channel)
    }

    /// Join a channel. Returns `false` when already a member.
    pub async fn join_channel(&self, id: &str) -> Result<bool> {
        let mut state = self.begin().await?;
        let did = state.identity.did.clone();
        let channel = state
            .channels
            .get_mut(id)
            .ok_or_else(|| KernelError::ChannelNotFound(id.to_string()))?;
        if !channel.members.insert(did) {
            return Ok(false);
        }
        state.mark(StoreKey::Channels);
        state.emit(PulseKind::ChannelJoin, json!({ "channelId": id }))?;
        self.persist(&mut state).await;
        Ok(true)
    }

    /// Leave a channel. The owner cannot leave.
    pub async fn leave_channel(&self, id: &str) -> Result<bool> {
        let mut state = self.begin().await?;
        let did = state.identity.did.clone();
        let channel = state
            .channels
            .get_mut(id)
            .ok_or_else(|| KernelError::ChannelNotFound(id.to_string()))?;
        if channel.owner == did {
            return Err(KernelError::InvalidOperation(
                "channel owner cannot leave".into(),
            ));
        }
        if !channel.members.remove(&did) {
            return Ok(false);
        }
        state.mark(StoreKey::Channels);
        state.emit(PulseKind::ChannelLeave, json!({ "channelId": id }))?;
        self.persist(&mut state).await;
        Ok(true)
    }

    /// All channels, oldest first.
    pub async fn channels(&self) -> Vec<Channel> {
        let state = self.lock().await;
        let mut channels: Vec<Channel> = state.channels.values().cloned().collect();
        channels.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        channels
    }

    pub async fn channel(&self, id: &str) -> Option<Channel> {
        self.lock().await.channels.get(id).cloned()
    }
}
