//! Users and the follow graph.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{ensure_owner, required_text, USERNAME_MAX_CHARS};
use crate::error::{AppError, Result};
use crate::models::{Follow, FollowId, User, UserId};
use crate::traits::PostStore;

/// Both directions of a user's follow graph.
#[derive(Debug, Clone, Serialize)]
pub struct Subscriptions {
    pub following: Vec<Follow>,
    pub followers: Vec<Follow>,
}

pub async fn register_user(store: &dyn PostStore, username: &str) -> Result<User> {
    let username = required_text("username", username, USERNAME_MAX_CHARS)?;
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation("username must not contain whitespace".into()));
    }
    if store.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict(format!("username {username} is taken")));
    }

    let user = User {
        id: Uuid::now_v7(),
        username,
        created_at: Utc::now(),
    };
    store
        .create_user(user.clone())
        .await
        .map_err(|err| AppError::conflict_on_duplicate(err, || format!("username {} is taken", user.username)))?;
    log::info!("registered user {} ({})", user.username, user.id);
    Ok(user)
}

pub async fn get_user(store: &dyn PostStore, id: UserId) -> Result<User> {
    store
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user", id.to_string()))
}

/// Makes `follower` follow the user called `username`.
pub async fn follow_user(store: &dyn PostStore, follower: UserId, username: &str) -> Result<Follow> {
    let username = username.trim();
    let followed = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound("user", username.to_string()))?;

    if followed.id == follower {
        return Err(AppError::Validation("users cannot follow themselves".into()));
    }
    if store.is_following(follower, followed.id).await? {
        return Err(AppError::Conflict(format!("already following {username}")));
    }

    let follow = Follow {
        id: Uuid::now_v7(),
        user_id: follower,
        followed_user_id: followed.id,
        created_at: Utc::now(),
    };
    store
        .create_follow(follow.clone())
        .await
        .map_err(|err| AppError::conflict_on_duplicate(err, || format!("already following {username}")))?;
    log::info!("user {} now follows {}", follower, followed.id);
    Ok(follow)
}

/// Removes a follow edge. Only the follower may do this.
pub async fn unfollow(store: &dyn PostStore, actor: UserId, id: FollowId) -> Result<()> {
    let follow = store
        .get_follow(id)
        .await?
        .ok_or_else(|| AppError::NotFound("follow", id.to_string()))?;
    ensure_owner("follow", follow.user_id, actor)?;
    store.delete_follow(id).await?;
    Ok(())
}

pub async fn subscriptions(store: &dyn PostStore, user: UserId) -> Result<Subscriptions> {
    Ok(Subscriptions {
        following: store.list_following(user).await?,
        followers: store.list_followers(user).await?,
    })
}
