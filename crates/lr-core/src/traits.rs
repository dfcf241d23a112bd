//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::models::{
    Follow, FollowId, Review, ReviewId, Scope, Ticket, TicketId, User, UserId,
};

/// Data persistence contract for users, tickets, reviews and follow edges.
///
/// Listing methods return rows already filtered by `Scope`; ordering is not
/// part of the contract (the feed sorts).
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    // User Operations
    async fn create_user(&self, user: User) -> anyhow::Result<()>;
    async fn get_user(&self, id: UserId) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    // Ticket Operations
    async fn create_ticket(&self, ticket: Ticket) -> anyhow::Result<()>;
    async fn get_ticket(&self, id: TicketId) -> anyhow::Result<Option<Ticket>>;
    async fn update_ticket(&self, ticket: Ticket) -> anyhow::Result<()>;
    /// Also removes every review referencing the ticket.
    async fn delete_ticket(&self, id: TicketId) -> anyhow::Result<()>;
    async fn list_tickets(&self, scope: Scope) -> anyhow::Result<Vec<Ticket>>;
    /// Tickets nobody has reviewed yet.
    async fn list_unreviewed_tickets(&self, scope: Scope) -> anyhow::Result<Vec<Ticket>>;

    // Review Operations
    /// Inserts the review and marks its ticket (if any) as reviewed, atomically.
    async fn create_review(&self, review: Review) -> anyhow::Result<()>;
    /// Inserts a fresh ticket together with the review answering it.
    async fn create_ticket_with_review(&self, ticket: Ticket, review: Review) -> anyhow::Result<()>;
    async fn get_review(&self, id: ReviewId) -> anyhow::Result<Option<Review>>;
    async fn update_review(&self, review: Review) -> anyhow::Result<()>;
    /// Removes the review and clears `review_associated` on its ticket when
    /// no other review references it.
    async fn delete_review(&self, id: ReviewId) -> anyhow::Result<()>;
    async fn list_reviews(&self, scope: Scope) -> anyhow::Result<Vec<Review>>;

    // Follow Operations
    async fn create_follow(&self, follow: Follow) -> anyhow::Result<()>;
    async fn get_follow(&self, id: FollowId) -> anyhow::Result<Option<Follow>>;
    async fn delete_follow(&self, id: FollowId) -> anyhow::Result<()>;
    async fn is_following(&self, user: UserId, followed: UserId) -> anyhow::Result<bool>;
    async fn list_following(&self, user: UserId) -> anyhow::Result<Vec<Follow>>;
    async fn list_followers(&self, user: UserId) -> anyhow::Result<Vec<Follow>>;
}

/// Media storage contract for ticket images.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns a media_id for the Ticket model.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<String>;
    /// Returns the URL or path to the stored media.
    fn get_url(&self, media_id: &str) -> String;
}
