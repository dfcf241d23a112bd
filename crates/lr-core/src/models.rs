//! # Domain Models
//!
//! These structs represent the core entities of LitReview.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type TicketId = Uuid;
pub type ReviewId = Uuid;
pub type FollowId = Uuid;

/// Lowest and highest rating a review may carry.
pub const MIN_RATING: u8 = 0;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A request for a review of a book or a film.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub user_id: UserId,
    /// Media id handed out by the MediaStore
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    /// True while at least one review references this ticket
    pub review_associated: bool,
}

/// A rated evaluation, optionally answering a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub ticket_id: Option<TicketId>,
    pub rating: u8,
    pub user_id: UserId,
    pub headline: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub starred: bool,
    pub word_count: u32,
}

impl Review {
    /// Recomputes `word_count` from the current body.
    pub fn refresh_word_count(&mut self) {
        self.word_count = word_count(&self.body);
    }
}

pub fn word_count(body: &str) -> u32 {
    body.split_whitespace().count() as u32
}

/// Directed edge: `user_id` follows `followed_user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: FollowId,
    pub user_id: UserId,
    pub followed_user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Whose posts a store query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Owner(UserId),
    /// Posts of every user followed by the given user
    FollowedBy(UserId),
}

/// Anything that can appear in a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Post {
    Ticket(Ticket),
    Review(Review),
}

impl Post {
    pub fn user_id(&self) -> UserId {
        match self {
            Post::Ticket(t) => t.user_id,
            Post::Review(r) => r.user_id,
        }
    }
}

impl From<Ticket> for Post {
    fn from(ticket: Ticket) -> Self {
        Post::Ticket(ticket)
    }
}

impl From<Review> for Post {
    fn from(review: Review) -> Self {
        Post::Review(review)
    }
}
