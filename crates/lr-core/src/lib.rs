//! litreview/crates/lr-core/src/lib.rs
//!
//! The central domain logic and interface definitions for LitReview.

pub mod error;
pub mod feed;
pub mod models;
pub mod services;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use feed::{build_feed, FeedEntry, FeedSource, Page, PageRequest, PAGE_SIZE};
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_review_word_count_follows_body() {
        let mut review = Review {
            id: Uuid::now_v7(),
            ticket_id: None,
            rating: 4,
            user_id: Uuid::now_v7(),
            headline: "Solid".to_string(),
            body: "Hello Rust!".to_string(),
            created_at: chrono::Utc::now(),
            starred: false,
            word_count: 0,
        };
        review.refresh_word_count();
        assert_eq!(review.word_count, 2);

        review.body = String::new();
        review.refresh_word_count();
        assert_eq!(review.word_count, 0);
    }

    #[test]
    fn test_post_serializes_with_kind_tag() {
        let ticket = Ticket {
            id: Uuid::now_v7(),
            title: "Dune".to_string(),
            description: String::new(),
            user_id: Uuid::now_v7(),
            image: None,
            created_at: chrono::Utc::now(),
            review_associated: false,
        };
        let json = serde_json::to_value(Post::from(ticket)).unwrap();
        assert_eq!(json["kind"], "ticket");
        assert_eq!(json["title"], "Dune");
    }
}
