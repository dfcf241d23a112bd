//! Review lifecycle.
//!
//! A review is either written together with a brand-new ticket or answers an
//! existing one. Either way the ticket ends up with `review_associated` set;
//! the store keeps that flag in step when reviews go away.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::tickets::{draft_ticket, get_ticket, NewTicket};
use super::{ensure_owner, limited_text, required_text, BODY_MAX_CHARS, HEADLINE_MAX_CHARS};
use crate::error::{AppError, Result};
use crate::models::{word_count, Review, ReviewId, Ticket, TicketId, UserId, MAX_RATING, MIN_RATING};
use crate::traits::PostStore;

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub headline: String,
    pub rating: i64,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewUpdate {
    pub headline: Option<String>,
    pub rating: Option<i64>,
    pub body: Option<String>,
    pub starred: Option<bool>,
}

fn checked_rating(rating: i64) -> Result<u8> {
    u8::try_from(rating)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
            ))
        })
}

fn draft_review(owner: UserId, ticket_id: TicketId, input: NewReview) -> Result<Review> {
    let body = limited_text("body", input.body.trim(), BODY_MAX_CHARS)?;
    Ok(Review {
        id: Uuid::now_v7(),
        ticket_id: Some(ticket_id),
        rating: checked_rating(input.rating)?,
        user_id: owner,
        headline: required_text("headline", &input.headline, HEADLINE_MAX_CHARS)?,
        word_count: word_count(&body),
        body,
        created_at: Utc::now(),
        starred: false,
    })
}

/// Creates a ticket and its review in one go (the "review from scratch" flow).
pub async fn create_review_with_ticket(
    store: &dyn PostStore,
    owner: UserId,
    ticket: NewTicket,
    review: NewReview,
) -> Result<(Ticket, Review)> {
    let mut ticket = draft_ticket(owner, ticket)?;
    let review = draft_review(owner, ticket.id, review)?;
    ticket.review_associated = true;

    store.create_ticket_with_review(ticket.clone(), review.clone()).await?;
    log::info!("user {} created ticket {} with review {}", owner, ticket.id, review.id);
    Ok((ticket, review))
}

/// Answers someone's (or one's own) existing ticket.
pub async fn create_review_on_ticket(
    store: &dyn PostStore,
    owner: UserId,
    ticket_id: TicketId,
    input: NewReview,
) -> Result<Review> {
    get_ticket(store, ticket_id).await?;
    let review = draft_review(owner, ticket_id, input)?;
    store.create_review(review.clone()).await?;
    log::info!("user {} reviewed ticket {}", owner, ticket_id);
    Ok(review)
}

pub async fn get_review(store: &dyn PostStore, id: ReviewId) -> Result<Review> {
    store
        .get_review(id)
        .await?
        .ok_or_else(|| AppError::NotFound("review", id.to_string()))
}

pub async fn edit_review(
    store: &dyn PostStore,
    actor: UserId,
    id: ReviewId,
    update: ReviewUpdate,
) -> Result<Review> {
    let mut review = get_review(store, id).await?;
    ensure_owner("review", review.user_id, actor)?;

    if let Some(headline) = update.headline {
        review.headline = required_text("headline", &headline, HEADLINE_MAX_CHARS)?;
    }
    if let Some(rating) = update.rating {
        review.rating = checked_rating(rating)?;
    }
    if let Some(body) = update.body {
        review.body = limited_text("body", body.trim(), BODY_MAX_CHARS)?;
    }
    if let Some(starred) = update.starred {
        review.starred = starred;
    }
    review.refresh_word_count();

    store.update_review(review.clone()).await?;
    Ok(review)
}

/// Deletes a review; the ticket it answered stays.
pub async fn delete_review(store: &dyn PostStore, actor: UserId, id: ReviewId) -> Result<()> {
    let review = get_review(store, id).await?;
    ensure_owner("review", review.user_id, actor)?;
    store.delete_review(id).await?;
    log::info!("user {} deleted review {}", actor, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockPostStore;

    fn input(rating: i64) -> NewReview {
        NewReview {
            headline: "Great read".into(),
            rating,
            body: "one two  three".into(),
        }
    }

    fn some_ticket(owner: UserId) -> Ticket {
        draft_ticket(owner, NewTicket { title: "Dune".into(), description: String::new() }).unwrap()
    }

    #[tokio::test]
    async fn ratings_outside_zero_to_five_are_rejected() {
        let store = MockPostStore::new();
        for rating in [-1, 6, 300] {
            let ticket = NewTicket { title: "Dune".into(), description: String::new() };
            let err = create_review_with_ticket(&store, Uuid::now_v7(), ticket, input(rating))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "rating {rating}");
        }
    }

    #[tokio::test]
    async fn review_with_ticket_marks_ticket_reviewed() {
        let mut store = MockPostStore::new();
        store
            .expect_create_ticket_with_review()
            .withf(|t, r| t.review_associated && r.ticket_id == Some(t.id))
            .times(1)
            .returning(|_, _| Ok(()));

        let owner = Uuid::now_v7();
        let ticket = NewTicket { title: "Dune".into(), description: String::new() };
        let (ticket, review) = create_review_with_ticket(&store, owner, ticket, input(0))
            .await
            .unwrap();
        assert!(ticket.review_associated);
        assert_eq!(review.rating, 0);
        assert_eq!(review.word_count, 3);
    }

    #[tokio::test]
    async fn review_on_missing_ticket_is_not_found() {
        let mut store = MockPostStore::new();
        store.expect_get_ticket().returning(|_| Ok(None));
        store.expect_create_review().never();

        let err = create_review_on_ticket(&store, Uuid::now_v7(), Uuid::now_v7(), input(4))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("ticket", _)));
    }

    #[tokio::test]
    async fn review_on_existing_ticket_references_it() {
        let ticket = some_ticket(Uuid::now_v7());
        let ticket_id = ticket.id;

        let mut store = MockPostStore::new();
        store.expect_get_ticket().returning(move |_| Ok(Some(ticket.clone())));
        store
            .expect_create_review()
            .withf(move |r| r.ticket_id == Some(ticket_id))
            .times(1)
            .returning(|_| Ok(()));

        let review = create_review_on_ticket(&store, Uuid::now_v7(), ticket_id, input(5))
            .await
            .unwrap();
        assert_eq!(review.rating, 5);
    }

    #[tokio::test]
    async fn edit_recounts_words_and_stars() {
        let owner = Uuid::now_v7();
        let review = draft_review(owner, Uuid::now_v7(), input(2)).unwrap();
        let id = review.id;

        let mut store = MockPostStore::new();
        store.expect_get_review().returning(move |_| Ok(Some(review.clone())));
        store.expect_update_review().times(1).returning(|_| Ok(()));

        let update = ReviewUpdate {
            body: Some("just two".into()),
            starred: Some(true),
            ..Default::default()
        };
        let edited = edit_review(&store, owner, id, update).await.unwrap();
        assert_eq!(edited.word_count, 2);
        assert!(edited.starred);
        assert_eq!(edited.rating, 2);
    }

    #[tokio::test]
    async fn delete_by_other_user_is_forbidden() {
        let review = draft_review(Uuid::now_v7(), Uuid::now_v7(), input(2)).unwrap();
        let id = review.id;

        let mut store = MockPostStore::new();
        store.expect_get_review().returning(move |_| Ok(Some(review.clone())));
        store.expect_delete_review().never();

        let err = delete_review(&store, Uuid::now_v7(), id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn store_failures_pass_through() {
        let mut store = MockPostStore::new();
        store
            .expect_get_review()
            .returning(|_| Err(anyhow::anyhow!("database is locked")));

        let err = get_review(&store, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(err.to_string(), "database is locked");
    }
}
