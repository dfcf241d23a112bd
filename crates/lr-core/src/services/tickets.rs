//! Ticket lifecycle: create, view, edit, delete, attach an image.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{ensure_owner, limited_text, required_text, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};
use crate::error::{AppError, Result};
use crate::models::{Ticket, TicketId, UserId};
use crate::traits::{MediaStore, PostStore};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Builds a validated, not yet persisted ticket owned by `owner`.
pub(crate) fn draft_ticket(owner: UserId, input: NewTicket) -> Result<Ticket> {
    Ok(Ticket {
        id: Uuid::now_v7(),
        title: required_text("title", &input.title, TITLE_MAX_CHARS)?,
        description: limited_text("description", input.description.trim(), DESCRIPTION_MAX_CHARS)?,
        user_id: owner,
        image: None,
        created_at: Utc::now(),
        review_associated: false,
    })
}

pub async fn create_ticket(store: &dyn PostStore, owner: UserId, input: NewTicket) -> Result<Ticket> {
    let ticket = draft_ticket(owner, input)?;
    store.create_ticket(ticket.clone()).await?;
    log::info!("user {} created ticket {}", owner, ticket.id);
    Ok(ticket)
}

pub async fn get_ticket(store: &dyn PostStore, id: TicketId) -> Result<Ticket> {
    store
        .get_ticket(id)
        .await?
        .ok_or_else(|| AppError::NotFound("ticket", id.to_string()))
}

pub async fn edit_ticket(
    store: &dyn PostStore,
    actor: UserId,
    id: TicketId,
    update: TicketUpdate,
) -> Result<Ticket> {
    let mut ticket = get_ticket(store, id).await?;
    ensure_owner("ticket", ticket.user_id, actor)?;

    if let Some(title) = update.title {
        ticket.title = required_text("title", &title, TITLE_MAX_CHARS)?;
    }
    if let Some(description) = update.description {
        ticket.description = limited_text("description", description.trim(), DESCRIPTION_MAX_CHARS)?;
    }

    store.update_ticket(ticket.clone()).await?;
    Ok(ticket)
}

pub async fn delete_ticket(store: &dyn PostStore, actor: UserId, id: TicketId) -> Result<()> {
    let ticket = get_ticket(store, id).await?;
    ensure_owner("ticket", ticket.user_id, actor)?;
    store.delete_ticket(id).await?;
    log::info!("user {} deleted ticket {}", actor, id);
    Ok(())
}

/// Stores an uploaded picture and points the ticket at it.
pub async fn attach_image(
    store: &dyn PostStore,
    media: &dyn MediaStore,
    actor: UserId,
    id: TicketId,
    data: Vec<u8>,
    content_type: &str,
) -> Result<Ticket> {
    if !content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "unsupported content type {content_type}, expected an image"
        )));
    }
    if data.is_empty() {
        return Err(AppError::Validation("image upload is empty".into()));
    }

    let mut ticket = get_ticket(store, id).await?;
    ensure_owner("ticket", ticket.user_id, actor)?;

    let media_id = media.save_upload(data, content_type).await?;
    ticket.image = Some(media_id);
    store.update_ticket(ticket.clone()).await?;
    Ok(ticket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockMediaStore, MockPostStore};

    fn stored(owner: UserId) -> Ticket {
        draft_ticket(
            owner,
            NewTicket { title: "Dune".into(), description: "Frank Herbert".into() },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_trims_and_persists() {
        let mut store = MockPostStore::new();
        store
            .expect_create_ticket()
            .withf(|t| t.title == "Dune" && !t.review_associated)
            .times(1)
            .returning(|_| Ok(()));

        let owner = Uuid::now_v7();
        let input = NewTicket { title: "  Dune ".into(), description: String::new() };
        let ticket = create_ticket(&store, owner, input).await.unwrap();
        assert_eq!(ticket.user_id, owner);
        assert_eq!(ticket.image, None);
    }

    #[tokio::test]
    async fn create_rejects_blank_and_long_titles() {
        let store = MockPostStore::new();
        let owner = Uuid::now_v7();

        let blank = NewTicket { title: "   ".into(), description: String::new() };
        assert!(matches!(
            create_ticket(&store, owner, blank).await,
            Err(AppError::Validation(_))
        ));

        let long = NewTicket { title: "x".repeat(TITLE_MAX_CHARS + 1), description: String::new() };
        assert!(matches!(
            create_ticket(&store, owner, long).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn edit_by_someone_else_is_forbidden() {
        let owner = Uuid::now_v7();
        let ticket = stored(owner);
        let id = ticket.id;

        let mut store = MockPostStore::new();
        store.expect_get_ticket().returning(move |_| Ok(Some(ticket.clone())));
        store.expect_update_ticket().never();

        let update = TicketUpdate { title: Some("Other".into()), description: None };
        let err = edit_ticket(&store, Uuid::now_v7(), id, update).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn delete_missing_ticket_is_not_found() {
        let mut store = MockPostStore::new();
        store.expect_get_ticket().returning(|_| Ok(None));

        let err = delete_ticket(&store, Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("ticket", _)));
    }

    #[tokio::test]
    async fn attach_image_records_media_id() {
        let owner = Uuid::now_v7();
        let ticket = stored(owner);
        let id = ticket.id;

        let mut store = MockPostStore::new();
        store.expect_get_ticket().returning(move |_| Ok(Some(ticket.clone())));
        store
            .expect_update_ticket()
            .withf(|t| t.image.as_deref() == Some("abc123"))
            .times(1)
            .returning(|_| Ok(()));

        let mut media = MockMediaStore::new();
        media
            .expect_save_upload()
            .times(1)
            .returning(|_, _| Ok("abc123".to_string()));

        let updated = attach_image(&store, &media, owner, id, vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(updated.image.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn attach_image_rejects_non_images() {
        let store = MockPostStore::new();
        let media = MockMediaStore::new();
        let err = attach_image(&store, &media, Uuid::now_v7(), Uuid::now_v7(), vec![1], "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
