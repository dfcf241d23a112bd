//! # lr-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core services.

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use lr_core::error::AppError;
use lr_core::services::tickets::{NewTicket, TicketUpdate};
use lr_core::services::reviews::{NewReview, ReviewUpdate};
use lr_core::services::{follows, reviews, tickets, timeline};
use lr_core::traits::{MediaStore, PostStore};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{CurrentUser, PageQuery};
use crate::views::{EntryView, PageView};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub store: Box<dyn PostStore>,
    pub media: Box<dyn MediaStore>,
    /// Largest accepted image upload, in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct UsernameBody {
    pub username: String,
}

/// Ticket and review submitted together.
#[derive(Debug, Deserialize)]
pub struct TicketWithReviewBody {
    pub ticket: NewTicket,
    pub review: NewReview,
}

// ── Users & follows ──────────────────────────────────────────────────────────

pub async fn register_user(
    data: web::Data<AppState>,
    body: web::Json<UsernameBody>,
) -> ApiResult<HttpResponse> {
    let user = follows::register_user(data.store.as_ref(), &body.username).await?;
    Ok(HttpResponse::Created().json(user))
}

pub async fn list_follows(data: web::Data<AppState>, user: CurrentUser) -> ApiResult<HttpResponse> {
    let subscriptions = follows::subscriptions(data.store.as_ref(), user.0.id).await?;
    Ok(HttpResponse::Ok().json(subscriptions))
}

pub async fn follow(
    data: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<UsernameBody>,
) -> ApiResult<HttpResponse> {
    let edge = follows::follow_user(data.store.as_ref(), user.0.id, &body.username).await?;
    Ok(HttpResponse::Created().json(edge))
}

pub async fn unfollow(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    follows::unfollow(data.store.as_ref(), user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ── Feeds ────────────────────────────────────────────────────────────────────

pub async fn global_feed(
    data: web::Data<AppState>,
    _user: CurrentUser,
    query: PageQuery,
) -> ApiResult<HttpResponse> {
    let page = timeline::global_feed(data.store.as_ref(), query.request()).await?;
    Ok(HttpResponse::Ok().json(PageView::new(page, data.media.as_ref())))
}

pub async fn own_feed(
    data: web::Data<AppState>,
    user: CurrentUser,
    query: PageQuery,
) -> ApiResult<HttpResponse> {
    let page = timeline::own_feed(data.store.as_ref(), user.0.id, query.request()).await?;
    Ok(HttpResponse::Ok().json(PageView::new(page, data.media.as_ref())))
}

pub async fn followed_feed(
    data: web::Data<AppState>,
    user: CurrentUser,
    query: PageQuery,
) -> ApiResult<HttpResponse> {
    let page = timeline::followed_feed(data.store.as_ref(), user.0.id, query.request()).await?;
    Ok(HttpResponse::Ok().json(PageView::new(page, data.media.as_ref())))
}

/// Posts of one given user (e.g. someone being followed).
pub async fn user_feed(
    data: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
    query: PageQuery,
) -> ApiResult<HttpResponse> {
    let owner = follows::get_user(data.store.as_ref(), path.into_inner()).await?;
    let page = timeline::own_feed(data.store.as_ref(), owner.id, query.request()).await?;
    Ok(HttpResponse::Ok().json(PageView::new(page, data.media.as_ref())))
}

pub async fn ticket_feed(
    data: web::Data<AppState>,
    _user: CurrentUser,
    query: PageQuery,
) -> ApiResult<HttpResponse> {
    let page = timeline::ticket_feed(data.store.as_ref(), query.request()).await?;
    Ok(HttpResponse::Ok().json(PageView::new(page, data.media.as_ref())))
}

pub async fn unreviewed_ticket_feed(
    data: web::Data<AppState>,
    _user: CurrentUser,
    query: PageQuery,
) -> ApiResult<HttpResponse> {
    let page = timeline::unreviewed_ticket_feed(data.store.as_ref(), query.request()).await?;
    Ok(HttpResponse::Ok().json(PageView::new(page, data.media.as_ref())))
}

pub async fn review_feed(
    data: web::Data<AppState>,
    _user: CurrentUser,
    query: PageQuery,
) -> ApiResult<HttpResponse> {
    let page = timeline::review_feed(data.store.as_ref(), query.request()).await?;
    Ok(HttpResponse::Ok().json(PageView::new(page, data.media.as_ref())))
}

// ── Tickets ──────────────────────────────────────────────────────────────────

pub async fn create_ticket(
    data: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<NewTicket>,
) -> ApiResult<HttpResponse> {
    let ticket = tickets::create_ticket(data.store.as_ref(), user.0.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(EntryView::new(ticket, data.media.as_ref(), Utc::now())))
}

pub async fn view_ticket(
    data: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let ticket = tickets::get_ticket(data.store.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(EntryView::new(ticket, data.media.as_ref(), Utc::now())))
}

pub async fn edit_ticket(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<TicketUpdate>,
) -> ApiResult<HttpResponse> {
    let ticket = tickets::edit_ticket(
        data.store.as_ref(),
        user.0.id,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(EntryView::new(ticket, data.media.as_ref(), Utc::now())))
}

pub async fn delete_ticket(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    tickets::delete_ticket(data.store.as_ref(), user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Accepts a multipart form whose `image` field holds the picture.
pub async fn upload_ticket_image(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    mut payload: Multipart,
) -> ApiResult<HttpResponse> {
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(mut field) = payload.try_next().await.map_err(malformed_upload)? {
        if field.name() != "image" {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed_upload)? {
            if bytes.len() + chunk.len() > data.max_upload_bytes {
                return Err(AppError::TooLarge(format!(
                    "image exceeds {} bytes",
                    data.max_upload_bytes
                ))
                .into());
            }
            bytes.extend_from_slice(&chunk);
        }
        upload = Some((bytes, content_type));
    }

    let (bytes, content_type) =
        upload.ok_or_else(|| AppError::Validation("missing 'image' form field".into()))?;
    let ticket = tickets::attach_image(
        data.store.as_ref(),
        data.media.as_ref(),
        user.0.id,
        path.into_inner(),
        bytes,
        &content_type,
    )
    .await?;
    Ok(HttpResponse::Ok().json(EntryView::new(ticket, data.media.as_ref(), Utc::now())))
}

fn malformed_upload(err: actix_multipart::MultipartError) -> AppError {
    AppError::Validation(format!("malformed upload: {err}"))
}

// ── Reviews ──────────────────────────────────────────────────────────────────

pub async fn create_review_with_ticket(
    data: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<TicketWithReviewBody>,
) -> ApiResult<HttpResponse> {
    let TicketWithReviewBody { ticket, review } = body.into_inner();
    let (ticket, review) =
        reviews::create_review_with_ticket(data.store.as_ref(), user.0.id, ticket, review).await?;

    let now = Utc::now();
    Ok(HttpResponse::Created().json(json!({
        "ticket": EntryView::new(ticket, data.media.as_ref(), now),
        "review": EntryView::new(review, data.media.as_ref(), now),
    })))
}

pub async fn create_review_on_ticket(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<NewReview>,
) -> ApiResult<HttpResponse> {
    let review = reviews::create_review_on_ticket(
        data.store.as_ref(),
        user.0.id,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(EntryView::new(review, data.media.as_ref(), Utc::now())))
}

pub async fn view_review(
    data: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let review = reviews::get_review(data.store.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(EntryView::new(review, data.media.as_ref(), Utc::now())))
}

pub async fn edit_review(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<ReviewUpdate>,
) -> ApiResult<HttpResponse> {
    let review = reviews::edit_review(
        data.store.as_ref(),
        user.0.id,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(EntryView::new(review, data.media.as_ref(), Utc::now())))
}

pub async fn delete_review(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    reviews::delete_review(data.store.as_ref(), user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Liveness probe.
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "service": "litreview", "status": "ok" }))
}
