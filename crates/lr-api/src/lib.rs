//! # lr-api
//!
//! The web routing and orchestration layer for LitReview.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod views;

pub use handlers::AppState;

use actix_web::{web, HttpRequest};
use lr_core::error::AppError;

use crate::error::ApiError;

/// Configures the routes for the review site.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(extractor_errors::json())
        .app_data(extractor_errors::path())
        .app_data(extractor_errors::query());

    cfg.service(
        web::scope("")
            .route("/", web::get().to(handlers::index))
            // Users and the follow graph
            .route("/users", web::post().to(handlers::register_user))
            .route("/users/{user_id}/feed", web::get().to(handlers::user_feed))
            .route("/follows", web::get().to(handlers::list_follows))
            .route("/follows", web::post().to(handlers::follow))
            .route("/follows/{follow_id}", web::delete().to(handlers::unfollow))
            // Mixed timelines
            .route("/feed", web::get().to(handlers::global_feed))
            .route("/feed/me", web::get().to(handlers::own_feed))
            .route("/feed/following", web::get().to(handlers::followed_feed))
            // Tickets ("unreviewed" must be matched before "{ticket_id}")
            .route("/tickets", web::get().to(handlers::ticket_feed))
            .route("/tickets", web::post().to(handlers::create_ticket))
            .route("/tickets/unreviewed", web::get().to(handlers::unreviewed_ticket_feed))
            .route("/tickets/{ticket_id}", web::get().to(handlers::view_ticket))
            .route("/tickets/{ticket_id}", web::put().to(handlers::edit_ticket))
            .route("/tickets/{ticket_id}", web::delete().to(handlers::delete_ticket))
            .route("/tickets/{ticket_id}/image", web::post().to(handlers::upload_ticket_image))
            .route("/tickets/{ticket_id}/reviews", web::post().to(handlers::create_review_on_ticket))
            // Reviews
            .route("/reviews", web::get().to(handlers::review_feed))
            .route("/reviews", web::post().to(handlers::create_review_with_ticket))
            .route("/reviews/{review_id}", web::get().to(handlers::view_review))
            .route("/reviews/{review_id}", web::put().to(handlers::edit_review))
            .route("/reviews/{review_id}", web::delete().to(handlers::delete_review)),
    );
}

/// Rejections from actix's built-in extractors, reported in the same JSON
/// shape as every other error.
mod extractor_errors {
    use super::*;

    pub fn json() -> web::JsonConfig {
        web::JsonConfig::default().error_handler(|err, _req| {
            ApiError(AppError::Validation(format!("malformed JSON body: {err}"))).into()
        })
    }

    /// Path segments are ids, one that does not parse names nothing.
    pub fn path() -> web::PathConfig {
        web::PathConfig::default().error_handler(|err, req: &HttpRequest| {
            log::debug!("unparseable path {}: {}", req.path(), err);
            ApiError(AppError::NotFound("resource", req.path().to_string())).into()
        })
    }

    pub fn query() -> web::QueryConfig {
        web::QueryConfig::default().error_handler(|err, _req| {
            ApiError(AppError::Validation(format!("malformed query string: {err}"))).into()
        })
    }
}
