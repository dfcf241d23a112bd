//! Request extractors: the acting user and the lenient page parameter.

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use lr_core::error::AppError;
use lr_core::feed::PageRequest;
use lr_core::models::User;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::AppState;

/// Header carrying the authenticated user's id, set by the fronting proxy.
pub const USER_HEADER: &str = "X-User-Id";

/// The user a request acts as. Resolving it requires the header to name an
/// existing user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let header = req
            .headers()
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::Store(anyhow::anyhow!("application state not configured")))?;
            let raw = header
                .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_HEADER} header")))?;
            let id = Uuid::parse_str(raw.trim())
                .map_err(|_| AppError::Unauthorized(format!("malformed {USER_HEADER} header")))?;

            let user = state
                .store
                .get_user(id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::Unauthorized("unknown user".into()))?;
            Ok::<_, ApiError>(CurrentUser(user))
        })
    }
}

/// `?page=` as sent; any string is accepted and normalised later.
///
/// A repeated key keeps its last value. A query string that does not decode
/// counts as no page at all.
#[derive(Debug, Default)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl FromRequest for PageQuery {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let page = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
            .ok()
            .and_then(|pairs| {
                pairs
                    .into_inner()
                    .into_iter()
                    .rev()
                    .find(|(key, _)| key == "page")
                    .map(|(_, value)| value)
            });
        ready(Ok(PageQuery { page }))
    }
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}
