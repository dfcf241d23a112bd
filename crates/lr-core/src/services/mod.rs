//! # Services
//!
//! Use cases on top of the ports. Handlers stay thin and call in here with
//! the acting user and the already-deserialized input.

pub mod display;
pub mod follows;
pub mod reviews;
pub mod tickets;
pub mod timeline;

use crate::error::{AppError, Result};
use crate::models::UserId;

pub const TITLE_MAX_CHARS: usize = 128;
pub const DESCRIPTION_MAX_CHARS: usize = 2048;
pub const HEADLINE_MAX_CHARS: usize = 128;
pub const BODY_MAX_CHARS: usize = 8192;
pub const USERNAME_MAX_CHARS: usize = 150;

/// Trims `value` and checks it is non-empty and within `max` characters.
fn required_text(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    limited_text(field, value, max)
}

fn limited_text(field: &str, value: &str, max: usize) -> Result<String> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

fn ensure_owner(kind: &str, owner: UserId, actor: UserId) -> Result<()> {
    if owner != actor {
        return Err(AppError::Forbidden(format!("{kind} belongs to another user")));
    }
    Ok(())
}
