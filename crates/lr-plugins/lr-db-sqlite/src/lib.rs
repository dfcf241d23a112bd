//! # lr-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `lr-core` domain models.

mod schema;

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use lr_core::error::DuplicateEntry;
use lr_core::models::{
    Follow, FollowId, Review, ReviewId, Scope, Ticket, TicketId, User, UserId,
};
use lr_core::traits::PostStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

pub struct SqlitePostStore {
    pool: SqlitePool,
}

impl SqlitePostStore {
    /// Opens (creating if needed) the database at `url` and applies the schema.
    ///
    /// `sqlite::memory:` is pinned to one long-lived connection, every other
    /// connection would see its own empty database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid sqlite url {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        for statement in schema::STATEMENTS {
            sqlx::query(*statement).execute(&pool).await?;
        }
        log::info!("sqlite store ready at {}", url);

        Ok(Self { pool })
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

/// UNIQUE violations become [`DuplicateEntry`] so services can report a conflict.
fn insert_error(err: sqlx::Error, entity: &'static str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DuplicateEntry(entity).into(),
        _ => err.into(),
    }
}

fn uuid_column(row: &SqliteRow, column: &str) -> anyhow::Result<Uuid> {
    blob_to_uuid(&row.try_get::<Vec<u8>, _>(column)?)
}

fn user_from_row(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: uuid_column(row, "id")?,
        username: row.try_get("username")?,
        created_at: row.try_get("created_at")?,
    })
}

fn ticket_from_row(row: &SqliteRow) -> anyhow::Result<Ticket> {
    Ok(Ticket {
        id: uuid_column(row, "id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        user_id: uuid_column(row, "user_id")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
        review_associated: row.try_get("review_associated")?,
    })
}

fn review_from_row(row: &SqliteRow) -> anyhow::Result<Review> {
    let ticket_id = row
        .try_get::<Option<Vec<u8>>, _>("ticket_id")?
        .map(|blob| blob_to_uuid(&blob))
        .transpose()?;
    Ok(Review {
        id: uuid_column(row, "id")?,
        ticket_id,
        rating: u8::try_from(row.try_get::<i64, _>("rating")?)?,
        user_id: uuid_column(row, "user_id")?,
        headline: row.try_get("headline")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
        starred: row.try_get("starred")?,
        word_count: u32::try_from(row.try_get::<i64, _>("word_count")?)?,
    })
}

fn follow_from_row(row: &SqliteRow) -> anyhow::Result<Follow> {
    Ok(Follow {
        id: uuid_column(row, "id")?,
        user_id: uuid_column(row, "user_id")?,
        followed_user_id: uuid_column(row, "followed_user_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// WHERE fragment restricting `user_id` to the scope, and the user to bind.
fn scope_filter(scope: Scope) -> (&'static str, Option<Uuid>) {
    match scope {
        Scope::All => ("1 = 1", None),
        Scope::Owner(user) => ("user_id = ?", Some(user)),
        Scope::FollowedBy(user) => (
            "user_id IN (SELECT followed_user_id FROM user_follows WHERE user_id = ?)",
            Some(user),
        ),
    }
}

const INSERT_TICKET: &str = "INSERT INTO tickets (id, title, description, user_id, image, created_at, review_associated) VALUES (?, ?, ?, ?, ?, ?, ?)";
const INSERT_REVIEW: &str = "INSERT INTO reviews (id, ticket_id, rating, user_id, headline, body, created_at, starred, word_count) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

impl SqlitePostStore {
    async fn select_tickets(&self, scope: Scope, unreviewed_only: bool) -> anyhow::Result<Vec<Ticket>> {
        let (filter, user) = scope_filter(scope);
        let extra = if unreviewed_only { " AND review_associated = 0" } else { "" };
        let sql = format!("SELECT * FROM tickets WHERE {filter}{extra}");

        let mut query = sqlx::query(&sql);
        if let Some(user) = user {
            query = query.bind(uuid_to_blob(user));
        }
        query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(ticket_from_row)
            .collect()
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO users (id, username, created_at) VALUES (?, ?, ?)")
            .bind(uuid_to_blob(user.id))
            .bind(user.username)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|err| insert_error(err, "user"))?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> anyhow::Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn create_ticket(&self, ticket: Ticket) -> anyhow::Result<()> {
        sqlx::query(INSERT_TICKET)
            .bind(uuid_to_blob(ticket.id))
            .bind(ticket.title)
            .bind(ticket.description)
            .bind(uuid_to_blob(ticket.user_id))
            .bind(ticket.image)
            .bind(ticket.created_at)
            .bind(ticket.review_associated)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_ticket(&self, id: TicketId) -> anyhow::Result<Option<Ticket>> {
        sqlx::query("SELECT * FROM tickets WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(ticket_from_row)
            .transpose()
    }

    /// Writes the editable columns; `review_associated` is maintained by the
    /// review operations only.
    async fn update_ticket(&self, ticket: Ticket) -> anyhow::Result<()> {
        sqlx::query("UPDATE tickets SET title = ?, description = ?, image = ? WHERE id = ?")
            .bind(ticket.title)
            .bind(ticket.description)
            .bind(ticket.image)
            .bind(uuid_to_blob(ticket.id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_ticket(&self, id: TicketId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_tickets(&self, scope: Scope) -> anyhow::Result<Vec<Ticket>> {
        self.select_tickets(scope, false).await
    }

    async fn list_unreviewed_tickets(&self, scope: Scope) -> anyhow::Result<Vec<Ticket>> {
        self.select_tickets(scope, true).await
    }

    /// Inserting the review and flagging its ticket share one transaction, so
    /// the flag can never disagree with the reviews table.
    async fn create_review(&self, review: Review) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        // 1. Insert Review
        sqlx::query(INSERT_REVIEW)
            .bind(uuid_to_blob(review.id))
            .bind(review.ticket_id.map(uuid_to_blob))
            .bind(i64::from(review.rating))
            .bind(uuid_to_blob(review.user_id))
            .bind(review.headline)
            .bind(review.body)
            .bind(review.created_at)
            .bind(review.starred)
            .bind(i64::from(review.word_count))
            .execute(&mut *tx)
            .await?;

        // 2. Flag the ticket
        if let Some(ticket_id) = review.ticket_id {
            sqlx::query("UPDATE tickets SET review_associated = 1 WHERE id = ?")
                .bind(uuid_to_blob(ticket_id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Atomic operation to create a ticket and the review answering it.
    async fn create_ticket_with_review(&self, ticket: Ticket, review: Review) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        // 1. Insert Ticket, already flagged
        sqlx::query(INSERT_TICKET)
            .bind(uuid_to_blob(ticket.id))
            .bind(ticket.title)
            .bind(ticket.description)
            .bind(uuid_to_blob(ticket.user_id))
            .bind(ticket.image)
            .bind(ticket.created_at)
            .bind(true)
            .execute(&mut *tx)
            .await?;

        // 2. Insert Review
        sqlx::query(INSERT_REVIEW)
            .bind(uuid_to_blob(review.id))
            .bind(review.ticket_id.map(uuid_to_blob))
            .bind(i64::from(review.rating))
            .bind(uuid_to_blob(review.user_id))
            .bind(review.headline)
            .bind(review.body)
            .bind(review.created_at)
            .bind(review.starred)
            .bind(i64::from(review.word_count))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_review(&self, id: ReviewId) -> anyhow::Result<Option<Review>> {
        sqlx::query("SELECT * FROM reviews WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(review_from_row)
            .transpose()
    }

    async fn update_review(&self, review: Review) -> anyhow::Result<()> {
        sqlx::query("UPDATE reviews SET rating = ?, headline = ?, body = ?, starred = ?, word_count = ? WHERE id = ?")
            .bind(i64::from(review.rating))
            .bind(review.headline)
            .bind(review.body)
            .bind(review.starred)
            .bind(i64::from(review.word_count))
            .bind(uuid_to_blob(review.id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        let ticket_blob: Option<Option<Vec<u8>>> =
            sqlx::query_scalar("SELECT ticket_id FROM reviews WHERE id = ?")
                .bind(uuid_to_blob(id))
                .fetch_optional(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?;

        // Another review may still answer the same ticket.
        if let Some(ticket_blob) = ticket_blob.flatten() {
            sqlx::query(
                "UPDATE tickets SET review_associated = EXISTS (SELECT 1 FROM reviews WHERE ticket_id = ?) WHERE id = ?",
            )
            .bind(ticket_blob.clone())
            .bind(ticket_blob)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_reviews(&self, scope: Scope) -> anyhow::Result<Vec<Review>> {
        let (filter, user) = scope_filter(scope);
        let sql = format!("SELECT * FROM reviews WHERE {filter}");

        let mut query = sqlx::query(&sql);
        if let Some(user) = user {
            query = query.bind(uuid_to_blob(user));
        }
        query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(review_from_row)
            .collect()
    }

    async fn create_follow(&self, follow: Follow) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO user_follows (id, user_id, followed_user_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(follow.id))
            .bind(uuid_to_blob(follow.user_id))
            .bind(uuid_to_blob(follow.followed_user_id))
            .bind(follow.created_at)
            .execute(&self.pool)
            .await
            .map_err(|err| insert_error(err, "follow"))?;
        Ok(())
    }

    async fn get_follow(&self, id: FollowId) -> anyhow::Result<Option<Follow>> {
        sqlx::query("SELECT * FROM user_follows WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(follow_from_row)
            .transpose()
    }

    async fn delete_follow(&self, id: FollowId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM user_follows WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_following(&self, user: UserId, followed: UserId) -> anyhow::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM user_follows WHERE user_id = ? AND followed_user_id = ?",
        )
        .bind(uuid_to_blob(user))
        .bind(uuid_to_blob(followed))
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn list_following(&self, user: UserId) -> anyhow::Result<Vec<Follow>> {
        sqlx::query("SELECT * FROM user_follows WHERE user_id = ? ORDER BY created_at ASC")
            .bind(uuid_to_blob(user))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(follow_from_row)
            .collect()
    }

    async fn list_followers(&self, user: UserId) -> anyhow::Result<Vec<Follow>> {
        sqlx::query("SELECT * FROM user_follows WHERE followed_user_id = ? ORDER BY created_at ASC")
            .bind(uuid_to_blob(user))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(follow_from_row)
            .collect()
    }
}
