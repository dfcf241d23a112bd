//! Table definitions, applied idempotently on pool start.

pub(crate) const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id          BLOB PRIMARY KEY NOT NULL,
        username    TEXT NOT NULL UNIQUE,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tickets (
        id                 BLOB PRIMARY KEY NOT NULL,
        title              TEXT NOT NULL,
        description        TEXT NOT NULL DEFAULT '',
        user_id            BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        image              TEXT,
        created_at         TEXT NOT NULL,
        review_associated  BOOLEAN NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        id          BLOB PRIMARY KEY NOT NULL,
        ticket_id   BLOB REFERENCES tickets(id) ON DELETE CASCADE,
        rating      INTEGER NOT NULL CHECK (rating BETWEEN 0 AND 5),
        user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        headline    TEXT NOT NULL,
        body        TEXT NOT NULL DEFAULT '',
        created_at  TEXT NOT NULL,
        starred     BOOLEAN NOT NULL DEFAULT 0,
        word_count  INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS user_follows (
        id                BLOB PRIMARY KEY NOT NULL,
        user_id           BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        followed_user_id  BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at        TEXT NOT NULL,
        UNIQUE (user_id, followed_user_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_tickets_user ON tickets(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_ticket ON reviews(ticket_id)",
];
