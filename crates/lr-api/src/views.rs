//! JSON shapes returned to clients.
//!
//! Every post is sent with a human "posted" label and, for tickets with a
//! picture, the public image URL.

use chrono::{DateTime, Utc};
use lr_core::feed::{FeedEntry, Page};
use lr_core::models::{Post, Review, Ticket};
use lr_core::services::display::posted_at_display;
use lr_core::traits::MediaStore;
use serde::Serialize;

pub trait ImageRef {
    fn image(&self) -> Option<&str>;
}

impl ImageRef for Ticket {
    fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

impl ImageRef for Review {
    fn image(&self) -> Option<&str> {
        None
    }
}

impl ImageRef for Post {
    fn image(&self) -> Option<&str> {
        match self {
            Post::Ticket(t) => t.image(),
            Post::Review(r) => r.image(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryView<T> {
    #[serde(flatten)]
    pub item: T,
    pub posted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl<T: FeedEntry + ImageRef> EntryView<T> {
    pub fn new(item: T, media: &dyn MediaStore, now: DateTime<Utc>) -> Self {
        Self {
            posted: posted_at_display(item.created_at(), now),
            image_url: item.image().map(|id| media.get_url(id)),
            item,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageView<T> {
    pub entries: Vec<EntryView<T>>,
    pub page: usize,
    pub total_pages: usize,
    pub total_entries: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T: FeedEntry + ImageRef> PageView<T> {
    pub fn new(page: Page<T>, media: &dyn MediaStore) -> Self {
        let now = Utc::now();
        let has_previous = page.has_previous();
        let has_next = page.has_next();
        let page = page.map(|item| EntryView::new(item, media, now));
        Self {
            entries: page.entries,
            page: page.number,
            total_pages: page.total_pages,
            total_entries: page.total_entries,
            has_previous,
            has_next,
        }
    }
}
