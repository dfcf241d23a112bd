//! # Feed
//!
//! Merges posts from several sources into one reverse-chronological
//! sequence and cuts it into fixed-size pages.

use std::num::IntErrorKind;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Post, Review, Ticket};

/// Number of entries on a full page.
pub const PAGE_SIZE: usize = 6;

/// Minimal capability an entity needs to be placed on a timeline.
pub trait FeedEntry {
    fn created_at(&self) -> DateTime<Utc>;
    fn identity(&self) -> Uuid;
}

impl FeedEntry for Ticket {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn identity(&self) -> Uuid {
        self.id
    }
}

impl FeedEntry for Review {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn identity(&self) -> Uuid {
        self.id
    }
}

impl FeedEntry for Post {
    fn created_at(&self) -> DateTime<Utc> {
        match self {
            Post::Ticket(t) => t.created_at,
            Post::Review(r) => r.created_at,
        }
    }

    fn identity(&self) -> Uuid {
        match self {
            Post::Ticket(t) => t.id,
            Post::Review(r) => r.id,
        }
    }
}

/// One named collection feeding the timeline (e.g. "tickets", "reviews").
#[derive(Debug, Clone)]
pub struct FeedSource<T> {
    pub name: &'static str,
    pub entries: Vec<T>,
}

impl<T> FeedSource<T> {
    pub fn new(name: &'static str, entries: Vec<T>) -> Self {
        Self { name, entries }
    }
}

/// A page number as asked for by a client, before validation.
///
/// Anything that is not a positive integer resolves to the first page;
/// numbers past the end resolve to the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRequest {
    #[default]
    First,
    Number(u64),
}

impl PageRequest {
    /// Lenient parse of a raw `?page=` value.
    ///
    /// Integers too large for `u64` are still past the end, so they saturate.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return PageRequest::First;
        };
        match raw.parse::<u64>() {
            Ok(n) if n >= 1 => PageRequest::Number(n),
            Err(err) if *err.kind() == IntErrorKind::PosOverflow => PageRequest::Number(u64::MAX),
            _ => PageRequest::First,
        }
    }

    fn resolve(self, total_pages: usize) -> usize {
        match self {
            PageRequest::First => 1,
            PageRequest::Number(n) => usize::try_from(n).unwrap_or(usize::MAX).min(total_pages),
        }
    }
}

impl From<Option<u64>> for PageRequest {
    fn from(n: Option<u64>) -> Self {
        match n {
            Some(n) if n >= 1 => PageRequest::Number(n),
            _ => PageRequest::First,
        }
    }
}

/// One slice of a timeline plus what a caller needs to draw pager controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub entries: Vec<T>,
    /// 1-based index of this page
    pub number: usize,
    /// Never below 1, an empty feed has a single empty page
    pub total_pages: usize,
    pub total_entries: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            entries: self.entries.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_entries: self.total_entries,
        }
    }
}

/// Builds the requested page of the merged timeline.
///
/// Sources are concatenated without deduplication, sorted newest first
/// (equal timestamps fall back to the larger identity first) and sliced into
/// pages of [`PAGE_SIZE`].
pub fn build_feed<T, I>(sources: I, page_request: PageRequest) -> Page<T>
where
    T: FeedEntry,
    I: IntoIterator<Item = FeedSource<T>>,
{
    let mut merged: Vec<T> = Vec::new();
    for source in sources {
        log::debug!("feed source '{}' supplied {} entries", source.name, source.entries.len());
        merged.extend(source.entries);
    }

    merged.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.identity().cmp(&a.identity()))
    });

    let total_entries = merged.len();
    let total_pages = total_entries.div_ceil(PAGE_SIZE).max(1);
    let number = page_request.resolve(total_pages);

    let start = (number - 1) * PAGE_SIZE;
    let entries: Vec<T> = merged.into_iter().skip(start).take(PAGE_SIZE).collect();

    Page {
        entries,
        number,
        total_pages,
        total_entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()
    }

    fn ticket(minutes: i64) -> Ticket {
        Ticket {
            id: Uuid::now_v7(),
            title: format!("ticket {minutes}"),
            description: String::new(),
            user_id: Uuid::nil(),
            image: None,
            created_at: base() + Duration::minutes(minutes),
            review_associated: false,
        }
    }

    fn review(minutes: i64) -> Review {
        Review {
            id: Uuid::now_v7(),
            ticket_id: None,
            rating: 3,
            user_id: Uuid::nil(),
            headline: format!("review {minutes}"),
            body: String::new(),
            created_at: base() + Duration::minutes(minutes),
            starred: false,
            word_count: 0,
        }
    }

    fn mixed(tickets: Vec<Ticket>, reviews: Vec<Review>) -> Vec<FeedSource<Post>> {
        vec![
            FeedSource::new("tickets", tickets.into_iter().map(Post::from).collect()),
            FeedSource::new("reviews", reviews.into_iter().map(Post::from).collect()),
        ]
    }

    fn minutes_of(page: &Page<Post>) -> Vec<i64> {
        page.entries
            .iter()
            .map(|p| (p.created_at() - base()).num_minutes())
            .collect()
    }

    #[test]
    fn seven_tickets_split_over_two_pages() {
        let tickets: Vec<Ticket> = (1..=7).rev().map(ticket).collect();

        let first = build_feed(mixed(tickets.clone(), vec![]), PageRequest::Number(1));
        assert_eq!(minutes_of(&first), vec![7, 6, 5, 4, 3, 2]);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let second = build_feed(mixed(tickets, vec![]), PageRequest::Number(2));
        assert_eq!(minutes_of(&second), vec![1]);
        assert_eq!(second.total_pages, 2);
        assert!(second.has_previous());
        assert!(!second.has_next());
    }

    #[test]
    fn tickets_and_reviews_interleave_by_time() {
        let tickets = vec![ticket(1), ticket(4), ticket(5)];
        let reviews = vec![review(2), review(3), review(6)];

        let page = build_feed(mixed(tickets, reviews), PageRequest::First);
        assert_eq!(minutes_of(&page), vec![6, 5, 4, 3, 2, 1]);
        let kinds: Vec<&str> = page
            .entries
            .iter()
            .map(|p| match p {
                Post::Ticket(_) => "t",
                Post::Review(_) => "r",
            })
            .collect();
        assert_eq!(kinds, vec!["r", "t", "t", "r", "r", "t"]);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn empty_feed_is_a_single_empty_page() {
        let page = build_feed(mixed(vec![], vec![]), PageRequest::Number(1));
        assert!(page.entries.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_entries, 0);
        assert!(!page.has_next());
    }

    #[test]
    fn malformed_requests_fall_back_to_first_page() {
        let tickets: Vec<Ticket> = (1..=9).map(ticket).collect();
        let expected = build_feed(mixed(tickets.clone(), vec![]), PageRequest::Number(1));

        for raw in [None, Some("abc"), Some(""), Some("0"), Some("-3"), Some("2.5")] {
            let page = build_feed(mixed(tickets.clone(), vec![]), PageRequest::parse(raw));
            assert_eq!(page, expected, "raw page request {raw:?}");
        }
        assert_eq!(build_feed(mixed(tickets, vec![]), PageRequest::default()), expected);
    }

    #[test]
    fn oversized_requests_clamp_to_last_page() {
        let tickets: Vec<Ticket> = (1..=8).map(ticket).collect();
        let last = build_feed(mixed(tickets.clone(), vec![]), PageRequest::Number(2));

        assert_eq!(build_feed(mixed(tickets.clone(), vec![]), PageRequest::Number(999)), last);
        assert_eq!(build_feed(mixed(tickets.clone(), vec![]), PageRequest::Number(7)), last);
        assert_eq!(build_feed(mixed(tickets, vec![]), PageRequest::Number(u64::MAX)), last);
        assert_eq!(last.number, 2);
    }

    #[test]
    fn integers_beyond_u64_clamp_to_last_page() {
        let tickets: Vec<Ticket> = (1..=7).map(ticket).collect();
        let last = build_feed(mixed(tickets.clone(), vec![]), PageRequest::Number(2));

        let huge = PageRequest::parse(Some("99999999999999999999999"));
        assert_eq!(huge, PageRequest::Number(u64::MAX));
        assert_eq!(build_feed(mixed(tickets, vec![]), huge), last);
        assert_eq!(PageRequest::parse(Some("+99999999999999999999999")), PageRequest::Number(u64::MAX));
        assert_eq!(PageRequest::parse(Some("-99999999999999999999999")), PageRequest::First);
    }

    #[test]
    fn parse_accepts_padded_numbers() {
        assert_eq!(PageRequest::parse(Some(" 3 ")), PageRequest::Number(3));
        assert_eq!(PageRequest::from(Some(0)), PageRequest::First);
        assert_eq!(PageRequest::from(Some(4)), PageRequest::Number(4));
    }

    #[test]
    fn every_page_is_ordered_and_bounded() {
        let tickets: Vec<Ticket> = [5, 17, 3, 9, 22, 1, 14].into_iter().map(ticket).collect();
        let reviews: Vec<Review> = [8, 2, 30, 11, 19, 4, 26, 13].into_iter().map(review).collect();
        let total = tickets.len() + reviews.len();

        let first = build_feed(mixed(tickets.clone(), reviews.clone()), PageRequest::First);
        assert_eq!(first.total_pages, total.div_ceil(PAGE_SIZE));
        assert_eq!(first.total_entries, total);

        let mut seen = 0;
        for n in 1..=first.total_pages as u64 {
            let page = build_feed(mixed(tickets.clone(), reviews.clone()), PageRequest::Number(n));
            assert!(!page.entries.is_empty() && page.entries.len() <= PAGE_SIZE);
            assert!(page
                .entries
                .windows(2)
                .all(|w| w[0].created_at() >= w[1].created_at()));
            seen += page.entries.len();
        }
        assert_eq!(seen, total);
    }

    #[test]
    fn equal_timestamps_order_by_identity() {
        let mut a = ticket(1);
        let mut b = review(1);
        a.id = Uuid::from_u128(1);
        b.id = Uuid::from_u128(2);

        let page = build_feed(mixed(vec![a], vec![b]), PageRequest::First);
        let ids: Vec<Uuid> = page.entries.iter().map(FeedEntry::identity).collect();
        assert_eq!(ids, vec![Uuid::from_u128(2), Uuid::from_u128(1)]);
    }

    #[test]
    fn duplicates_across_sources_are_kept() {
        let t = ticket(1);
        let sources = vec![
            FeedSource::new("first", vec![t.clone()]),
            FeedSource::new("second", vec![t]),
        ];
        let page = build_feed(sources, PageRequest::First);
        assert_eq!(page.entries.len(), 2);
    }
}
