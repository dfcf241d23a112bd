//! Feed variants. They only differ in which store queries supply the
//! sources; merging and paging is always [`build_feed`].

use crate::error::Result;
use crate::feed::{build_feed, FeedSource, Page, PageRequest};
use crate::models::{Post, Review, Scope, Ticket, UserId};
use crate::traits::PostStore;

/// Tickets and reviews matching `scope`, merged.
pub async fn posts(store: &dyn PostStore, scope: Scope, page: PageRequest) -> Result<Page<Post>> {
    let tickets = store.list_tickets(scope).await?;
    let reviews = store.list_reviews(scope).await?;

    let sources = [
        FeedSource::new("tickets", tickets.into_iter().map(Post::from).collect()),
        FeedSource::new("reviews", reviews.into_iter().map(Post::from).collect()),
    ];
    Ok(build_feed(sources, page))
}

/// Everything posted by anyone.
pub async fn global_feed(store: &dyn PostStore, page: PageRequest) -> Result<Page<Post>> {
    posts(store, Scope::All, page).await
}

/// The requesting user's own posts.
pub async fn own_feed(store: &dyn PostStore, user: UserId, page: PageRequest) -> Result<Page<Post>> {
    posts(store, Scope::Owner(user), page).await
}

/// Posts of every user `user` follows.
pub async fn followed_feed(store: &dyn PostStore, user: UserId, page: PageRequest) -> Result<Page<Post>> {
    posts(store, Scope::FollowedBy(user), page).await
}

pub async fn ticket_feed(store: &dyn PostStore, page: PageRequest) -> Result<Page<Ticket>> {
    let tickets = store.list_tickets(Scope::All).await?;
    Ok(build_feed([FeedSource::new("tickets", tickets)], page))
}

/// Tickets still waiting for a review.
pub async fn unreviewed_ticket_feed(store: &dyn PostStore, page: PageRequest) -> Result<Page<Ticket>> {
    let tickets = store.list_unreviewed_tickets(Scope::All).await?;
    Ok(build_feed([FeedSource::new("unreviewed tickets", tickets)], page))
}

pub async fn review_feed(store: &dyn PostStore, page: PageRequest) -> Result<Page<Review>> {
    let reviews = store.list_reviews(Scope::All).await?;
    Ok(build_feed([FeedSource::new("reviews", reviews)], page))
}
