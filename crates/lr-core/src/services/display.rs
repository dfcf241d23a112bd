use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Human label for when a post was published, relative to `now`.
pub fn posted_at_display(posted_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds_ago = (now - posted_at).num_seconds().max(0);
    if seconds_ago <= HOUR {
        format!("Published {} minutes ago.", seconds_ago / MINUTE)
    } else if seconds_ago <= DAY {
        format!("Published {} hours ago.", seconds_ago / HOUR)
    } else {
        format!("Published on {}", posted_at.format("%d %b %y at %Hh%M"))
    }
}
