use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;

use super::{Ad, FeedItem, TimeSeparator, TimeTerm};
use crate::domain::post::Post;

const AD_LINK: &str = "https://netology.ru";
const AD_IMAGE: &str = "figma.jpg";

/// Turns the raw cached window (already newest-first) into the displayable
/// item list: ownership annotation, one time separator per calendar-day
/// bucket transition, one ad after every `ad_every`-th post.
///
/// Assembly is a pure function of the window passed in; nothing is patched
/// incrementally.
pub struct FeedAssembler {
    ad_every: usize,
    ad_seq: AtomicI64,
}

impl FeedAssembler {
    pub fn new(ad_every: usize) -> Self {
        // Ads live in negative id space, so synthetic ids cannot collide with
        // server-assigned post ids or with each other.
        let seed: i64 = rand::thread_rng().gen_range(i64::MIN / 2..-1_000_000_000);
        Self {
            ad_every,
            ad_seq: AtomicI64::new(seed),
        }
    }

    pub fn assemble(
        &self,
        posts: Vec<Post>,
        now: DateTime<Utc>,
        user_id: Option<i64>,
    ) -> Vec<FeedItem> {
        let mut items = Vec::with_capacity(posts.len() + 4);
        let mut last_term = None;

        for mut post in posts {
            post.owned_by_me = user_id == Some(post.author_id);
            let term = time_term(post.published, now);
            if last_term != Some(term) {
                items.push(FeedItem::TimeSeparator(TimeSeparator { term }));
                last_term = Some(term);
            }
            items.push(FeedItem::Post(post));
        }

        self.intersperse_ads(items)
    }

    fn intersperse_ads(&self, items: Vec<FeedItem>) -> Vec<FeedItem> {
        if self.ad_every == 0 {
            return items;
        }

        let mut out = Vec::with_capacity(items.len() + items.len() / self.ad_every);
        let mut posts_seen = 0usize;
        for item in items {
            let is_post = matches!(item, FeedItem::Post(_));
            out.push(item);
            if is_post {
                posts_seen += 1;
                // Separators do not count toward ad cadence.
                if posts_seen % self.ad_every == 0 {
                    out.push(FeedItem::Ad(self.next_ad()));
                }
            }
        }
        out
    }

    fn next_ad(&self) -> Ad {
        Ad {
            id: self.ad_seq.fetch_add(1, Ordering::Relaxed),
            url: AD_LINK.to_string(),
            image: AD_IMAGE.to_string(),
        }
    }
}

/// Calendar-day bucketing: same `(year, day-of-year)` as `now` is today, the
/// day before is yesterday, everything else is long ago. Deliberately not an
/// elapsed-seconds comparison, which disagrees near midnight.
pub fn time_term(published: DateTime<Utc>, now: DateTime<Utc>) -> TimeTerm {
    let day = |t: DateTime<Utc>| (t.year(), t.ordinal());
    if day(published) == day(now) {
        TimeTerm::Today
    } else if day(published) == day(now - Duration::days(1)) {
        TimeTerm::Yesterday
    } else {
        TimeTerm::LongAgo
    }
}
