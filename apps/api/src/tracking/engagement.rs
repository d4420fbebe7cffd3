//! Engagement merge rules for heartbeat and beacon updates.
//!
//! Updates can arrive out of order (a late heartbeat after the unload beacon), so
//! every metric is merged monotonically: stored values never decrease.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::models::visit::SectionViews;

/// Time on page is capped so a tab left open overnight does not skew averages.
pub const MAX_TIME_ON_PAGE_SECS: i32 = 4 * 60 * 60;
/// Visits older than this no longer accept updates.
pub const UPDATE_WINDOW_HOURS: i64 = 24;

/// Body of a heartbeat PATCH or a beacon POST. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngagementUpdate {
    pub time_on_page_secs: Option<i64>,
    pub max_scroll_depth: Option<i64>,
    pub sections: Option<SectionViews>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engagement {
    pub time_on_page_secs: i32,
    pub max_scroll_depth: i16,
    pub sections: SectionViews,
}

pub fn merge_engagement(stored: Engagement, update: &EngagementUpdate) -> Engagement {
    let time_on_page_secs = match update.time_on_page_secs {
        Some(t) => {
            let incoming = t.clamp(0, MAX_TIME_ON_PAGE_SECS as i64) as i32;
            stored.time_on_page_secs.max(incoming)
        }
        None => stored.time_on_page_secs,
    }
    .min(MAX_TIME_ON_PAGE_SECS);

    let max_scroll_depth = match update.max_scroll_depth {
        Some(d) => stored.max_scroll_depth.max(d.clamp(0, 100) as i16),
        None => stored.max_scroll_depth,
    };

    let sections = match update.sections {
        Some(incoming) => stored.sections.union(incoming),
        None => stored.sections,
    };

    Engagement {
        time_on_page_secs,
        max_scroll_depth,
        sections,
    }
}

pub fn is_frozen(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - created_at > Duration::hours(UPDATE_WINDOW_HOURS)
}
