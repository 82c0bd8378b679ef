use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::{AgendaItem, ItemStatus};

/// Situational badge shown next to each row. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Situation {
    Expired,
    Active,
    Scheduled,
    Incomplete,
    Draft,
}

impl Situation {
    pub fn label(&self) -> &'static str {
        match self {
            Situation::Expired => "Expired",
            Situation::Active => "Active",
            Situation::Scheduled => "Scheduled",
            Situation::Incomplete => "Incomplete",
            Situation::Draft => "Draft",
        }
    }

    /// CSS modifier used by the listing template.
    pub fn css_class(&self) -> &'static str {
        match self {
            Situation::Expired => "badge-muted",
            Situation::Active => "badge-success",
            Situation::Scheduled => "badge-info",
            Situation::Incomplete => "badge-warning",
            Situation::Draft => "badge-neutral",
        }
    }
}

/// Time checks only apply to published items and take priority over
/// completeness; the order of the checks is significant.
pub fn situation(item: &AgendaItem, now: DateTime<Utc>) -> Situation {
    if item.status == ItemStatus::Published {
        if item.end_at < now {
            return Situation::Expired;
        }
        if item.start_at <= now && now <= item.end_at {
            return Situation::Active;
        }
        if item.start_at > now {
            return Situation::Scheduled;
        }
    }
    if is_missing(&item.city) || is_missing(&item.cover_url) || is_missing(&item.alt_text) {
        return Situation::Incomplete;
    }
    Situation::Draft
}

fn is_missing(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).is_none_or(str::is_empty)
}
