use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::listing::{ActionOutcome, BulkAction};
use crate::models::agenda_item::{situation, AgendaItem, ItemStatus, Situation};

/// Generic paginated response wrapper for API endpoints.
#[derive(Serialize, Debug, Clone)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Agenda item for API responses, with its situational badge.
#[derive(Serialize, Debug, Clone)]
pub struct ApiAgendaItem {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub city: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub visibility_type: String,
    pub status: ItemStatus,
    pub situation: Situation,
    pub updated_at: DateTime<Utc>,
    pub cover_url: Option<String>,
    pub alt_text: Option<String>,
}

impl ApiAgendaItem {
    pub fn from_item(item: AgendaItem, now: DateTime<Utc>) -> Self {
        let badge = situation(&item, now);
        ApiAgendaItem {
            id: item.id,
            title: item.title,
            slug: item.slug,
            city: item.city,
            start_at: item.start_at,
            end_at: item.end_at,
            visibility_type: item.visibility_type,
            status: item.status,
            situation: badge,
            updated_at: item.updated_at,
            cover_url: item.cover_url,
            alt_text: item.alt_text,
        }
    }
}

/// Bulk request: ids are only acted on if they are on the page described by `query`.
#[derive(Deserialize, Debug)]
pub struct ApiBulkRequest {
    pub action: BulkAction,
    pub ids: Vec<i64>,
    #[serde(default)]
    pub query: String,
}

#[derive(Serialize, Debug, Default)]
pub struct ApiActionResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<ActionOutcome> for ApiActionResponse {
    fn from(outcome: ActionOutcome) -> Self {
        match outcome {
            ActionOutcome::Updated { affected } => {
                ApiActionResponse { outcome: "updated", affected: Some(affected), ..Default::default() }
            }
            ActionOutcome::Duplicated { new_id } => {
                ApiActionResponse { outcome: "duplicated", new_id: Some(new_id), ..Default::default() }
            }
            ActionOutcome::Navigate(path) => {
                ApiActionResponse { outcome: "navigate", location: Some(path), ..Default::default() }
            }
            ActionOutcome::OpenExternal(url) => {
                ApiActionResponse { outcome: "open_external", location: Some(url), ..Default::default() }
            }
        }
    }
}

/// API error response.
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
