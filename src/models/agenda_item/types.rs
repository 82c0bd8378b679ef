use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ItemId = i64;

/// Publication status. Archival is tracked separately through `deleted_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Draft,
    Published,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Draft => "draft",
            ItemStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ItemStatus::Draft),
            "published" => Some(ItemStatus::Published),
            _ => None,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown agenda item status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl TryFrom<String> for ItemStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ItemStatus::parse(&value).ok_or(UnknownStatus(value))
    }
}

/// Agenda item as read by the admin listing.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgendaItem {
    pub id: ItemId,
    pub title: String,
    pub slug: String,
    pub city: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub visibility_type: String,
    #[sqlx(try_from = "String")]
    pub status: ItemStatus,
    pub updated_at: DateTime<Utc>,
    pub cover_url: Option<String>,
    pub alt_text: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Row data for inserting an item; the store assigns `id` and `updated_at`.
#[derive(Debug, Clone)]
pub struct NewAgendaItem {
    pub title: String,
    pub slug: String,
    pub city: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub visibility_type: String,
    pub status: ItemStatus,
    pub cover_url: Option<String>,
    pub alt_text: Option<String>,
}

impl NewAgendaItem {
    /// Near-duplicate of `source`: fresh slug token, " (Copy)" title, always a draft.
    pub fn copy_of(source: &AgendaItem, slug_token: &str) -> Self {
        NewAgendaItem {
            title: format!("{} (Copy)", source.title),
            slug: format!("{}-copy-{}", source.slug, slug_token),
            city: source.city.clone(),
            start_at: source.start_at,
            end_at: source.end_at,
            visibility_type: source.visibility_type.clone(),
            status: ItemStatus::Draft,
            cover_url: source.cover_url.clone(),
            alt_text: source.alt_text.clone(),
        }
    }
}

/// Random hex token appended to duplicated slugs.
pub fn slug_token() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 3] = rng.random();
    hex::encode(bytes)
}
