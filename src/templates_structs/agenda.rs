use askama::Template;
use chrono::{DateTime, Utc};

use crate::listing::{ListingSettings, ListingSnapshot, QueryState};
use crate::models::agenda_item::filter::keys;
use crate::models::agenda_item::{situation, AgendaItem, ItemStatus};
use crate::notify::Notification;

pub struct FlashView {
    pub title: String,
    pub description: String,
    pub destructive: bool,
}

impl From<Notification> for FlashView {
    fn from(n: Notification) -> Self {
        FlashView { destructive: n.is_destructive(), title: n.title, description: n.description }
    }
}

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Current filter values for re-populating the filter form.
pub struct FilterFormView {
    pub search: String,
    pub status_options: Vec<SelectOption>,
    pub visibility: String,
    pub city: String,
    pub date_start: String,
    pub date_end: String,
}

pub struct AgendaRowView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub city: String,
    pub window: String,
    pub visibility: String,
    pub status: String,
    pub is_published: bool,
    pub situation_label: String,
    pub situation_class: String,
    pub updated: String,
    pub edit_href: String,
}

#[derive(Template)]
#[template(path = "agenda/list.html")]
pub struct AgendaListTemplate {
    pub flash: Option<FlashView>,
    pub admin_path: String,
    /// Canonical query string, echoed back by every form on the page.
    pub return_query: String,
    pub retry_href: String,
    pub filters: FilterFormView,
    pub rows: Vec<AgendaRowView>,
    pub error: Option<String>,
    pub empty: bool,
    pub total_count: i64,
    pub page: i64,
    pub total_pages: i64,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

impl AgendaRowView {
    fn build(item: &AgendaItem, settings: &ListingSettings, now: DateTime<Utc>) -> Self {
        let badge = situation(item, now);
        AgendaRowView {
            id: item.id,
            title: item.title.clone(),
            slug: item.slug.clone(),
            city: item.city.clone().unwrap_or_else(|| "—".to_string()),
            window: format!("{} → {}", fmt_ts(&item.start_at), fmt_ts(&item.end_at)),
            visibility: item.visibility_type.clone(),
            status: item.status.as_str().to_string(),
            is_published: item.status == ItemStatus::Published,
            situation_label: badge.label().to_string(),
            situation_class: badge.css_class().to_string(),
            updated: fmt_ts(&item.updated_at),
            edit_href: settings.edit_path(item.id),
        }
    }
}

impl AgendaListTemplate {
    pub fn build(
        query: &QueryState,
        snapshot: &ListingSnapshot,
        settings: &ListingSettings,
        flash: Option<Notification>,
        now: DateTime<Utc>,
    ) -> Self {
        let admin_path = settings.admin_path.clone();
        let current_status = query.read(keys::STATUS, "all");
        let status_options = [("all", "All statuses"), ("draft", "Draft"), ("published", "Published")]
            .iter()
            .map(|(value, label)| SelectOption {
                value: value.to_string(),
                label: label.to_string(),
                selected: current_status == *value,
            })
            .collect();

        let prev_href = (snapshot.page > 1).then(|| query.with_page(snapshot.page - 1).href(&admin_path));
        let next_href =
            (snapshot.page < snapshot.total_pages).then(|| query.with_page(snapshot.page + 1).href(&admin_path));

        AgendaListTemplate {
            flash: flash.map(FlashView::from),
            return_query: query.to_query_string(),
            retry_href: query.href(&admin_path),
            filters: FilterFormView {
                search: query.read(keys::SEARCH, ""),
                status_options,
                visibility: query.read(keys::VISIBILITY, ""),
                city: query.read(keys::CITY, ""),
                date_start: query.read(keys::DATE_START, ""),
                date_end: query.read(keys::DATE_END, ""),
            },
            rows: snapshot.rows.iter().map(|r| AgendaRowView::build(r, settings, now)).collect(),
            error: snapshot.error().map(str::to_string),
            empty: snapshot.is_empty_result(),
            total_count: snapshot.total_count,
            page: snapshot.page,
            total_pages: snapshot.total_pages,
            prev_href,
            next_href,
            admin_path,
        }
    }
}
