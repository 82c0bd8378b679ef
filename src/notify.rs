use actix_session::Session;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Default,
    Destructive,
}

/// User-visible, fire-and-forget message about the outcome of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notification { title: title.into(), description: description.into(), variant: Variant::Default }
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notification { title: title.into(), description: description.into(), variant: Variant::Destructive }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == Variant::Destructive
    }
}

pub trait Notifier {
    fn notify(&self, notification: Notification);
}

const FLASH_KEY: &str = "flash";

/// Stores the notification in the session; the next rendered page shows it.
pub struct FlashNotifier {
    session: Session,
}

impl FlashNotifier {
    pub fn new(session: Session) -> Self {
        FlashNotifier { session }
    }
}

impl Notifier for FlashNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.session.insert(FLASH_KEY, &notification);
    }
}

/// Remove and return the pending flash notification, if any.
pub fn take_flash(session: &Session) -> Option<Notification> {
    let flash = session.get::<Notification>(FLASH_KEY).unwrap_or(None);
    if flash.is_some() {
        session.remove(FLASH_KEY);
    }
    flash
}

/// Writes notifications to the log. Used where no user is attached (JSON API).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: Notification) {
        match n.variant {
            Variant::Default => log::info!("{}: {}", n.title, n.description),
            Variant::Destructive => log::warn!("{}: {}", n.title, n.description),
        }
    }
}
