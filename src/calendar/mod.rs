//! Task lists (CalDAV calendars)

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use bitflags::bitflags;

bitflags! {
    #[derive(Serialize, Deserialize)]
    pub struct SupportedComponents: u8 {
        /// An event, such as a calendar meeting
        const EVENT = 1;
        /// A to-do item, such as a reminder
        const TODO = 2;
    }
}

impl SupportedComponents {
    /// Build flags from component names (`VEVENT`, `VTODO`...). Unknown names are ignored
    pub fn from_names<'a, I: IntoIterator<Item = &'a str>>(names: I) -> Self {
        let mut flags = Self::empty();
        for name in names {
            match name.trim().to_ascii_uppercase().as_str() {
                "VEVENT" => flags.insert(Self::EVENT),
                "VTODO" => flags.insert(Self::TODO),
                other => {
                    log::debug!("Unimplemented supported component type: {:?}. Ignoring it", other);
                },
            }
        }
        flags
    }
}

impl TryFrom<&minidom::Element> for SupportedComponents {
    type Error = String;

    /// Create an instance from an XML <supported-calendar-component-set> element
    fn try_from(element: &minidom::Element) -> Result<Self, Self::Error> {
        if element.name() != "supported-calendar-component-set" {
            return Err("Element must be a <supported-calendar-component-set>".into());
        }

        Ok(Self::from_names(element.children().filter_map(|child| child.attr("name"))))
    }
}


/// The ID of a task list, i.e. the last path segment of its CalDAV collection
pub type CalendarId = String;

/// A task list, backed by a CalDAV calendar that supports `VTODO`s
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: CalendarId,
    pub name: String,
    /// CalDAV does not expose when a collection was modified. This is the time it has been discovered.
    pub modified: DateTime<Utc>,
    pub supported_components: SupportedComponents,
    /// The collection change tag (`getctag`), if the server provides one
    pub ctag: Option<String>,
    /// For subscriptions, the URL of the external source
    pub source: Option<String>,
}

impl TaskList {
    pub fn new<S: ToString, T: ToString>(id: S, name: T, supported_components: SupportedComponents) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            modified: Utc::now(),
            supported_components,
            ctag: None,
            source: None,
        }
    }

    /// Subscriptions mirror an external feed, and cannot be written to
    pub fn is_subscription(&self) -> bool {
        self.source.is_some()
    }

    pub fn supports_tasks(&self) -> bool {
        self.supported_components.contains(SupportedComponents::TODO)
    }
}


/// Derive a list ID from the `href` of a collection.
///
/// `home_path` is the path of the calendar home (with a trailing slash). Only direct children of the home are calendars:
/// the home itself, or anything deeper, returns `None`.
pub fn calendar_id_from_href(href: &str, home_path: &str) -> Option<CalendarId> {
    let href = href.trim();
    // Some servers return absolute URLs
    let path = match url::Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.to_string(),
    };

    let remainder = path.strip_prefix(home_path)?.trim_end_matches('/');

    if remainder.is_empty() || remainder.contains('/') {
        return None;
    }
    Some(remainder.to_string())
}
