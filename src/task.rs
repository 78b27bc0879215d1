//! To-do tasks (iCal `VTODO` item)

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// The status of a task, as exposed to the rest of the application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    NeedsAction,
    Completed,
    InProgress,
    Cancelled,
}

/// `(status, app-facing name, iCal STATUS value)`
const STATUS_TABLE: [(TaskStatus, &str, &str); 4] = [
    (TaskStatus::NeedsAction, "TODO", "NEEDS-ACTION"),
    (TaskStatus::Completed, "DONE", "COMPLETED"),
    (TaskStatus::InProgress, "PROCESSING", "IN-PROCESS"),
    (TaskStatus::Cancelled, "CANCELLED", "CANCELLED"),
];

impl TaskStatus {
    /// The short name used by the app (`TODO`, `DONE`, `PROCESSING`, `CANCELLED`)
    pub fn as_str(&self) -> &'static str {
        STATUS_TABLE.iter()
            .find(|(status, _, _)| status == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("TODO")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        STATUS_TABLE.iter()
            .find(|(_, n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(status, _, _)| *status)
    }

    /// The iCal `STATUS` value
    pub fn to_ical(&self) -> &'static str {
        STATUS_TABLE.iter()
            .find(|(status, _, _)| status == self)
            .map(|(_, _, ical)| *ical)
            .unwrap_or("NEEDS-ACTION")
    }

    /// Parse an iCal `STATUS` value. Unknown values are read as `NEEDS-ACTION`
    pub fn from_ical(value: &str) -> Self {
        STATUS_TABLE.iter()
            .find(|(_, _, ical)| ical.eq_ignore_ascii_case(value.trim()))
            .map(|(status, _, _)| *status)
            .unwrap_or(TaskStatus::NeedsAction)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::NeedsAction
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}


/// A to-do task
///
/// Its `id` is its iCal `UID`, and is used verbatim as the remote resource name (`<id>.ics`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub status: TaskStatus,
    /// 0 means "undefined", 1 is the highest priority, 9 the lowest
    pub priority: u8,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Comma-separated tags
    pub categories: String,
    /// The list (calendar) this task belongs to
    pub list_id: String,
    /// The ID of the parent task, which lives in the same list
    pub parent_id: Option<String>,
}

impl Task {
    /// Create a brand new Task that is not on a server yet.
    /// This will pick a new (random) task ID.
    pub fn new<S: ToString>(summary: S) -> Self {
        let now = Utc::now();
        Self {
            id: random_id(),
            summary: summary.to_string(),
            created: Some(now),
            modified: Some(now),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.min(9);
        self
    }

    pub fn with_parent<S: ToString>(mut self, parent_id: S) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Tags, as a list
    pub fn tags(&self) -> Vec<&str> {
        self.categories.split(',')
            .map(|tag| tag.trim())
            .filter(|tag| tag.is_empty() == false)
            .collect()
    }

    /// Make sure this task has an ID, picking a random one if needed
    pub(crate) fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = random_id();
        }
    }
}

fn random_id() -> String {
    Uuid::new_v4().to_hyphenated().to_string()
}
