//! A module to build ICal files

use chrono::{DateTime, Timelike, Utc};
use ics::properties::{Categories, Completed, Created, Description, DtStart, Due, LastModified, Priority, RelatedTo, Status, Summary};
use ics::components::Parameter;
use ics::{escape_text, ICalendar, ToDo};

use crate::config::PRODUCT_ID;
use crate::task::{Task, TaskStatus};

/// Create an iCal file (a `VCALENDAR` wrapping a single `VTODO`) from a `Task`
///
/// Missing timestamps are filled with the current time.
pub fn build_from(task: &Task) -> String {
    let now = Utc::now();
    let s_now = format_date_time(&now);

    let mut todo = ToDo::new(task.id.clone(), s_now.clone());
    todo.push(Summary::new(escape_text(task.summary.clone())));
    if task.description.is_empty() == false {
        todo.push(Description::new(escape_text(task.description.clone())));
    }
    todo.push(status_property(task.status));
    if task.priority > 0 {
        todo.push(Priority::new(task.priority.min(9).to_string()));
    }
    if task.categories.trim().is_empty() == false {
        todo.push(Categories::new(task.tags().join(",")));
    }

    if let Some(due) = &task.due_date {
        let mut prop = Due::new(format_date_or_date_time(due));
        if is_date_only(due) {
            prop.add(date_value());
        }
        todo.push(prop);
    }
    if let Some(start) = &task.start_date {
        let mut prop = DtStart::new(format_date_or_date_time(start));
        if is_date_only(start) {
            prop.add(date_value());
        }
        todo.push(prop);
    }

    todo.push(Created::new(task.created.as_ref().map(format_date_time).unwrap_or_else(|| s_now.clone())));
    todo.push(LastModified::new(task.modified.as_ref().map(format_date_time).unwrap_or_else(|| s_now.clone())));
    if let Some(completed) = &task.completed {
        todo.push(Completed::new(format_date_time(completed)));
    }

    if let Some(parent) = task.parent_id.as_ref().filter(|p| p.is_empty() == false) {
        let mut prop = RelatedTo::new(parent.clone());
        prop.add(Parameter::new("RELTYPE", "PARENT"));
        todo.push(prop);
    }

    let mut calendar = ICalendar::new("2.0", PRODUCT_ID);
    calendar.add_todo(todo);

    calendar.to_string()
}

fn status_property<'a>(status: TaskStatus) -> Status<'a> {
    match status {
        TaskStatus::NeedsAction => Status::needs_action(),
        TaskStatus::Completed => Status::completed(),
        TaskStatus::InProgress => Status::in_process(),
        TaskStatus::Cancelled => Status::cancelled(),
    }
}

fn date_value<'a>() -> Parameter<'a> {
    Parameter::new("VALUE", "DATE")
}

/// Dates at midnight UTC are sent as whole days
fn is_date_only(dt: &DateTime<Utc>) -> bool {
    dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0
}

fn format_date_or_date_time(dt: &DateTime<Utc>) -> String {
    if is_date_only(dt) {
        dt.format("%Y%m%d").to_string()
    } else {
        format_date_time(dt)
    }
}

pub(crate) fn format_date_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
