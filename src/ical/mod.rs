//! This module handles conversion between iCal files and [`Task`](crate::Task)s
//!
//! Generation relies on the `ics` crate. Parsing is done property by property, so that files that a strict parser
//! would reject can still be read.

mod parser;
pub use parser::{parse, parse_date, parse_vtodo};
mod builder;
pub use builder::build_from;


#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::task::{Task, TaskStatus};

    #[test]
    fn test_round_trip() {
        let original = Task {
            id: "round-trip".to_string(),
            summary: "Pay the bills, all of them; really".to_string(),
            description: "first line\nsecond line".to_string(),
            status: TaskStatus::Cancelled,
            priority: 7,
            due_date: Some(Utc.with_ymd_and_hms(2025, 1, 31, 17, 45, 12).unwrap()),
            start_date: Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()),
            completed: Some(Utc.with_ymd_and_hms(2025, 1, 30, 9, 0, 1).unwrap()),
            created: Some(Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap()),
            modified: Some(Utc.with_ymd_and_hms(2024, 12, 2, 11, 0, 0).unwrap()),
            categories: "finance,home".to_string(),
            list_id: "admin".to_string(),
            parent_id: Some("bills".to_string()),
        };

        let parsed = parse(&build_from(&original), "admin");
        assert_eq!(parsed, vec![original]);
    }

    #[test]
    fn test_round_trip_drops_sub_seconds() {
        let precise = Utc.with_ymd_and_hms(2025, 3, 3, 3, 3, 3).unwrap() + chrono::Duration::milliseconds(456);
        let task = Task { id: "x".to_string(), due_date: Some(precise), ..Task::default() };

        let parsed = parse(&build_from(&task), "");
        assert_eq!(parsed[0].due_date, Some(Utc.with_ymd_and_hms(2025, 3, 3, 3, 3, 3).unwrap()));
    }

    #[test]
    fn test_component_markers_in_text() {
        let task = Task {
            id: "markers".to_string(),
            summary: "BEGIN:VALARM".to_string(),
            description: "END:VTODO is a word".to_string(),
            status: TaskStatus::Completed,
            priority: 3,
            parent_id: Some("p".to_string()),
            ..Task::default()
        };

        let parsed = parse(&build_from(&task), "");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].summary, "BEGIN:VALARM");
        assert_eq!(parsed[0].description, "END:VTODO is a word");
        assert_eq!(parsed[0].status, TaskStatus::Completed);
        assert_eq!(parsed[0].priority, 3);
        assert_eq!(parsed[0].parent_id.as_deref(), Some("p"));
    }

    #[test]
    fn test_every_status_round_trips() {
        for status in &[TaskStatus::NeedsAction, TaskStatus::Completed, TaskStatus::InProgress, TaskStatus::Cancelled] {
            let task = Task { id: "s".to_string(), status: *status, ..Task::default() };
            assert_eq!(parse(&build_from(&task), "")[0].status, *status);
        }
    }
}
