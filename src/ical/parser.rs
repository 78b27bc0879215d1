//! A module to parse ICal files
//!
//! Servers are not equally strict about the iCal files they store, so this parser never fails:
//! every property is looked up on its own, and whatever cannot be understood falls back to a default value.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::task::{Task, TaskStatus};

const PROPERTIES: [&str; 12] = [
    "UID", "SUMMARY", "DESCRIPTION", "STATUS", "PRIORITY", "CATEGORIES",
    "DUE", "DTSTART", "CREATED", "LAST-MODIFIED", "COMPLETED", "RELATED-TO",
];

static VTODO_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^BEGIN:VTODO\r?\n(.*?)^END:VTODO\r?$").expect("valid VTODO pattern")
});
static VALARM_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^BEGIN:VALARM\r?$.*?^END:VALARM\r?$\n?").expect("valid VALARM pattern")
});
static FOLDED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r?\n[ \t]").expect("valid folding pattern")
});

/// One pattern per property. Parameters (`;VALUE=DATE`, `;TZID=...`) are captured before the `:` separator
static PROPERTY_PATTERNS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    PROPERTIES.iter()
        .map(|name| {
            let pattern = format!(r"(?mi)^{}((?:;[^:\r\n]*)?):[ \t]*([^\r\n]*?)[ \t]*\r?$", regex::escape(name));
            (*name, Regex::new(&pattern).expect("valid property pattern"))
        })
        .collect()
});


/// Parse every `VTODO` contained in `content`. They will be assigned to the list `list_id`
pub fn parse(content: &str, list_id: &str) -> Vec<Task> {
    let unfolded = FOLDED_LINE.replace_all(content, "");

    VTODO_BLOCK.captures_iter(&unfolded)
        .filter_map(|caps| caps.get(1))
        .map(|block| {
            let mut task = parse_vtodo(block.as_str());
            task.list_id = list_id.to_string();
            task
        })
        .collect()
}

/// Parse the content lines of a single `VTODO` (without its `BEGIN`/`END` lines)
pub fn parse_vtodo(block: &str) -> Task {
    let unfolded = FOLDED_LINE.replace_all(block, "");
    // Alarms have their own DESCRIPTION, SUMMARY...
    let block = VALARM_BLOCK.replace_all(&unfolded, "");
    let block = block.as_ref();

    let text = |name: &str| value(block, name).map(|v| unescape_text(&v)).unwrap_or_default();
    let date = |name: &str| value(block, name).and_then(|v| parse_date(&v));

    let priority = value(block, "PRIORITY")
        .and_then(|v| v.parse::<u8>().ok())
        .filter(|p| *p <= 9)
        .unwrap_or(0);

    let categories = values(block, "CATEGORIES")
        .into_iter()
        .flat_map(|(_, v)| v.split(',').map(|tag| tag.trim().to_string()).collect::<Vec<_>>())
        .filter(|tag| tag.is_empty() == false)
        .collect::<Vec<_>>()
        .join(",");

    let parent_id = values(block, "RELATED-TO")
        .into_iter()
        .find(|(params, v)| is_parent_relation(params) && v.is_empty() == false)
        .map(|(_, v)| v);

    Task {
        id: text("UID"),
        summary: text("SUMMARY"),
        description: text("DESCRIPTION"),
        status: value(block, "STATUS").map(|s| TaskStatus::from_ical(&s)).unwrap_or_default(),
        priority,
        due_date: date("DUE"),
        start_date: date("DTSTART"),
        completed: date("COMPLETED"),
        created: date("CREATED"),
        modified: date("LAST-MODIFIED"),
        categories,
        list_id: String::new(),
        parent_id,
    }
}

/// Parse a date, trying UTC date-times, then floating date-times, then whole dates
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    // Floating times (or times with a TZID) are read as UTC
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }

    log::debug!("Unable to parse date {:?}", value);
    None
}

fn value(block: &str, name: &str) -> Option<String> {
    PROPERTY_PATTERNS.get(name)?
        .captures(block)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Every occurrence of a property, as `(parameters, value)`
fn values(block: &str, name: &str) -> Vec<(String, String)> {
    match PROPERTY_PATTERNS.get(name) {
        None => Vec::new(),
        Some(pattern) => pattern.captures_iter(block)
            .map(|caps| {
                let params = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let value = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                (params.to_string(), value.to_string())
            })
            .collect(),
    }
}

/// RFC5545 says a RELATED-TO without RELTYPE is a PARENT relation
fn is_parent_relation(params: &str) -> bool {
    let params = params.to_ascii_uppercase();
    match params.find("RELTYPE=") {
        None => true,
        Some(pos) => params[pos + "RELTYPE=".len()..].trim_start_matches('"').starts_with("PARENT"),
    }
}

fn unescape_text(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => unescaped.push('\n'),
            Some(other) => unescaped.push(other),
            None => unescaped.push('\\'),
        }
    }
    unescaped
}
