//! Parsing of WebDAV `multistatus` bodies (answers to `PROPFIND` and `REPORT`)
//!
//! Answers are first parsed as proper XML documents.
//! Some servers produce documents a namespace-aware parser rejects (undeclared prefixes, truncated bodies...),
//! in which case a pattern-based extraction is used instead.

use std::convert::TryFrom;

use minidom::Element;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::calendar::SupportedComponents;
use crate::utils::{find_elem, find_elems, find_text, strip_cdata, xml_text_to_plain};

/// A collection listed in a `PROPFIND` answer
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionEntry {
    pub href: String,
    pub display_name: Option<String>,
    pub ctag: Option<String>,
    pub supported_components: SupportedComponents,
    /// The `source` of a subscription
    pub source: Option<String>,
}

/// An item listed in a `REPORT` answer
#[derive(Clone, Debug, PartialEq)]
pub struct ItemEntry {
    pub href: String,
    pub etag: Option<String>,
    /// Raw iCal text
    pub calendar_data: String,
}

/// Extract the collections described in a `PROPFIND` answer
pub fn parse_collections(body: &str) -> Vec<CollectionEntry> {
    match parse_collections_structured(body) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("Structured PROPFIND parsing failed ({}). Falling back to pattern-based extraction", err);
            parse_collections_fallback(body)
        }
    }
}

/// Extract the items described in a `REPORT` answer
pub fn parse_items(body: &str) -> Vec<ItemEntry> {
    match parse_items_structured(body) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("Structured REPORT parsing failed ({}). Falling back to pattern-based extraction", err);
            parse_items_fallback(body)
        }
    }
}


fn parse_root(body: &str) -> Result<Element, String> {
    let root: Element = body.parse().map_err(|err: minidom::Error| err.to_string())?;
    if root.name() != "multistatus" {
        return Err(format!("unexpected root element <{}>", root.name()));
    }
    Ok(root)
}

pub(crate) fn parse_collections_structured(body: &str) -> Result<Vec<CollectionEntry>, String> {
    let root = parse_root(body)?;

    let mut entries = Vec::new();
    for rep in find_elems(&root, "response") {
        let href = match find_text(rep, "href") {
            None => {
                log::warn!("A PROPFIND response has no href! Ignoring it.");
                continue;
            },
            Some(h) => h,
        };

        let supported_components = match find_elem(rep, "supported-calendar-component-set") {
            None => SupportedComponents::empty(),
            Some(el) => SupportedComponents::try_from(el)?,
        };

        let source = find_elem(rep, "source")
            .and_then(|el| find_text(el, "href"));

        entries.push(CollectionEntry {
            href,
            display_name: find_text(rep, "displayname"),
            ctag: find_text(rep, "getctag"),
            supported_components,
            source,
        });
    }
    Ok(entries)
}

pub(crate) fn parse_items_structured(body: &str) -> Result<Vec<ItemEntry>, String> {
    let root = parse_root(body)?;

    let mut entries = Vec::new();
    for rep in find_elems(&root, "response") {
        let href = match find_text(rep, "href") {
            None => {
                log::warn!("A REPORT response has no href! Ignoring it.");
                continue;
            },
            Some(h) => h,
        };
        let data_elem = match find_elem(rep, "calendar-data") {
            None => {
                log::debug!("No calendar-data for {}", href);
                continue;
            },
            Some(el) => el,
        };

        let text = data_elem.text();
        let calendar_data = match strip_cdata(&text) {
            Some(inner) => inner.trim().to_string(),
            None => text.trim().to_string(),
        };
        if calendar_data.trim().is_empty() {
            if body.contains("<![CDATA[") {
                return Err(format!("empty calendar-data for {} in a document that uses CDATA", href));
            }
            continue;
        }

        entries.push(ItemEntry {
            href,
            etag: find_text(rep, "getetag"),
            calendar_data,
        });
    }
    Ok(entries)
}


fn element_pattern(name: &str) -> Regex {
    let pattern = format!(
        r"(?s)<(?:[\w.-]+:)?{name}(?:\s[^>]*)?>(.*?)</(?:[\w.-]+:)?{name}\s*>",
        name = regex::escape(name)
    );
    Regex::new(&pattern).expect("valid element pattern")
}

static RESPONSE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(?:[\w.-]+:)?response[\s>]").expect("valid response pattern"));
static HREF: Lazy<Regex> = Lazy::new(|| element_pattern("href"));
static DISPLAYNAME: Lazy<Regex> = Lazy::new(|| element_pattern("displayname"));
static GETCTAG: Lazy<Regex> = Lazy::new(|| element_pattern("getctag"));
static GETETAG: Lazy<Regex> = Lazy::new(|| element_pattern("getetag"));
static SOURCE: Lazy<Regex> = Lazy::new(|| element_pattern("source"));
static CALENDAR_DATA: Lazy<Regex> = Lazy::new(|| element_pattern("calendar-data"));
static COMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(?:[\w.-]+:)?comp\s[^>]*?name\s*=\s*["']([^"']+)["']"#).expect("valid comp pattern")
});

/// Split a body into chunks, each starting at a `<response>` opening tag.
/// A truncated body still yields its complete leading responses.
fn response_chunks(body: &str) -> Vec<&str> {
    let starts: Vec<usize> = RESPONSE_START.find_iter(body).map(|m| m.start()).collect();
    starts.iter()
        .enumerate()
        .map(|(i, start)| {
            let end = starts.get(i + 1).copied().unwrap_or(body.len());
            &body[*start..end]
        })
        .collect()
}

fn first_text(pattern: &Regex, chunk: &str) -> Option<String> {
    pattern.captures(chunk)
        .and_then(|caps| caps.get(1))
        .map(|m| xml_text_to_plain(m.as_str()))
        .filter(|text| text.is_empty() == false)
}

pub(crate) fn parse_collections_fallback(body: &str) -> Vec<CollectionEntry> {
    response_chunks(body).into_iter()
        .filter_map(|chunk| {
            let href = first_text(&HREF, chunk)?;
            let components = COMP.captures_iter(chunk)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .collect::<Vec<_>>();
            let source = SOURCE.captures(chunk)
                .and_then(|caps| caps.get(1))
                .and_then(|m| first_text(&HREF, m.as_str()));

            Some(CollectionEntry {
                href,
                display_name: first_text(&DISPLAYNAME, chunk),
                ctag: first_text(&GETCTAG, chunk),
                supported_components: SupportedComponents::from_names(components),
                source,
            })
        })
        .collect()
}

pub(crate) fn parse_items_fallback(body: &str) -> Vec<ItemEntry> {
    response_chunks(body).into_iter()
        .filter_map(|chunk| {
            let href = first_text(&HREF, chunk)?;
            let calendar_data = first_text(&CALENDAR_DATA, chunk)?;
            Some(ItemEntry {
                href,
                etag: first_text(&GETETAG, chunk),
                calendar_data,
            })
        })
        .collect()
}
