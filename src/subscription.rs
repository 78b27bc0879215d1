//! Subscriptions to external calendar feeds
//!
//! A subscription is a regular calendar collection created with a `source` property. The server keeps it in sync with
//! the feed, and refuses writes into it.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use url::Url;

use crate::calendar::{calendar_id_from_href, SupportedComponents, TaskList};
use crate::client::Client;
use crate::error::Error;
use crate::traits::SubscriptionBackend;
use crate::transport::{dav_method, XML_CONTENT_TYPE};

/// Name given to subscriptions whose URL does not tell anything better
pub const DEFAULT_SUBSCRIPTION_NAME: &str = "subscription";

/// Check `source_url` is an absolute URL that can be subscribed to
pub fn validate_source_url(source_url: &str) -> Result<Url, Error> {
    let invalid = |reason: &str| Error::InvalidUrl { url: source_url.to_string(), reason: reason.to_string() };

    let url = Url::parse(source_url.trim()).map_err(|err| invalid(&err.to_string()))?;
    if url.cannot_be_a_base() || url.host_str().map(|h| h.is_empty()).unwrap_or(true) {
        return Err(invalid("not an absolute URL"));
    }
    Ok(url)
}

/// A human-friendly name for a feed: its last path segment, without extension
/// (`https://e.com/cal/feed.ics` gives `feed`)
pub fn subscription_name(url: &Url) -> String {
    let last_segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| s.is_empty() == false).last());

    let name = match last_segment {
        None => return DEFAULT_SUBSCRIPTION_NAME.to_string(),
        Some(segment) => {
            let decoded = percent_decode(segment);
            match decoded.rfind('.') {
                Some(dot) => decoded[..dot].to_string(),
                None => decoded,
            }
        },
    };

    let name = name.trim();
    if name.is_empty() {
        DEFAULT_SUBSCRIPTION_NAME.to_string()
    } else {
        name.to_string()
    }
}

fn percent_decode(segment: &str) -> String {
    url::form_urlencoded::parse(format!("s={}", segment.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| segment.to_string())
}

fn mkcalendar_body(name: &str, source: &str) -> String {
    format!(r#"<?xml version="1.0" encoding="utf-8" ?>
<c:mkcalendar xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" xmlns:cs="http://calendarserver.org/ns/">
  <d:set>
    <d:prop>
      <d:displayname>{}</d:displayname>
      <cs:source><d:href>{}</d:href></cs:source>
      <c:supported-calendar-component-set>
        <c:comp name="VTODO"/>
      </c:supported-calendar-component-set>
    </d:prop>
  </d:set>
</c:mkcalendar>"#, escape_xml(name), escape_xml(source))
}

fn escape_xml(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}


#[async_trait]
impl SubscriptionBackend for Client {
    async fn subscribe_list(&self, source_url: &str) -> Result<TaskList, Error> {
        let source = validate_source_url(source_url)?;
        let name = subscription_name(&source);
        let segment = sanitize_filename::sanitize(&name);
        let resource = self.resource(&self.calendar_path(&segment));
        // The ID must be the one discovery will read back from the (encoded) href
        let id = calendar_id_from_href(resource.url().path(), self.home_path())
            .ok_or_else(|| Error::InvalidUrl { url: source_url.to_string(), reason: format!("unusable list name {:?}", name) })?;

        let body = mkcalendar_body(&name, source.as_str());
        let response = self.send(dav_method("MKCALENDAR"), &resource, Some((body, XML_CONTENT_TYPE)), &[]).await?;
        match response.status {
            StatusCode::CREATED | StatusCode::OK | StatusCode::NO_CONTENT => (),
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::CONFLICT => return Err(Error::AlreadyExists(name)),
            status => return Err(Error::protocol("MKCALENDAR", status)),
        }

        log::info!("Subscribed to {} as {}", source, id);
        let mut list = TaskList::new(id, name, SupportedComponents::TODO);
        list.source = Some(source.to_string());
        Ok(list)
    }

    async fn unsubscribe_list(&self, list_id: &str) -> Result<(), Error> {
        let resource = self.resource(&self.calendar_path(list_id));
        let response = self.send(Method::DELETE, &resource, None, &[]).await?;
        match response.status {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                log::info!("Unsubscribed from {}", list_id);
                Ok(())
            },
            StatusCode::NOT_FOUND => Err(Error::ListNotFound(list_id.to_string())),
            StatusCode::FORBIDDEN | StatusCode::METHOD_NOT_ALLOWED => Err(Error::ReadOnly(list_id.to_string())),
            status => Err(Error::protocol("DELETE", status)),
        }
    }
}
