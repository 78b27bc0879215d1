//! The HTTP layer every request goes through

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};

use crate::config::{IDLE_CONNECTION_TIMEOUT, MAX_IDLE_CONNECTIONS_PER_HOST, REQUEST_TIMEOUT};
use crate::error::Error;
use crate::resource::Resource;

/// Content type of every WebDAV request body (including iCal payloads, which servers happily accept this way)
pub(crate) const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A response, already fully read
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// A pooled HTTP client.
///
/// This is cheap to clone, and clones share the same connection pool.
#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
}

impl Transport {
    pub fn new(insecure_skip_verify: bool) -> Result<Self, Error> {
        if insecure_skip_verify {
            log::warn!("TLS certificate validation is disabled");
        }

        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .pool_idle_timeout(IDLE_CONNECTION_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()?;

        Ok(Self { http })
    }

    /// Send an authenticated request, and read its whole response
    pub async fn send(
        &self,
        method: Method,
        resource: &Resource,
        body: Option<(String, &'static str)>,
        headers: &[(&'static str, &'static str)],
    ) -> Result<RawResponse, Error> {
        log::debug!("{} {}", method, resource.url());

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            header_map.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }

        let mut request = self.http
            .request(method, resource.url().as_str())
            .headers(header_map)
            .basic_auth(resource.username(), Some(resource.password()));

        if let Some((body, content_type)) = body {
            request = request
                .header(CONTENT_TYPE, content_type)
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        log::debug!("  -> {} ({} bytes)", status, body.len());

        Ok(RawResponse { status, body })
    }
}

/// Build a WebDAV-specific method (`PROPFIND`, `REPORT`, `MKCALENDAR`...)
pub(crate) fn dav_method(name: &'static str) -> Method {
    Method::from_bytes(name.as_bytes())
        .expect("WebDAV method names are valid HTTP tokens")
}
