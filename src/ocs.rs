//! Public links, through the OCS share API
//!
//! Every OCS answer is wrapped into the same envelope:
//! `{"ocs": {"meta": {"status": ..., "statuscode": ..., "message": ...}, "data": ...}}`

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use url::form_urlencoded;

use crate::client::Client;
use crate::config::OCS_SHARES_PATH;
use crate::error::Error;
use crate::traits::PublishBackend;
use crate::transport::FORM_CONTENT_TYPE;

const OCS_HEADERS: &[(&str, &str)] = &[("ocs-apirequest", "true"), ("accept", "application/json")];

/// What a share gives access to, and to whom
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ShareType {
    User,
    Group,
    PublicLink,
    /// Any other kind of share (federated, email, circle...)
    Other(i64),
}

impl From<i64> for ShareType {
    fn from(value: i64) -> Self {
        match value {
            0 => ShareType::User,
            1 => ShareType::Group,
            3 => ShareType::PublicLink,
            other => ShareType::Other(other),
        }
    }
}

impl From<ShareType> for i64 {
    fn from(share_type: ShareType) -> Self {
        match share_type {
            ShareType::User => 0,
            ShareType::Group => 1,
            ShareType::PublicLink => 3,
            ShareType::Other(other) => other,
        }
    }
}

/// A share, as known by the server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Share {
    #[serde(deserialize_with = "number_or_string")]
    pub id: u64,
    #[serde(default)]
    pub path: String,
    pub share_type: ShareType,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Servers disagree on whether IDs are JSON numbers or strings
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}


#[derive(Debug, Deserialize)]
struct Envelope {
    ocs: OcsBody,
}

#[derive(Debug, Deserialize)]
struct OcsBody {
    meta: Meta,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    status: String,
    statuscode: u32,
    #[serde(default)]
    message: Option<String>,
}

impl Meta {
    fn is_success(&self) -> bool {
        self.statuscode == 100 || self.statuscode == 200
    }

    fn message(&self) -> String {
        self.message.clone().unwrap_or_default()
    }
}

fn decode_envelope(body: &str) -> Result<OcsBody, Error> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|err| Error::MalformedResponse(format!("not an OCS envelope: {}", err)))?;
    Ok(envelope.ocs)
}

/// The share creation operation. Refusals only mean "already published" for this one
const PUBLISH: &str = "publish";

/// Turn an OCS answer into either its `data` payload, or the most specific error
fn check_outcome(list_id: &str, operation: &'static str, status: StatusCode, body: &str) -> Result<serde_json::Value, Error> {
    let publishing = operation == PUBLISH;
    let ocs = match decode_envelope(body) {
        Ok(ocs) => ocs,
        Err(err) => {
            return match status {
                StatusCode::FORBIDDEN if publishing => Err(Error::AlreadyPublished(list_id.to_string())),
                StatusCode::NOT_FOUND => Err(Error::ListNotFound(list_id.to_string())),
                status if status.is_success() => Err(err),
                status => Err(Error::protocol(operation, status)),
            };
        },
    };

    if status.is_success() && ocs.meta.is_success() {
        return Ok(ocs.data);
    }

    let message = ocs.meta.message();
    let lowercase = message.to_lowercase();
    log::debug!("OCS {} failed: {} {} ({:?})", operation, ocs.meta.status, ocs.meta.statuscode, message);

    let refused = ocs.meta.statuscode == 403 || status == StatusCode::FORBIDDEN;
    if publishing && (refused || lowercase.contains("already shared")) {
        Err(Error::AlreadyPublished(list_id.to_string()))
    } else if ocs.meta.statuscode == 404 || status == StatusCode::NOT_FOUND
        || lowercase.contains("path not found") || lowercase.contains("wrong path")
    {
        Err(Error::ListNotFound(list_id.to_string()))
    } else {
        Err(Error::Ocs { statuscode: ocs.meta.statuscode, message })
    }
}

/// Every public link share in `data` that points to `path`
fn public_links_for(data: serde_json::Value, path: &str) -> Result<Vec<Share>, Error> {
    let shares: Vec<Share> = match data {
        serde_json::Value::Null => Vec::new(),
        data => serde_json::from_value(data)
            .map_err(|err| Error::MalformedResponse(format!("unexpected OCS share list: {}", err)))?,
    };

    Ok(shares
        .into_iter()
        .filter(|share| share.share_type == ShareType::PublicLink)
        .filter(|share| share.path.trim_end_matches('/') == path)
        .collect())
}


impl Client {
    /// The path the OCS API knows a list by
    pub(crate) fn share_path(&self, list_id: &str) -> String {
        self.calendar_path(list_id).trim_end_matches('/').to_string()
    }

    fn ocs_path(&self) -> String {
        format!("{}{}", self.root_path(), OCS_SHARES_PATH)
    }

    fn public_url(&self, share: &Share) -> Result<String, Error> {
        if let Some(url) = share.url.as_ref().filter(|url| url.is_empty() == false) {
            return Ok(url.clone());
        }
        match share.token.as_ref().filter(|token| token.is_empty() == false) {
            Some(token) => Ok(self.resource(&format!("{}/s/{}", self.root_path(), token)).url().to_string()),
            None => Err(Error::MalformedResponse(format!("share {} has neither a URL nor a token", share.id))),
        }
    }
}

#[async_trait]
impl PublishBackend for Client {
    async fn publish_list(&self, list_id: &str) -> Result<String, Error> {
        if self.public_shares(list_id).await?.is_empty() == false {
            return Err(Error::AlreadyPublished(list_id.to_string()));
        }

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("path", &self.share_path(list_id))
            .append_pair("shareType", "3")
            .finish();
        let resource = self.resource_with_query(&self.ocs_path(), "format=json");
        let response = self.send(Method::POST, &resource, Some((body, FORM_CONTENT_TYPE)), OCS_HEADERS).await?;

        let data = check_outcome(list_id, PUBLISH, response.status, &response.body)?;
        let share: Share = serde_json::from_value(data)
            .map_err(|err| Error::MalformedResponse(format!("unexpected OCS share: {}", err)))?;
        let url = self.public_url(&share)?;
        log::info!("Published {} at {}", list_id, url);
        Ok(url)
    }

    async fn unpublish_list(&self, list_id: &str) -> Result<(), Error> {
        let shares = self.public_shares(list_id).await?;
        if shares.is_empty() {
            return Err(Error::NotPublished(list_id.to_string()));
        }

        for share in shares {
            let resource = self.resource_with_query(&format!("{}/{}", self.ocs_path(), share.id), "format=json");
            let response = self.send(Method::DELETE, &resource, None, OCS_HEADERS).await?;
            if response.status == StatusCode::NOT_FOUND {
                log::debug!("Share {} has already been removed", share.id);
                continue;
            }
            check_outcome(list_id, "unpublish", response.status, &response.body)?;
            log::info!("Removed public link {} of {}", share.id, list_id);
        }
        Ok(())
    }

    async fn public_shares(&self, list_id: &str) -> Result<Vec<Share>, Error> {
        let share_path = self.share_path(list_id);
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("format", "json")
            .append_pair("path", &share_path)
            .append_pair("reshares", "false")
            .finish();
        let resource = self.resource_with_query(&self.ocs_path(), &query);
        let response = self.send(Method::GET, &resource, None, OCS_HEADERS).await?;

        let data = check_outcome(list_id, "list shares", response.status, &response.body)?;
        public_links_for(data, &share_path)
    }
}
