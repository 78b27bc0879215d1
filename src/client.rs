//! This module provides a client to connect to a CalDAV server

use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use crate::calendar::{calendar_id_from_href, SupportedComponents, TaskList};
use crate::config::{BackendConfig, CALENDAR_HOME_PATH};
use crate::error::Error;
use crate::ical;
use crate::multistatus::{parse_collections, parse_items};
use crate::ocs::Share;
use crate::resource::{resolve_base_url, Resource};
use crate::task::Task;
use crate::traits::{SharePermission, ShareBackend, TaskBackend};
use crate::transport::{dav_method, RawResponse, Transport, XML_CONTENT_TYPE};


static CAL_BODY: &str = r#"
    <d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" xmlns:cs="http://calendarserver.org/ns/">
       <d:prop>
         <d:displayname />
         <d:resourcetype />
         <cs:getctag />
         <c:supported-calendar-component-set />
         <cs:source />
       </d:prop>
    </d:propfind>
"#;

static TASKS_BODY: &str = r#"
    <c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
        <d:prop>
            <d:getetag />
            <c:calendar-data />
        </d:prop>
        <c:filter>
            <c:comp-filter name="VCALENDAR">
                <c:comp-filter name="VTODO" />
            </c:comp-filter>
        </c:filter>
    </c:calendar-query>
"#;


/// A task backend that talks to a CalDAV server (with the OCS extensions of Nextcloud-like servers).
///
/// It holds no data: every call is a new round trip to the server. Cloning it is cheap, and clones share the same connection pool.
#[derive(Clone, Debug)]
pub struct Client {
    root: Resource,
    transport: Transport,
    /// Path prefix of the server installation (empty when it is installed at the root of its host)
    root_path: String,
    /// Path of the calendar home of the user, with a trailing slash
    home_path: String,
}

impl Client {
    /// Create a client. This does not start a connection, but fails early on an incomplete configuration
    pub fn new(config: BackendConfig) -> Result<Self, Error> {
        config.validate()?;

        let base_url = resolve_base_url(&config.host, config.allow_http)?;
        let transport = Transport::new(config.insecure_skip_verify)?;

        let root_path = base_url.path().trim_end_matches('/').to_string();
        let root = Resource::new(base_url, config.username.clone(), config.password.clone());
        // Let the URL encoder decide how the username appears in paths, so that it matches the hrefs returned by the server
        let home = root.combine(&format!("{}{}", root_path, CALENDAR_HOME_PATH.replace("{}", config.username.trim())));
        let home_path = home.url().path().to_string();

        log::debug!("Calendar home set is {}", home.url());
        Ok(Self { root, transport, root_path, home_path })
    }

    /// The root URL of the server
    pub fn base_url(&self) -> &url::Url {
        self.root.url()
    }

    pub(crate) fn root_path(&self) -> &str {
        &self.root_path
    }

    /// The path of the calendar home of the user (with a trailing slash)
    pub fn home_path(&self) -> &str {
        &self.home_path
    }

    pub(crate) fn calendar_path(&self, list_id: &str) -> String {
        format!("{}{}/", self.home_path, list_id)
    }

    fn task_path(&self, list_id: &str, task_id: &str) -> String {
        format!("{}{}/{}.ics", self.home_path, list_id, task_id)
    }

    pub(crate) fn resource(&self, path: &str) -> Resource {
        self.root.combine(path)
    }

    pub(crate) fn resource_with_query(&self, path: &str, query: &str) -> Resource {
        self.root.combine_with_query(path, query)
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        resource: &Resource,
        body: Option<(String, &'static str)>,
        headers: &[(&'static str, &'static str)],
    ) -> Result<RawResponse, Error> {
        self.transport.send(method, resource, body, headers).await
    }

    async fn put_task(&self, list_id: &str, task: Task) -> Result<Task, Error> {
        let ical_text = ical::build_from(&task);
        let resource = self.resource(&self.task_path(list_id, &task.id));

        let response = self.send(Method::PUT, &resource, Some((ical_text, XML_CONTENT_TYPE)), &[]).await?;
        match response.status {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => {
                log::debug!("Stored task {} in {}", task.id, list_id);
                Ok(task)
            },
            StatusCode::FORBIDDEN | StatusCode::METHOD_NOT_ALLOWED => Err(Error::ReadOnly(list_id.to_string())),
            StatusCode::NOT_FOUND | StatusCode::CONFLICT => Err(Error::ListNotFound(list_id.to_string())),
            status => Err(Error::protocol("PUT", status)),
        }
    }
}

/// The resource name of an item (`abc` for `/cal/work/abc.ics`)
fn item_name_from_href(href: &str) -> Option<String> {
    let last = href.trim_end_matches('/').rsplit('/').next()?;
    let name = last.strip_suffix(".ics").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}


#[async_trait]
impl TaskBackend for Client {
    async fn list_calendars(&self) -> Result<Vec<TaskList>, Error> {
        let resource = self.resource(&self.home_path);
        let response = self.send(dav_method("PROPFIND"), &resource, Some((CAL_BODY.to_string(), XML_CONTENT_TYPE)), &[("depth", "1")]).await?;
        if response.status != StatusCode::MULTI_STATUS {
            return Err(Error::protocol("PROPFIND", response.status));
        }

        let mut lists = Vec::new();
        for entry in parse_collections(&response.body) {
            let id = match calendar_id_from_href(&entry.href, &self.home_path) {
                None => {
                    log::debug!("{} is not a calendar of the home set. Ignoring it.", entry.href);
                    continue;
                },
                Some(id) => id,
            };
            if entry.supported_components.contains(SupportedComponents::TODO) == false {
                log::debug!("Calendar {} does not support tasks. Ignoring it.", id);
                continue;
            }

            let name = entry.display_name.unwrap_or_else(|| id.clone());
            let mut list = TaskList::new(id, name, entry.supported_components);
            list.ctag = entry.ctag;
            list.source = entry.source;
            log::info!("Found calendar {}", list.name);
            lists.push(list);
        }

        Ok(lists)
    }

    async fn get_list(&self, list_id: &str) -> Result<TaskList, Error> {
        self.list_calendars().await?
            .into_iter()
            .find(|list| list.id == list_id)
            .ok_or_else(|| Error::ListNotFound(list_id.to_string()))
    }

    async fn list_tasks(&self, list_id: &str) -> Result<Vec<Task>, Error> {
        let resource = self.resource(&self.calendar_path(list_id));
        let response = self.send(dav_method("REPORT"), &resource, Some((TASKS_BODY.to_string(), XML_CONTENT_TYPE)), &[("depth", "1")]).await?;
        match response.status {
            StatusCode::MULTI_STATUS => (),
            StatusCode::NOT_FOUND => return Err(Error::ListNotFound(list_id.to_string())),
            status => return Err(Error::protocol("REPORT", status)),
        }

        let mut tasks = Vec::new();
        for item in parse_items(&response.body) {
            let parsed = ical::parse(&item.calendar_data, list_id);
            if parsed.is_empty() {
                log::warn!("No VTODO found in {}, ignoring it", item.href);
            }
            for mut task in parsed {
                if task.id.is_empty() {
                    match item_name_from_href(&item.href) {
                        Some(name) => task.id = name,
                        None => {
                            log::warn!("Task in {} has neither a UID nor a usable URL, ignoring it", item.href);
                            continue;
                        },
                    }
                }
                tasks.push(task);
            }
        }

        log::debug!("Found {} tasks in {}", tasks.len(), list_id);
        Ok(tasks)
    }

    async fn get_task(&self, list_id: &str, task_id: &str) -> Result<Task, Error> {
        let resource = self.resource(&self.task_path(list_id, task_id));
        let response = self.send(Method::GET, &resource, None, &[]).await?;
        match response.status {
            status if status.is_success() => (),
            StatusCode::NOT_FOUND => return Err(Error::TaskNotFound(task_id.to_string())),
            status => return Err(Error::protocol("GET", status)),
        }

        let mut task = ical::parse(&response.body, list_id)
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse(format!("no VTODO in {}", resource.url())))?;
        if task.id.is_empty() {
            task.id = task_id.to_string();
        }
        Ok(task)
    }

    async fn create_task(&self, list_id: &str, task: &Task) -> Result<Task, Error> {
        let mut task = task.clone();
        task.ensure_id();
        task.list_id = list_id.to_string();
        self.put_task(list_id, task).await
    }

    async fn update_task(&self, list_id: &str, task: &Task) -> Result<Task, Error> {
        if task.id.trim().is_empty() {
            return Err(Error::InvalidTask("cannot update a task that has no ID".to_string()));
        }
        let mut task = task.clone();
        task.list_id = list_id.to_string();
        self.put_task(list_id, task).await
    }

    async fn delete_task(&self, list_id: &str, task_id: &str) -> Result<(), Error> {
        let resource = self.resource(&self.task_path(list_id, task_id));
        let response = self.send(Method::DELETE, &resource, None, &[]).await?;
        match response.status {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => {
                log::debug!("Task {} was already absent from {}", task_id, list_id);
                Ok(())
            },
            StatusCode::FORBIDDEN | StatusCode::METHOD_NOT_ALLOWED => Err(Error::ReadOnly(list_id.to_string())),
            status => Err(Error::protocol("DELETE", status)),
        }
    }

    async fn create_list(&self, name: &str) -> Result<TaskList, Error> {
        log::debug!("Not creating list {}: unsupported", name);
        Err(Error::NotSupported("list creation"))
    }

    async fn delete_list(&self, list_id: &str) -> Result<(), Error> {
        log::debug!("Not deleting list {}: unsupported", list_id);
        Err(Error::NotSupported("list deletion"))
    }

    async fn deleted_lists(&self) -> Result<Vec<TaskList>, Error> {
        Err(Error::NotSupported("trash"))
    }

    async fn restore_list(&self, _list_id: &str) -> Result<(), Error> {
        Err(Error::NotSupported("trash"))
    }

    async fn purge_list(&self, _list_id: &str) -> Result<(), Error> {
        Err(Error::NotSupported("trash"))
    }
}

/// Sharing with other users depends on server-side capabilities this client does not negotiate yet
#[async_trait]
impl ShareBackend for Client {
    async fn share_list(&self, list_id: &str, user: &str, permission: SharePermission) -> Result<(), Error> {
        log::debug!("Not sharing {} with {} ({:?}): unsupported", list_id, user, permission);
        Err(Error::NotSupported("sharing with users"))
    }

    async fn unshare_list(&self, _list_id: &str, _user: &str) -> Result<(), Error> {
        Err(Error::NotSupported("sharing with users"))
    }

    async fn list_shares(&self, _list_id: &str) -> Result<Vec<Share>, Error> {
        Err(Error::NotSupported("sharing with users"))
    }
}


#[cfg(test)]
mod test {
    use super::*;

    fn client(host: &str) -> Client {
        Client::new(BackendConfig::new(host, "bob", "secret")).unwrap()
    }

    #[test]
    fn test_paths() {
        let client = client("cloud.example.com");
        assert_eq!(client.base_url().as_str(), "https://cloud.example.com/");
        assert_eq!(client.home_path(), "/remote.php/dav/calendars/bob/");
        assert_eq!(client.calendar_path("work"), "/remote.php/dav/calendars/bob/work/");
        assert_eq!(client.task_path("work", "abc"), "/remote.php/dav/calendars/bob/work/abc.ics");
    }

    #[test]
    fn test_installation_in_a_sub_folder() {
        let client = client("http://example.com/nextcloud/");
        assert_eq!(client.root_path(), "/nextcloud");
        assert_eq!(client.home_path(), "/nextcloud/remote.php/dav/calendars/bob/");
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(Client::new(BackendConfig::new("", "bob", "pw")), Err(Error::Config(_))));
        assert!(matches!(Client::new(BackendConfig::new("h", "", "pw")), Err(Error::Config(_))));
        assert!(matches!(Client::new(BackendConfig::new("h", "bob", "")), Err(Error::Config(_))));
        assert!(matches!(Client::new(BackendConfig::new("https://http://h", "bob", "pw")), Err(Error::InvalidUrl { .. })));
    }

    #[test]
    fn test_item_name_from_href() {
        assert_eq!(item_name_from_href("/cal/work/abc.ics"), Some("abc".to_string()));
        assert_eq!(item_name_from_href("/cal/work/abc"), Some("abc".to_string()));
        assert_eq!(item_name_from_href("/"), None);
    }
}
