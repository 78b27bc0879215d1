use url::Url;

use crate::error::Error;

const SECURE_SCHEME: &str = "https://";
const INSECURE_SCHEME: &str = "http://";

/// Just a wrapper around a URL and credentials
#[derive(Clone)]
pub struct Resource {
    url: Url,
    username: String,
    password: String,
}

impl Resource {
    pub fn new(url: Url, username: String, password: String) -> Self {
        Self { url, username, password }
    }

    pub fn url(&self) -> &Url { &self.url }
    pub fn username(&self) -> &String { &self.username }
    pub fn password(&self) -> &String { &self.password }

    /// Build a new Resource by keeping the same credentials, scheme and server from `base` but changing the path part
    pub fn combine(&self, new_path: &str) -> Resource {
        let mut built = (*self).clone();
        built.url.set_path(new_path);
        built
    }

    /// Same as [`Resource::combine`], but also sets the query string
    pub fn combine_with_query(&self, new_path: &str, query: &str) -> Resource {
        let mut built = self.combine(new_path);
        built.url.set_query(Some(query));
        built
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .finish()
    }
}


/// Compute the root URL of the server.
///
/// * an explicit scheme in `host` always wins,
/// * otherwise `allow_http` selects `http`,
/// * otherwise `https` is used.
pub fn resolve_base_url(host: &str, allow_http: bool) -> Result<Url, Error> {
    let host = host.trim();
    let lowercase = host.to_ascii_lowercase();

    let with_scheme = if lowercase.starts_with(SECURE_SCHEME) || lowercase.starts_with(INSECURE_SCHEME) {
        host.to_string()
    } else if host.contains("://") {
        return Err(invalid(host, "unsupported scheme"));
    } else if allow_http {
        format!("{}{}", INSECURE_SCHEME, host)
    } else {
        format!("{}{}", SECURE_SCHEME, host)
    };

    // Catches things like "https://http://host"
    if with_scheme.matches("://").count() != 1 {
        return Err(invalid(host, "doubled scheme prefix"));
    }

    let url = Url::parse(&with_scheme).map_err(|err| invalid(host, &err.to_string()))?;
    if url.host_str().map(|h| h.is_empty()).unwrap_or(true) {
        return Err(invalid(host, "missing host name"));
    }

    log::debug!("Resolved server root {} (from host {:?})", url, host);
    Ok(url)
}

fn invalid(host: &str, reason: &str) -> Error {
    Error::InvalidUrl { url: host.to_string(), reason: reason.to_string() }
}
