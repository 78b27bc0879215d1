//! Support for backend configuration options

use std::fmt::{Debug, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The PRODID written into every iCal file generated by this crate
pub const PRODUCT_ID: &str = "-//taskdav//taskdav//EN";

/// How many idle connections are kept alive per host
pub const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;
/// How long an idle connection is kept before being closed
pub const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(90);
/// Overall timeout of a single request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the calendar home of a user (relative to the server root). `{}` is replaced by the user name.
pub(crate) const CALENDAR_HOME_PATH: &str = "/remote.php/dav/calendars/{}/";
/// Path of the OCS endpoint that manages shares
pub(crate) const OCS_SHARES_PATH: &str = "/ocs/v2.php/apps/files_sharing/api/v1/shares";

/// Settings needed to connect to a groupware server.
///
/// Credentials are expected to be already resolved by the caller.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Either a bare host (`cloud.example.com:8443`) or a full URL (`http://cloud.example.com`)
    pub host: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// The password is managed by an external credential store, so an empty `password` is fine
    #[serde(default)]
    pub use_keyring: bool,
    /// Use `http` rather than `https` when `host` has no explicit scheme
    #[serde(default)]
    pub allow_http: bool,
    /// Do not validate TLS certificates
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

impl BackendConfig {
    pub fn new<S: ToString, T: ToString, U: ToString>(host: S, username: T, password: U) -> Self {
        Self {
            host: host.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..Self::default()
        }
    }

    /// Check every required value is present. This never touches the network
    pub fn validate(&self) -> Result<(), Error> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host is required".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(Error::Config("username is required".to_string()));
        }
        if self.password.is_empty() && self.use_keyring == false {
            return Err(Error::Config("password is required (or use_keyring must be set)".to_string()));
        }
        Ok(())
    }
}

impl Debug for BackendConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("use_keyring", &self.use_keyring)
            .field("allow_http", &self.allow_http)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(BackendConfig::new("h", "bob", "secret").validate().is_ok());
        assert!(BackendConfig::new("", "bob", "secret").validate().is_err());
        assert!(BackendConfig::new("h", " ", "secret").validate().is_err());
        assert!(BackendConfig::new("h", "bob", "").validate().is_err());

        let keyring = BackendConfig {
            use_keyring: true,
            ..BackendConfig::new("h", "bob", "")
        };
        assert!(keyring.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = BackendConfig::new("h", "bob", "hunter2");
        let printed = format!("{:?}", config);
        assert!(printed.contains("hunter2") == false);
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: BackendConfig = serde_json::from_str(r#"{"host": "h", "username": "bob"}"#).unwrap();
        assert_eq!(config.password, "");
        assert_eq!(config.allow_http, false);
        assert!(config.validate().is_err());
    }
}
