//! File system options.
//!
//! Options are an opaque key/value bag handed from the caller to file system construction
//! unchanged. The core only reads the few well-known keys below; everything else is passed
//! through to the [`Backend`](crate::backend::Backend).

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Duration;

use crate::name::Credentials;

/// Connection timeout in milliseconds, enforced by the backend session.
pub const CONNECT_TIMEOUT_MS: &str = "connect_timeout_ms";
/// Read timeout in milliseconds, enforced by the backend session.
pub const READ_TIMEOUT_MS: &str = "read_timeout_ms";
/// Credentials override: user name.
pub const USER: &str = "user";
/// Credentials override: password or secret key.
pub const PASSWORD: &str = "password";
/// When `true`, the file system creates its root folder (or bucket) if it is absent.
pub const CREATE_ROOT: &str = "create_root";

/// Read-only configuration passed to file system construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSystemOptions {
    values: BTreeMap<String, String>,
}

impl FileSystemOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> FileSystemOptionsBuilder {
        FileSystemOptionsBuilder::default()
    }

    /// Builds options from a plain map, as read from a config file or environment.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self {
            values: map.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.duration_ms(CONNECT_TIMEOUT_MS)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.duration_ms(READ_TIMEOUT_MS)
    }

    /// Credentials override, present when at least `user` is set.
    pub fn credentials(&self) -> Option<Credentials> {
        let user = self.get(USER)?;
        Some(Credentials::new(user, self.get(PASSWORD)))
    }

    pub fn create_root(&self) -> bool {
        self.get(CREATE_ROOT)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    fn duration_ms(&self, key: &str) -> Option<Duration> {
        let value = self.get(key)?;
        match value.trim().parse::<u64>() {
            Ok(ms) => Some(Duration::from_millis(ms)),
            Err(_) => {
                log::warn!("ignoring option {key}={value}: not a number of milliseconds");
                None
            }
        }
    }
}

/// Fluent builder for [`FileSystemOptions`].
#[derive(Debug, Clone, Default)]
pub struct FileSystemOptionsBuilder {
    values: BTreeMap<String, String>,
}

impl FileSystemOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an arbitrary key, passed through to the backend untouched.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn connect_timeout(self, timeout: Duration) -> Self {
        let ms = timeout.as_millis().to_string();
        self.set(CONNECT_TIMEOUT_MS, ms)
    }

    pub fn read_timeout(self, timeout: Duration) -> Self {
        let ms = timeout.as_millis().to_string();
        self.set(READ_TIMEOUT_MS, ms)
    }

    /// Overrides the credentials embedded in the file name, if any.
    pub fn credentials(self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.set(USER, user).set(PASSWORD, password)
    }

    pub fn create_root(self, create: bool) -> Self {
        self.set(CREATE_ROOT, create.to_string())
    }

    pub fn build(self) -> FileSystemOptions {
        FileSystemOptions {
            values: self.values,
        }
    }
}
