//! Structured file names and the parsers that build them.
//!
//! A raw URI such as `hdfs://etl@namenode:8020/data/../data/file.csv` is tokenized into
//! scheme, user info, authority and path by [`RawUri::split`], then a scheme-specific
//! [`NameParser`] turns the tokens into a [`FileName`]:
//!
//! ```text
//! hdfs://etl@namenode:8020/data/file.csv
//! └─┬┘   └┬┘ └─────┬────┘└──────┬──────┘
//! scheme user  authority      path (normalized)
//! ```
//!
//! Parsing is deterministic and idempotent: `parse(parse(u).to_string()) == parse(u)`.
//! Which parser applies is decided by the scheme when a provider is constructed.

mod bucket;
mod host;
mod local;

pub use bucket::BucketNameParser;
pub use host::HostNameParser;
pub use local::LocalNameParser;

use std::fmt::{Debug, Display, Formatter};

use crate::core::{Result, utils};
use crate::Error;

/// Host (or bucket) identifying part of a name. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Authority {
    host: String,
    port: Option<u16>,
}

impl Authority {
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Authority-less names, as used by the `file` scheme.
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }
}

impl Display for Authority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

/// User info embedded in a name (`user[:password]@`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    user: String,
    password: Option<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: Option<&str>) -> Self {
        Self {
            user: user.into(),
            password: password.map(str::to_string),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Display for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.password {
            Some(password) => write!(f, "{}:{}", self.user, password),
            None => f.write_str(&self.user),
        }
    }
}

/// Parsed, canonical representation of a raw scheme-qualified path.
///
/// The path is always absolute and normalized; names are never mutated after
/// construction, navigation methods return new names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName {
    scheme: String,
    credentials: Option<Credentials>,
    authority: Authority,
    path: String,
}

impl FileName {
    pub(crate) fn new(
        scheme: impl Into<String>,
        credentials: Option<Credentials>,
        authority: Authority,
        path: String,
    ) -> Self {
        debug_assert!(utils::normalize(&path).as_deref() == Some(path.as_str()));
        Self {
            scheme: scheme.into(),
            credentials,
            authority,
            path,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full URI form, the inverse of parsing.
    pub fn uri(&self) -> String {
        self.to_string()
    }

    /// Last path segment, empty for the root.
    pub fn base_name(&self) -> &str {
        utils::base_name(&self.path)
    }

    pub fn is_root(&self) -> bool {
        utils::is_root(&self.path)
    }

    /// The root name of the same scheme, credentials and authority.
    pub fn root(&self) -> FileName {
        self.with_path("/".to_string())
    }

    pub fn parent(&self) -> Option<FileName> {
        utils::parent(&self.path).map(|p| self.with_path(p.to_string()))
    }

    /// Name of a direct child. `name` must be a single path segment.
    pub fn child(&self, name: &str) -> Result<FileName> {
        let raw = format!("{self}/{name}");
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(Error::malformed(&raw, "child name must be a single path segment"));
        }
        check_chars(&raw, name)?;
        Ok(self.with_path(utils::join(&self.path, name)))
    }

    /// Resolves a relative (or absolute) path against this name as a directory.
    pub fn resolve(&self, path: &str) -> Result<FileName> {
        check_chars(path, path)?;
        match utils::resolve(&self.path, path) {
            Some(resolved) => Ok(self.with_path(resolved)),
            None => Err(Error::malformed(path, "path climbs above the root")),
        }
    }

    /// True if both names share a root and `self` lies at or below `ancestor`.
    /// Roots are told apart by user, never by password.
    pub fn is_descendant_of(&self, ancestor: &FileName) -> bool {
        self.scheme == ancestor.scheme
            && self.authority == ancestor.authority
            && self.credentials.as_ref().map(Credentials::user)
                == ancestor.credentials.as_ref().map(Credentials::user)
            && utils::starts_with(&self.path, &ancestor.path)
    }

    /// The same path under another root, e.g. the root of the file system serving it.
    pub fn rebase(&self, root: &FileName) -> FileName {
        root.with_path(self.path.clone())
    }

    fn with_path(&self, path: String) -> FileName {
        FileName {
            scheme: self.scheme.clone(),
            credentials: self.credentials.clone(),
            authority: self.authority.clone(),
            path,
        }
    }
}

impl Display for FileName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(credentials) = &self.credentials {
            write!(f, "{credentials}@")?;
        }
        write!(f, "{}{}", self.authority, self.path)
    }
}

/// Tokens of a raw `scheme://[user-info@]authority[/path]` string. Nothing is validated
/// beyond the scheme; interpreting the authority is up to each [`NameParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawUri<'a> {
    raw: &'a str,
    scheme: &'a str,
    user_info: Option<&'a str>,
    authority: &'a str,
    path: &'a str,
}

impl<'a> RawUri<'a> {
    /// Splits `raw` into tokens. Returns `Ok(None)` when `raw` carries no scheme prefix.
    pub fn split(raw: &'a str) -> Result<Option<RawUri<'a>>> {
        check_chars(raw, raw)?;
        let Some(scheme) = scheme_of(raw) else {
            return Ok(None);
        };
        let rest = &raw[scheme.len() + 3..];
        let (authority_part, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        let (user_info, authority) = match authority_part.rfind('@') {
            Some(idx) => (Some(&authority_part[..idx]), &authority_part[idx + 1..]),
            None => (None, authority_part),
        };
        Ok(Some(RawUri {
            raw,
            scheme,
            user_info,
            authority,
            path,
        }))
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn scheme(&self) -> &'a str {
        self.scheme
    }

    pub fn authority(&self) -> &'a str {
        self.authority
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn user_info(&self) -> Option<&'a str> {
        self.user_info
    }

    /// Parses the user info into credentials.
    pub fn credentials(&self) -> Result<Option<Credentials>> {
        let Some(user_info) = self.user_info else {
            return Ok(None);
        };
        let (user, password) = match user_info.split_once(':') {
            Some((user, password)) => (user, Some(password)),
            None => (user_info, None),
        };
        if user.is_empty() {
            return Err(Error::malformed(self.raw, "empty user name"));
        }
        Ok(Some(Credentials::new(user, password)))
    }

    /// The path in canonical absolute form.
    pub fn normalized_path(&self) -> Result<String> {
        utils::normalize(self.path)
            .ok_or_else(|| Error::malformed(self.raw, "path climbs above the root"))
    }

    /// Fails unless the scheme equals `expected` (ASCII case-insensitive).
    pub fn expect_scheme(&self, expected: &str) -> Result<()> {
        if self.scheme.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(Error::malformed(
                self.raw,
                format!("expected scheme `{expected}`, found `{}`", self.scheme),
            ))
        }
    }
}

/// Rejects text that could not survive a print-and-parse cycle of a name: control
/// characters, and `?` / `#` which would read as a query or fragment.
fn check_chars(raw: &str, text: &str) -> Result<()> {
    if text.chars().any(char::is_control) {
        return Err(Error::malformed(raw, "control characters are not allowed"));
    }
    if text.contains(['?', '#']) {
        return Err(Error::malformed(raw, "queries and fragments are not supported"));
    }
    Ok(())
}

/// Scheme prefix of a raw URI (the part before `://`), if it has a valid one.
pub fn scheme_of(raw: &str) -> Option<&str> {
    let idx = raw.find("://")?;
    let scheme = &raw[..idx];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// Turns a raw string into a structured [`FileName`] for one scheme.
///
/// Implementations only interpret the authority and path of an absolute URI; resolution
/// of scheme-less input against a base name is shared by all parsers.
pub trait NameParser: Send + Sync {
    /// The scheme this parser understands, lowercase.
    fn scheme(&self) -> &'static str;

    /// Builds a name from the tokens of an absolute URI whose scheme was already checked.
    fn parse_uri(&self, uri: &RawUri<'_>) -> Result<FileName>;

    /// Parses `raw`. Input without a scheme prefix is resolved against `base` as a
    /// directory, and is malformed when no base is given.
    fn parse(&self, raw: &str, base: Option<&FileName>) -> Result<FileName> {
        match RawUri::split(raw)? {
            Some(uri) => {
                uri.expect_scheme(self.scheme())?;
                let name = self.parse_uri(&uri)?;
                log::debug!("parsed {} as {:?}", uri.raw(), name);
                Ok(name)
            }
            None => {
                let Some(base) = base else {
                    return Err(Error::malformed(raw, "missing scheme prefix"));
                };
                if base.scheme() != self.scheme() {
                    return Err(Error::malformed(
                        raw,
                        format!("base name `{base}` is not a `{}` name", self.scheme()),
                    ));
                }
                base.resolve(raw)
            }
        }
    }
}
