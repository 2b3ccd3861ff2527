use crate::core::Result;
use crate::name::{Authority, FileName, NameParser, RawUri};
use crate::Error;

/// Parser for `file:///path` names. The authority must be empty or `localhost`.
#[derive(Debug, Clone, Default)]
pub struct LocalNameParser;

impl NameParser for LocalNameParser {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn parse_uri(&self, uri: &RawUri<'_>) -> Result<FileName> {
        if uri.user_info().is_some() {
            return Err(Error::malformed(uri.raw(), "local names cannot carry credentials"));
        }
        let host = uri.authority();
        if !host.is_empty() && !host.eq_ignore_ascii_case("localhost") {
            return Err(Error::malformed(
                uri.raw(),
                format!("remote host `{host}` in a local name"),
            ));
        }
        let path = uri.normalized_path()?;
        Ok(FileName::new("file", None, Authority::new("", None), path))
    }
}
