use crate::name::{BucketNameParser, NameParser};
use crate::scheme::SchemeStrategy;

/// Amazon S3 style object stores: `s3://bucket/key`.
///
/// Credentials never appear in `s3` names; they come from the options or the client's
/// own credential chain.
pub struct S3 {
    parser: BucketNameParser,
}

impl S3 {
    pub fn new() -> Self {
        Self {
            parser: BucketNameParser::new("s3"),
        }
    }
}

impl Default for S3 {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeStrategy for S3 {
    fn scheme(&self) -> &'static str {
        "s3"
    }

    fn parser(&self) -> &dyn NameParser {
        &self.parser
    }
}

/// The legacy `s3n` scheme, which may embed `access-key:secret@` in names.
pub struct S3n {
    parser: BucketNameParser,
}

impl S3n {
    pub fn new() -> Self {
        Self {
            parser: BucketNameParser::new("s3n").with_credentials(),
        }
    }
}

impl Default for S3n {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeStrategy for S3n {
    fn scheme(&self) -> &'static str {
        "s3n"
    }

    fn parser(&self) -> &dyn NameParser {
        &self.parser
    }
}
