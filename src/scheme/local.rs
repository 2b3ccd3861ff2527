use crate::name::{LocalNameParser, NameParser};
use crate::scheme::SchemeStrategy;

/// Host directories: `file:///path`.
#[derive(Default)]
pub struct Local {
    parser: LocalNameParser,
}

impl Local {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemeStrategy for Local {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn parser(&self) -> &dyn NameParser {
        &self.parser
    }
}
