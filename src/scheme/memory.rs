use crate::name::{HostNameParser, NameParser};
use crate::scheme::SchemeStrategy;

/// Scratch stores held by a [`MemoryBackend`](crate::backend::MemoryBackend): `mem://store/path`.
pub struct Memory {
    parser: HostNameParser,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            parser: HostNameParser::new("mem"),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeStrategy for Memory {
    fn scheme(&self) -> &'static str {
        "mem"
    }

    fn parser(&self) -> &dyn NameParser {
        &self.parser
    }
}
