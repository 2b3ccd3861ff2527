use crate::backend::Session;
use crate::capability::{Capability, CapabilitySet};
use crate::name::{HostNameParser, NameParser};
use crate::scheme::SchemeStrategy;

/// Cluster property telling whether appends are enabled server-side.
pub const DFS_SUPPORT_APPEND: &str = "dfs.support.append";

/// Hadoop Distributed File System: `hdfs://namenode[:port]/path`.
pub struct Hdfs {
    parser: HostNameParser,
}

impl Hdfs {
    pub fn new() -> Self {
        Self {
            parser: HostNameParser::new("hdfs"),
        }
    }
}

impl Default for Hdfs {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeStrategy for Hdfs {
    fn scheme(&self) -> &'static str {
        "hdfs"
    }

    fn parser(&self) -> &dyn NameParser {
        &self.parser
    }

    /// Adds `append-content` when the cluster reports `dfs.support.append=true`.
    fn probe(&self, session: &dyn Session) -> CapabilitySet {
        let value = session.get_property(DFS_SUPPORT_APPEND, "true");
        log::debug!("{DFS_SUPPORT_APPEND}={value}");
        if value.trim().eq_ignore_ascii_case("true") {
            Capability::AppendContent.into()
        } else {
            CapabilitySet::default()
        }
    }
}
