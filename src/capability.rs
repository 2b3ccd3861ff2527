//! Capabilities and the static per-scheme registry.
//!
//! The registry is a fixed table: it is never queried against the network. A
//! [`FileSystem`](crate::FileSystem) may extend the registered set once, from a single
//! runtime probe of its backend, but it never removes a registered capability.

use std::fmt::{Display, Formatter};

use flagset::{FlagSet, flags};

flags! {
    /// A named operation a backend is known or detected to support.
    pub enum Capability: u16 {
        ReadContent,
        WriteContent,
        AppendContent,
        RandomAccessRead,
        RandomAccessWrite,
        Rename,
        Delete,
        GetAttributes,
        GetType,
        ListChildren,
        CreateFolder,
        GetLastModified,
    }
}

pub type CapabilitySet = FlagSet<Capability>;

impl Capability {
    /// All capabilities, in declaration order.
    pub const ALL: [Capability; 12] = [
        Capability::ReadContent,
        Capability::WriteContent,
        Capability::AppendContent,
        Capability::RandomAccessRead,
        Capability::RandomAccessWrite,
        Capability::Rename,
        Capability::Delete,
        Capability::GetAttributes,
        Capability::GetType,
        Capability::ListChildren,
        Capability::CreateFolder,
        Capability::GetLastModified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ReadContent => "read-content",
            Capability::WriteContent => "write-content",
            Capability::AppendContent => "append-content",
            Capability::RandomAccessRead => "random-access-read",
            Capability::RandomAccessWrite => "random-access-write",
            Capability::Rename => "rename",
            Capability::Delete => "delete",
            Capability::GetAttributes => "get-attributes",
            Capability::GetType => "get-type",
            Capability::ListChildren => "list-children",
            Capability::CreateFolder => "create-folder",
            Capability::GetLastModified => "get-last-modified",
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lists the members of `set` in declaration order.
pub fn members(set: CapabilitySet) -> Vec<Capability> {
    Capability::ALL
        .into_iter()
        .filter(|capability| set.contains(*capability))
        .collect()
}

/// Registered capabilities of `scheme`, `None` for an unknown scheme.
pub fn capabilities_for(scheme: &str) -> Option<CapabilitySet> {
    match scheme {
        "hdfs" => Some(hdfs()),
        "s3" | "s3n" => Some(s3()),
        "file" => Some(local()),
        "mem" => Some(memory()),
        _ => None,
    }
}

// Append is added by the `dfs.support.append` probe.
fn hdfs() -> CapabilitySet {
    Capability::ReadContent
        | Capability::WriteContent
        | Capability::RandomAccessRead
        | Capability::Rename
        | Capability::Delete
        | Capability::GetAttributes
        | Capability::GetType
        | Capability::ListChildren
        | Capability::CreateFolder
        | Capability::GetLastModified
}

fn s3() -> CapabilitySet {
    Capability::ReadContent
        | Capability::WriteContent
        | Capability::RandomAccessRead
        | Capability::Delete
        | Capability::GetAttributes
        | Capability::GetType
        | Capability::ListChildren
        | Capability::CreateFolder
        | Capability::GetLastModified
}

fn local() -> CapabilitySet {
    FlagSet::full()
}

fn memory() -> CapabilitySet {
    hdfs() | Capability::AppendContent | Capability::RandomAccessWrite
}
