//! A virtual file system over remote object stores and distributed file systems.
//!
//! ### Overview
//!
//! `remote-vfs` gives HDFS clusters, S3 buckets and host directories one file-object API.
//! Raw URIs such as `hdfs://namenode:8020/data/file.csv` or `s3://bucket/key` are parsed
//! into structured [`FileName`]s, routed to the [`Provider`] registered for their scheme,
//! and served by a [`FileSystem`] shared by every name under the same authority.
//!
//! **Key ideas**:
//! - **Capabilities**: every operation is checked against the file system's capability set
//!   before the backend is contacted. The set is a static table per scheme plus one
//!   memoized runtime probe (HDFS `dfs.support.append`).
//! - **One session per authority**: providers cache one file system per
//!   `scheme://[user@]authority`; concurrent first lookups connect exactly once.
//! - **Explicit lifecycle**: file objects go `unopened -> opened -> closed`, and operations
//!   on objects of a closed file system fail with [`Error::StaleFileSystem`].
//! - **Pluggable backends**: network clients implement [`backend::Backend`]; an in-memory
//!   backend and a host-directory backend ship with the crate.
//!
//! ### Example
//!
//! ```
//! use remote_vfs::backend::MemoryBackend;
//! use remote_vfs::{FileSystemManager, FileSystemOptions, Provider};
//!
//! # fn main() -> remote_vfs::Result<()> {
//! let backend = MemoryBackend::new();
//! backend.put("namenode:8020", "/data/file.csv", b"id,value\n");
//!
//! let manager = FileSystemManager::new();
//! manager.register(Provider::hdfs(backend));
//!
//! let mut file = manager.resolve_file("hdfs://namenode:8020/data/file.csv", &FileSystemOptions::new())?;
//! assert_eq!(file.read_content()?, b"id,value\n");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod capability;
mod core;
mod error;
pub mod name;
pub mod options;
pub mod scheme;
mod vfs;

pub use crate::core::{utils, Result};
pub use capability::{Capability, CapabilitySet};
pub use error::{Error, ErrorKind, Operation};
pub use name::FileName;
pub use options::FileSystemOptions;
pub use vfs::{FileObject, FileSystem, FileSystemManager, OpenMode, Provider};
