//! Backend session collaborators.
//!
//! The core never talks to storage itself: a [`Backend`] connects to one authority and
//! returns a [`Session`] which performs every wire-level call. Real HDFS or S3 clients
//! plug in by implementing these two traits; the crate ships an in-memory backend and a
//! host-directory backend.
//!
//! Backend calls may block on network I/O. Timeouts belong to the session and are
//! configured from the options passed to [`Backend::connect`].

mod entry;
pub mod local;
pub mod memory;

pub use entry::{Attributes, DirEntry, FileType};
pub use local::LocalBackend;
pub use memory::{BackendStats, MemoryBackend};

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::name::{Authority, Credentials};
use crate::options::FileSystemOptions;

/// Readable byte stream returned by [`Session::open_read`].
pub trait ReadStream: Read + Seek + Send {
    /// Releases the stream on the backend. Called exactly once.
    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writable byte stream returned by [`Session::open_write`] and [`Session::open_append`].
pub trait WriteStream: Write + Send {
    /// Repositions the write cursor. Backends without random-access writes keep the default.
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stream does not support random access writes",
        ))
    }

    /// Flushes and commits the written content, then releases the stream. Called exactly once.
    fn close(&mut self) -> anyhow::Result<()>;
}

/// Connects to a storage authority.
pub trait Backend: Send + Sync {
    fn connect(
        &self,
        authority: &Authority,
        credentials: Option<&Credentials>,
        options: &FileSystemOptions,
    ) -> anyhow::Result<Arc<dyn Session>>;
}

/// An established connection to one authority. Paths are normalized absolute paths.
pub trait Session: Send + Sync {
    fn open_read(&self, path: &str) -> anyhow::Result<Box<dyn ReadStream>>;

    /// Opens a stream that creates or truncates `path`.
    fn open_write(&self, path: &str) -> anyhow::Result<Box<dyn WriteStream>>;

    /// Opens a stream that appends to `path`, creating it if needed.
    fn open_append(&self, path: &str) -> anyhow::Result<Box<dyn WriteStream>>;

    /// Reads a server-side configuration property.
    fn get_property(&self, key: &str, default: &str) -> String;

    /// Metadata of `path`, `None` if nothing exists there.
    fn stat(&self, path: &str) -> anyhow::Result<Option<Attributes>>;

    fn exists(&self, path: &str) -> anyhow::Result<bool> {
        Ok(self.stat(path)?.is_some())
    }

    /// Removes a file, or a folder with all its content.
    fn delete(&self, path: &str) -> anyhow::Result<()>;

    fn rename(&self, from: &str, to: &str) -> anyhow::Result<()>;

    /// Creates a folder and any missing parents. The root stands for the bucket or volume.
    fn mkdir(&self, path: &str) -> anyhow::Result<()>;

    fn list_children(&self, path: &str) -> anyhow::Result<Vec<DirEntry>>;

    fn close(&self) -> anyhow::Result<()>;
}
