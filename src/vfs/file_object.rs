//! Handle to one file or folder of a [`FileSystem`].

use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::backend::{Attributes, FileType, ReadStream, Session, WriteStream};
use crate::capability::Capability;
use crate::core::Result;
use crate::error::Operation;
use crate::name::FileName;
use crate::vfs::FileSystem;
use crate::Error;

const UPLOAD_CHUNK: usize = 64 * 1024;

/// How a file object is opened.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// Truncates or creates the file.
    Write,
    /// Appends to the existing content.
    Append,
}

impl OpenMode {
    /// The capability a file system must report before a stream in this mode is opened.
    pub fn capability(&self) -> Capability {
        match self {
            OpenMode::Read => Capability::ReadContent,
            OpenMode::Write => Capability::WriteContent,
            OpenMode::Append => Capability::AppendContent,
        }
    }
}

enum State {
    Unopened,
    Reading(Box<dyn ReadStream>),
    Writing {
        mode: OpenMode,
        stream: Box<dyn WriteStream>,
    },
    Closed,
}

impl State {
    fn describe(&self) -> &'static str {
        match self {
            State::Unopened => "unopened",
            State::Reading(_) => "opened for reading",
            State::Writing { .. } => "opened for writing",
            State::Closed => "closed",
        }
    }
}

enum Stream {
    Read(Box<dyn ReadStream>),
    Write(Box<dyn WriteStream>),
}

/// A file or folder addressed by its [`FileName`].
///
/// Creating a file object never touches the backend. Content streams follow a
/// one-way lifecycle: `unopened -> opened -> closed`. Once closed, a file object cannot be
/// reopened; resolve the name again for a new one.
///
/// Every operation checks the owning file system's capabilities before calling the backend,
/// and fails with [`Error::StaleFileSystem`] once that file system has been closed or
/// dropped.
///
/// A file object is `Send` but not `Sync`: moving it across threads is fine, sharing one
/// between threads needs external synchronization.
pub struct FileObject {
    name: FileName,
    fs: Weak<FileSystem>,
    state: State,
}

impl FileObject {
    pub(crate) fn new(name: FileName, fs: &Arc<FileSystem>) -> Self {
        Self {
            name,
            fs: Arc::downgrade(fs),
            state: State::Unopened,
        }
    }

    pub fn name(&self) -> &FileName {
        &self.name
    }

    /// The owning file system, or [`Error::StaleFileSystem`] if it is gone or closed.
    pub fn file_system(&self) -> Result<Arc<FileSystem>> {
        self.live_file_system(Operation::Stat)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Reading(_) | State::Writing { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    pub fn mode(&self) -> Option<OpenMode> {
        match &self.state {
            State::Reading(_) => Some(OpenMode::Read),
            State::Writing { mode, .. } => Some(*mode),
            _ => None,
        }
    }

    /// Opens a content stream.
    ///
    /// Fails with [`Error::UnsupportedOperation`] when the file system lacks the capability
    /// of `mode`, without contacting the backend, and with [`Error::InvalidState`] unless
    /// the object is unopened.
    pub fn open(&mut self, mode: OpenMode) -> Result<()> {
        if !matches!(self.state, State::Unopened) {
            return Err(self.invalid_state(Operation::Open));
        }
        let fs = self.live_file_system(Operation::Open)?;
        let path = self.name.path();
        fs.require(mode.capability(), Operation::Open, path)?;

        let session = fs.session();
        let connect_error = |source| Error::BackendConnect {
            authority: self.name.authority().to_string(),
            source,
        };
        self.state = match mode {
            OpenMode::Read => State::Reading(session.open_read(path).map_err(connect_error)?),
            OpenMode::Write => State::Writing {
                mode,
                stream: session.open_write(path).map_err(connect_error)?,
            },
            OpenMode::Append => State::Writing {
                mode,
                stream: session.open_append(path).map_err(connect_error)?,
            },
        };
        debug!("opened {} for {:?}", self.name.path(), mode);
        Ok(())
    }

    /// Reads into `buf` from a stream opened with [`OpenMode::Read`].
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let fs = self.live_stream(Operation::Read)?;
        if let State::Reading(stream) = &mut self.state {
            return stream
                .read(buf)
                .map_err(|e| fs.backend_error(Operation::Read, self.name.path(), e.into()));
        }
        Err(self.invalid_state(Operation::Read))
    }

    /// Writes `buf` to a stream opened with [`OpenMode::Write`] or [`OpenMode::Append`].
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let fs = self.live_stream(Operation::Write)?;
        if let State::Writing { stream, .. } = &mut self.state {
            return stream
                .write(buf)
                .map_err(|e| fs.backend_error(Operation::Write, self.name.path(), e.into()));
        }
        Err(self.invalid_state(Operation::Write))
    }

    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.write(buf)? {
                0 => {
                    let fs = self.live_stream(Operation::Write)?;
                    return Err(fs.backend_error(
                        Operation::Write,
                        self.name.path(),
                        io::Error::from(io::ErrorKind::WriteZero).into(),
                    ));
                }
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        let fs = self.live_stream(Operation::Write)?;
        if let State::Writing { stream, .. } = &mut self.state {
            return stream
                .flush()
                .map_err(|e| fs.backend_error(Operation::Write, self.name.path(), e.into()));
        }
        Err(self.invalid_state(Operation::Write))
    }

    /// Moves the position of the open stream. Requires `random-access-read` on read streams
    /// and `random-access-write` on write streams.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let fs = self.live_stream(Operation::Seek)?;
        let path = self.name.path();
        let state = self.state.describe();
        match &mut self.state {
            State::Reading(stream) => {
                fs.require(Capability::RandomAccessRead, Operation::Seek, path)?;
                stream
                    .seek(pos)
                    .map_err(|e| fs.backend_error(Operation::Seek, path, e.into()))
            }
            State::Writing { stream, .. } => {
                fs.require(Capability::RandomAccessWrite, Operation::Seek, path)?;
                stream
                    .seek(pos)
                    .map_err(|e| fs.backend_error(Operation::Seek, path, e.into()))
            }
            State::Unopened | State::Closed => Err(Error::InvalidState {
                operation: Operation::Seek,
                path: path.to_string(),
                state,
            }),
        }
    }

    /// Closes the open stream. Idempotent, and a no-op on an unopened object.
    ///
    /// The stream is released even when the backend reports an error while closing it;
    /// the object ends up closed either way. When the owning file system is already gone,
    /// the stream is dropped without a backend call. For a write stream that means its
    /// content was never committed, reported as [`Error::StaleFileSystem`].
    pub fn close(&mut self) -> Result<()> {
        let stream = match std::mem::replace(&mut self.state, State::Closed) {
            State::Unopened => {
                self.state = State::Unopened;
                return Ok(());
            }
            State::Closed => return Ok(()),
            State::Reading(stream) => Stream::Read(stream),
            State::Writing { stream, .. } => Stream::Write(stream),
        };

        let fs = match self.live_file_system(Operation::Close) {
            Ok(fs) => fs,
            Err(e) => {
                return match stream {
                    Stream::Read(_) => {
                        debug!(
                            "dropped reader of {} after its file system closed",
                            self.name.path()
                        );
                        Ok(())
                    }
                    Stream::Write(_) => {
                        warn!("discarded uncommitted writes to {}", self.name.path());
                        Err(e)
                    }
                };
            }
        };
        let result = match stream {
            Stream::Read(mut stream) => stream.close(),
            Stream::Write(mut stream) => stream.close(),
        };
        debug!("closed {}", self.name.path());
        result.map_err(|source| fs.backend_error(Operation::Close, self.name.path(), source))
    }

    /// Reads the whole content: open, read to the end, close.
    pub fn read_content(&mut self) -> Result<Vec<u8>> {
        self.open(OpenMode::Read)?;
        let mut content = Vec::new();
        let mut buf = [0u8; 8192];
        let read = loop {
            match self.read(&mut buf) {
                Ok(0) => break Ok(()),
                Ok(n) => content.extend_from_slice(&buf[..n]),
                Err(e) => break Err(e),
            }
        };
        let closed = self.close();
        read?;
        closed?;
        Ok(content)
    }

    /// Replaces the whole content: open for writing, write, close.
    pub fn write_content(&mut self, content: &[u8]) -> Result<()> {
        self.open(OpenMode::Write)?;
        let written = self.write_all(content);
        let closed = self.close();
        written?;
        closed
    }

    /// Copies a host file into this file object. Requires an unopened object and
    /// `write-content`.
    pub fn upload_from(&mut self, local: &Path) -> Result<u64> {
        if !matches!(self.state, State::Unopened) {
            return Err(self.invalid_state(Operation::Upload));
        }
        let fs = self.live_file_system(Operation::Upload)?;
        fs.require(Capability::WriteContent, Operation::Upload, self.name.path())?;
        let mut source = File::open(local).map_err(|e| {
            fs.backend_error(
                Operation::Upload,
                self.name.path(),
                anyhow::Error::new(e).context(format!("cannot open {}", local.display())),
            )
        })?;

        self.open(OpenMode::Write)?;
        let copied = self.copy_from(&mut source, &fs);
        let closed = self.close();
        let copied = copied?;
        closed?;
        debug!("uploaded {} bytes from {} to {}", copied, local.display(), self.name.path());
        Ok(copied)
    }

    fn copy_from(&mut self, source: &mut File, fs: &FileSystem) -> Result<u64> {
        let mut buf = vec![0u8; UPLOAD_CHUNK];
        let mut total = 0u64;
        loop {
            let n = source
                .read(&mut buf)
                .map_err(|e| fs.backend_error(Operation::Upload, self.name.path(), e.into()))?;
            if n == 0 {
                return Ok(total);
            }
            self.write_all(&buf[..n])?;
            total += n as u64;
        }
    }

    /// True if the backend has a file or folder under this name.
    pub fn exists(&self) -> Result<bool> {
        self.metadata(Operation::GetType, Capability::GetType, |session, path| {
            session.exists(path)
        })
    }

    /// File type, [`FileType::Imaginary`] when nothing exists under this name.
    pub fn file_type(&self) -> Result<FileType> {
        self.metadata(Operation::GetType, Capability::GetType, |session, path| {
            Ok(session
                .stat(path)?
                .map(|attributes| attributes.file_type())
                .unwrap_or(FileType::Imaginary))
        })
    }

    pub fn attributes(&self) -> Result<Attributes> {
        self.metadata(Operation::Stat, Capability::GetAttributes, |session, path| {
            session
                .stat(path)?
                .ok_or_else(|| anyhow::anyhow!("{path} does not exist"))
        })
    }

    /// Content size in bytes.
    pub fn size(&self) -> Result<u64> {
        Ok(self.attributes()?.size())
    }

    pub fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        self.metadata(
            Operation::GetLastModified,
            Capability::GetLastModified,
            |session, path| {
                let attributes = session
                    .stat(path)?
                    .ok_or_else(|| anyhow::anyhow!("{path} does not exist"))?;
                Ok(attributes.last_modified())
            },
        )
    }

    /// Deletes the file, or the folder with everything below it.
    pub fn delete(&self) -> Result<()> {
        self.metadata(Operation::Delete, Capability::Delete, |session, path| {
            session.delete(path)
        })
    }

    /// Renames within the same file system. Names of another root fail with
    /// [`Error::UnsupportedOperation`].
    pub fn rename_to(&self, destination: &FileName) -> Result<()> {
        let fs = self.live_file_system(Operation::Rename)?;
        if !destination.is_descendant_of(fs.root_name()) {
            return Err(Error::UnsupportedOperation {
                operation: Operation::Rename,
                authority: destination.authority().to_string(),
                path: destination.path().to_string(),
            });
        }
        self.metadata(Operation::Rename, Capability::Rename, |session, path| {
            session.rename(path, destination.path())
        })
    }

    /// Creates this folder and any missing parents. No-op on an existing folder.
    pub fn create_folder(&self) -> Result<()> {
        self.metadata(Operation::CreateFolder, Capability::CreateFolder, |session, path| {
            session.mkdir(path)
        })
    }

    /// Names of the direct children, sorted.
    pub fn children(&self) -> Result<Vec<FileName>> {
        let entries = self.metadata(
            Operation::ListChildren,
            Capability::ListChildren,
            |session, path| session.list_children(path),
        )?;
        let mut names = entries
            .iter()
            .map(|entry| self.name.child(entry.name()))
            .collect::<Result<Vec<_>>>()?;
        names.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(names)
    }

    fn metadata<T>(
        &self,
        operation: Operation,
        capability: Capability,
        call: impl FnOnce(&dyn Session, &str) -> anyhow::Result<T>,
    ) -> Result<T> {
        if self.is_closed() {
            return Err(self.invalid_state(operation));
        }
        let fs = self.live_file_system(operation)?;
        let path = self.name.path();
        fs.require(capability, operation, path)?;
        call(fs.session().as_ref(), path).map_err(|source| fs.backend_error(operation, path, source))
    }

    fn live_file_system(&self, operation: Operation) -> Result<Arc<FileSystem>> {
        match self.fs.upgrade() {
            Some(fs) if !fs.is_closed() => Ok(fs),
            _ => Err(Error::StaleFileSystem {
                operation,
                authority: self.name.authority().to_string(),
                path: self.name.path().to_string(),
            }),
        }
    }

    fn live_stream(&self, operation: Operation) -> Result<Arc<FileSystem>> {
        if self.is_closed() {
            return Err(self.invalid_state(operation));
        }
        self.live_file_system(operation)
    }

    fn invalid_state(&self, operation: Operation) -> Error {
        Error::InvalidState {
            operation,
            path: self.name.path().to_string(),
            state: self.state.describe(),
        }
    }
}

impl Read for FileObject {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FileObject::read(self, buf).map_err(io::Error::from)
    }
}

impl Write for FileObject {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        FileObject::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        FileObject::flush(self).map_err(io::Error::from)
    }
}

impl Seek for FileObject {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        FileObject::seek(self, pos).map_err(io::Error::from)
    }
}

impl Debug for FileObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileObject")
            .field("name", &self.name)
            .field("state", &self.state.describe())
            .finish()
    }
}

impl Drop for FileObject {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                warn!("failed to close {} on drop: {}", self.name.path(), e);
            }
        }
    }
}
