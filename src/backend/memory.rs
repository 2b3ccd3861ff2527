//! In-process backend that simulates named remote stores.
//!
//! Each authority (an HDFS namenode, an S3 bucket, ...) maps to its own [`Store`], a map of
//! normalized paths to entries. The backend records how often it is called and can inject
//! failures, which makes it the reference collaborator for testing providers.
//!
//! ### Store invariants
//!
//! 1. **Root existence**: the path `/` is always present and is a directory.
//! 2. **Path normalization**: all keys are absolute, normalized paths.
//! 3. **Parent consistency**: every entry except `/` has a directory entry as parent.
//!
//! ### Example
//!
//! ```
//! use remote_vfs::backend::MemoryBackend;
//!
//! let backend = MemoryBackend::new();
//! backend.put("namenode:8020", "/data/file.csv", b"a,b\n1,2\n");
//! backend.set_property("namenode:8020", "dfs.support.append", "false");
//! assert_eq!(backend.get("namenode:8020", "/data/file.csv").unwrap(), b"a,b\n1,2\n");
//! ```

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{anyhow, bail};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::backend::{Attributes, Backend, DirEntry, FileType, ReadStream, Session, WriteStream};
use crate::name::{Authority, Credentials};
use crate::options::FileSystemOptions;

/// Snapshot of the backend call counters.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BackendStats {
    pub connects: usize,
    pub session_closes: usize,
    pub stream_opens: usize,
    pub stream_closes: usize,
    pub property_reads: usize,
}

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    session_closes: AtomicUsize,
    stream_opens: AtomicUsize,
    stream_closes: AtomicUsize,
    property_reads: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    refuse_connections: bool,
    fail_opens: bool,
    fail_io: bool,
    connect_delay: Option<Duration>,
}

#[derive(Default)]
struct Shared {
    stores: Mutex<FxHashMap<String, Arc<RwLock<Store>>>>,
    counters: Counters,
    faults: Mutex<Faults>,
}

impl Shared {
    fn check_io(&self) -> io::Result<()> {
        if self.faults.lock().fail_io {
            return Err(io::Error::other("injected i/o failure"));
        }
        Ok(())
    }

    fn store(&self, authority: &str) -> Arc<RwLock<Store>> {
        self.stores
            .lock()
            .entry(authority.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Store::new())))
            .clone()
    }
}

/// In-memory [`Backend`]. Cloning yields a handle to the same stores.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    shared: Arc<Shared>,
}

impl MemoryBackend {
    /// Creates a backend with no stores. Stores are created on first use of their authority.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file, creating missing parent folders.
    pub fn put(&self, authority: &str, path: &str, content: &[u8]) {
        let store = self.shared.store(authority);
        let mut store = store.write();
        if let Err(e) = store.write_file(Path::new(path), content) {
            log::warn!("failed to seed {authority}{path}: {e}");
        }
    }

    /// Content of a file, `None` if absent or a folder.
    pub fn get(&self, authority: &str, path: &str) -> Option<Vec<u8>> {
        let store = self.shared.store(authority);
        let store = store.read();
        store.read(Path::new(path)).ok()
    }

    /// Sets a server-side property such as `dfs.support.append`.
    pub fn set_property(&self, authority: &str, key: &str, value: &str) {
        let store = self.shared.store(authority);
        store
            .write()
            .properties
            .insert(key.to_string(), value.to_string());
    }

    /// Requires these credentials when connecting to `authority`.
    pub fn set_credentials(&self, authority: &str, credentials: Credentials) {
        let store = self.shared.store(authority);
        store.write().credentials = Some(credentials);
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.shared.faults.lock().refuse_connections = refuse;
    }

    pub fn fail_opens(&self, fail: bool) {
        self.shared.faults.lock().fail_opens = fail;
    }

    /// Makes reads and writes of open streams fail, and write streams fail to commit.
    pub fn fail_io(&self, fail: bool) {
        self.shared.faults.lock().fail_io = fail;
    }

    /// Delays every `connect`, widening race windows in concurrency tests.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.shared.faults.lock().connect_delay = Some(delay);
    }

    pub fn stats(&self) -> BackendStats {
        let counters = &self.shared.counters;
        BackendStats {
            connects: counters.connects.load(Ordering::SeqCst),
            session_closes: counters.session_closes.load(Ordering::SeqCst),
            stream_opens: counters.stream_opens.load(Ordering::SeqCst),
            stream_closes: counters.stream_closes.load(Ordering::SeqCst),
            property_reads: counters.property_reads.load(Ordering::SeqCst),
        }
    }
}

impl Backend for MemoryBackend {
    fn connect(
        &self,
        authority: &Authority,
        credentials: Option<&Credentials>,
        _options: &FileSystemOptions,
    ) -> anyhow::Result<Arc<dyn Session>> {
        let (refuse, delay) = {
            let faults = self.shared.faults.lock();
            (faults.refuse_connections, faults.connect_delay)
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.shared.counters.connects.fetch_add(1, Ordering::SeqCst);
        if refuse {
            bail!("connection refused by {authority}");
        }

        let key = authority.to_string();
        let store = self.shared.store(&key);
        if let Some(required) = &store.read().credentials {
            if credentials != Some(required) {
                bail!("authentication failed for {authority}");
            }
        }

        Ok(Arc::new(MemorySession {
            authority: key,
            store,
            shared: self.shared.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct MemorySession {
    authority: String,
    store: Arc<RwLock<Store>>,
    shared: Arc<Shared>,
    closed: AtomicBool,
}

impl MemorySession {
    fn check_open(&self) -> anyhow::Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            bail!("session to {} is closed", self.authority);
        }
        Ok(())
    }

    fn check_stream_open(&self, path: &str) -> anyhow::Result<()> {
        self.check_open()?;
        if self.shared.faults.lock().fail_opens {
            bail!("{}: stream rejected for {path}", self.authority);
        }
        Ok(())
    }

    fn open_writer(&self, path: &str, append: bool) -> anyhow::Result<Box<dyn WriteStream>> {
        self.check_stream_open(path)?;
        let inner = Path::new(path);
        if self.store.read().is_dir(inner) {
            bail!("{path} is a directory");
        }
        self.shared
            .counters
            .stream_opens
            .fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryWriter {
            path: inner.to_path_buf(),
            buffer: Cursor::new(Vec::new()),
            append,
            store: self.store.clone(),
            shared: self.shared.clone(),
        }))
    }
}

impl Session for MemorySession {
    fn open_read(&self, path: &str) -> anyhow::Result<Box<dyn ReadStream>> {
        self.check_stream_open(path)?;
        let content = self.store.read().read(Path::new(path))?;
        self.shared
            .counters
            .stream_opens
            .fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryReader {
            cursor: Cursor::new(content),
            shared: self.shared.clone(),
        }))
    }

    fn open_write(&self, path: &str) -> anyhow::Result<Box<dyn WriteStream>> {
        self.open_writer(path, false)
    }

    fn open_append(&self, path: &str) -> anyhow::Result<Box<dyn WriteStream>> {
        self.open_writer(path, true)
    }

    fn get_property(&self, key: &str, default: &str) -> String {
        self.shared
            .counters
            .property_reads
            .fetch_add(1, Ordering::SeqCst);
        self.store
            .read()
            .properties
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn stat(&self, path: &str) -> anyhow::Result<Option<Attributes>> {
        self.check_open()?;
        Ok(self.store.read().stat(Path::new(path)))
    }

    fn delete(&self, path: &str) -> anyhow::Result<()> {
        self.check_open()?;
        self.store.write().rm(Path::new(path))
    }

    fn rename(&self, from: &str, to: &str) -> anyhow::Result<()> {
        self.check_open()?;
        self.store.write().rename(Path::new(from), Path::new(to))
    }

    fn mkdir(&self, path: &str) -> anyhow::Result<()> {
        self.check_open()?;
        let mut store = self.store.write();
        let inner = Path::new(path);
        if store.is_dir(inner) {
            return Ok(());
        }
        store.mkdir(inner)
    }

    fn list_children(&self, path: &str) -> anyhow::Result<Vec<DirEntry>> {
        self.check_open()?;
        self.store.read().ls(Path::new(path))
    }

    fn close(&self) -> anyhow::Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shared
                .counters
                .session_closes
                .fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct MemoryReader {
    cursor: Cursor<Vec<u8>>,
    shared: Arc<Shared>,
}

impl Read for MemoryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.shared.check_io()?;
        self.cursor.read(buf)
    }
}

impl Seek for MemoryReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl ReadStream for MemoryReader {
    fn close(&mut self) -> anyhow::Result<()> {
        self.shared
            .counters
            .stream_closes
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Buffers written bytes and commits them on close, the way object stores publish uploads.
struct MemoryWriter {
    path: PathBuf,
    buffer: Cursor<Vec<u8>>,
    append: bool,
    store: Arc<RwLock<Store>>,
    shared: Arc<Shared>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.shared.check_io()?;
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteStream for MemoryWriter {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.seek(pos)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.shared
            .counters
            .stream_closes
            .fetch_add(1, Ordering::SeqCst);
        let content = std::mem::take(self.buffer.get_mut());
        if self.shared.faults.lock().fail_io {
            bail!("failed to commit {}", self.path.display());
        }
        let mut store = self.store.write();
        if self.append && store.is_file(&self.path) {
            store.append(&self.path, &content)
        } else {
            store.write_file(&self.path, &content)
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum EntryType {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    entry_type: EntryType,
    content: Vec<u8>,
    modified: DateTime<Utc>,
}

impl Entry {
    fn new(entry_type: EntryType) -> Entry {
        Entry {
            entry_type,
            content: Vec::new(),
            modified: Utc::now(),
        }
    }

    fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    fn set_content(&mut self, content: &[u8]) {
        self.content = content.to_vec();
        self.modified = Utc::now();
    }

    fn append_content(&mut self, content: &[u8]) {
        self.content.extend_from_slice(content);
        self.modified = Utc::now();
    }

    fn file_type(&self) -> FileType {
        match self.entry_type {
            EntryType::File => FileType::File,
            EntryType::Directory => FileType::Directory,
        }
    }
}

/// One simulated remote store: a map of inner absolute normalized paths to entries.
struct Store {
    entries: BTreeMap<PathBuf, Entry>,
    properties: FxHashMap<String, String>,
    credentials: Option<Credentials>,
}

impl Store {
    fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::new(EntryType::Directory));
        Self {
            entries,
            properties: FxHashMap::default(),
            credentials: None,
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.entries.get(path).is_some_and(Entry::is_dir)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.entries.get(path).is_some_and(|e| !e.is_dir())
    }

    fn stat(&self, path: &Path) -> Option<Attributes> {
        self.entries.get(path).map(|entry| {
            Attributes::new(
                entry.file_type(),
                entry.content.len() as u64,
                Some(entry.modified),
            )
        })
    }

    /// Immediate children of the directory `path`.
    fn ls(&self, path: &Path) -> anyhow::Result<Vec<DirEntry>> {
        if !self.exists(path) {
            bail!("{} does not exist", path.display());
        }
        if !self.is_dir(path) {
            bail!("{} is not a directory", path.display());
        }
        let component_count = path.components().count() + 1;
        Ok(self
            .entries
            .iter()
            .filter(|(pb, _)| {
                pb.starts_with(path) && pb.as_path() != path && pb.components().count() == component_count
            })
            .filter_map(|(pb, entry)| {
                let name = pb.file_name()?.to_str()?;
                Some(DirEntry::new(name, entry.file_type()))
            })
            .collect())
    }

    /// Creates a directory and all its parents (if needed).
    fn mkdir(&mut self, path: &Path) -> anyhow::Result<()> {
        if self.exists(path) {
            bail!("path already exists: {}", path.display());
        }

        // Looking for the first existing parent
        let mut existed_parent = path.to_path_buf();
        while let Some(parent) = existed_parent.parent() {
            let parent_buf = parent.to_path_buf();
            if self.exists(parent) {
                existed_parent = parent_buf;
                break;
            }
            existed_parent = parent_buf;
        }
        if !self.is_dir(&existed_parent) {
            bail!("{} is not a directory", existed_parent.display());
        }

        let need_to_create: Vec<_> = path.strip_prefix(&existed_parent)?.components().collect();
        let mut built = existed_parent;
        for component in need_to_create {
            built.push(component);
            if !self.exists(&built) {
                self.entries
                    .insert(built.clone(), Entry::new(EntryType::Directory));
            }
        }
        Ok(())
    }

    /// Creates or truncates a file, creating missing parents.
    fn write_file(&mut self, path: &Path, content: &[u8]) -> anyhow::Result<()> {
        if self.is_dir(path) {
            bail!("{} is a directory", path.display());
        }
        if let Some(parent) = path.parent() {
            if !self.exists(parent) {
                self.mkdir(parent)?;
            } else if !self.is_dir(parent) {
                bail!("{} is not a directory", parent.display());
            }
        }
        self.entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Entry::new(EntryType::File))
            .set_content(content);
        Ok(())
    }

    fn read(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        match self.entries.get(path) {
            None => Err(anyhow!("{} does not exist", path.display())),
            Some(entry) if entry.is_dir() => Err(anyhow!("{} is a directory", path.display())),
            Some(entry) => Ok(entry.content.clone()),
        }
    }

    fn append(&mut self, path: &Path, content: &[u8]) -> anyhow::Result<()> {
        match self.entries.get_mut(path) {
            None => Err(anyhow!("{} does not exist", path.display())),
            Some(entry) if entry.is_dir() => Err(anyhow!("{} is a directory", path.display())),
            Some(entry) => {
                entry.append_content(content);
                Ok(())
            }
        }
    }

    /// Removes a file or a directory with all its content. The root cannot be removed.
    fn rm(&mut self, path: &Path) -> anyhow::Result<()> {
        if path == Path::new("/") {
            bail!("invalid path: the root cannot be removed");
        }
        if !self.exists(path) {
            bail!("{} does not exist", path.display());
        }
        self.entries.retain(|pb, _| !pb.starts_with(path));
        Ok(())
    }

    /// Moves a file or a directory with all its content.
    fn rename(&mut self, from: &Path, to: &Path) -> anyhow::Result<()> {
        if from == Path::new("/") {
            bail!("invalid path: the root cannot be renamed");
        }
        if !self.exists(from) {
            bail!("{} does not exist", from.display());
        }
        if self.exists(to) {
            bail!("{} already exists", to.display());
        }
        if to.starts_with(from) {
            bail!("cannot move {} into itself", from.display());
        }
        if let Some(parent) = to.parent() {
            if !self.exists(parent) {
                self.mkdir(parent)?;
            }
        }

        let moved: Vec<PathBuf> = self
            .entries
            .keys()
            .filter(|pb| pb.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(entry) = self.entries.remove(&old) {
                let relative = old.strip_prefix(from)?;
                let new = if relative.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(relative)
                };
                self.entries.insert(new, entry);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NN: &str = "namenode:8020";

    fn authority() -> Authority {
        Authority::new("namenode", Some(8020))
    }

    fn connect(backend: &MemoryBackend) -> Arc<dyn Session> {
        backend
            .connect(&authority(), None, &FileSystemOptions::new())
            .unwrap()
    }

    mod store {
        use super::*;

        fn setup_test_store() -> Store {
            let mut store = Store::new();
            store.mkdir(Path::new("/data/in")).unwrap();
            store.write_file(Path::new("/data/in/a.csv"), b"a").unwrap();
            store.write_file(Path::new("/data/b.csv"), b"bb").unwrap();
            store
        }

        #[test]
        fn test_new_store_has_root() {
            let store = Store::new();
            assert!(store.is_dir(Path::new("/")));
            assert_eq!(store.entries.len(), 1);
        }

        #[test]
        fn test_mkdir_creates_parents() -> anyhow::Result<()> {
            let mut store = Store::new();
            store.mkdir(Path::new("/a/b/c"))?;
            assert!(store.is_dir(Path::new("/a")));
            assert!(store.is_dir(Path::new("/a/b")));
            assert!(store.is_dir(Path::new("/a/b/c")));
            assert!(store.mkdir(Path::new("/a/b")).is_err());
            Ok(())
        }

        #[test]
        fn test_mkdir_under_file_fails() -> anyhow::Result<()> {
            let mut store = setup_test_store();
            assert!(store.mkdir(Path::new("/data/b.csv/sub")).is_err());
            Ok(())
        }

        #[test]
        fn test_write_read_append() -> anyhow::Result<()> {
            let mut store = setup_test_store();
            assert_eq!(store.read(Path::new("/data/b.csv"))?, b"bb");
            store.write_file(Path::new("/data/b.csv"), b"new")?;
            store.append(Path::new("/data/b.csv"), b"er")?;
            assert_eq!(store.read(Path::new("/data/b.csv"))?, b"newer");
            assert!(store.read(Path::new("/data")).is_err());
            assert!(store.read(Path::new("/missing")).is_err());
            assert!(store.append(Path::new("/missing"), b"x").is_err());
            assert!(store.write_file(Path::new("/data"), b"x").is_err());
            Ok(())
        }

        #[test]
        fn test_ls_immediate_children() -> anyhow::Result<()> {
            let store = setup_test_store();
            let mut children = store.ls(Path::new("/data"))?;
            children.sort_by(|a, b| a.name().cmp(b.name()));
            assert_eq!(
                children,
                vec![
                    DirEntry::new("b.csv", FileType::File),
                    DirEntry::new("in", FileType::Directory),
                ]
            );
            assert!(store.ls(Path::new("/data/b.csv")).is_err());
            assert!(store.ls(Path::new("/nope")).is_err());
            Ok(())
        }

        #[test]
        fn test_rm_recursive() -> anyhow::Result<()> {
            let mut store = setup_test_store();
            store.rm(Path::new("/data/in"))?;
            assert!(!store.exists(Path::new("/data/in")));
            assert!(!store.exists(Path::new("/data/in/a.csv")));
            assert!(store.exists(Path::new("/data/b.csv")));
            assert!(store.rm(Path::new("/")).is_err());
            assert!(store.rm(Path::new("/data/in")).is_err());
            Ok(())
        }

        #[test]
        fn test_rename_directory() -> anyhow::Result<()> {
            let mut store = setup_test_store();
            store.rename(Path::new("/data/in"), Path::new("/archive/in"))?;
            assert_eq!(store.read(Path::new("/archive/in/a.csv"))?, b"a");
            assert!(!store.exists(Path::new("/data/in")));
            assert!(store.rename(Path::new("/data/b.csv"), Path::new("/archive")).is_err());
            assert!(store.rename(Path::new("/archive"), Path::new("/archive/x")).is_err());
            Ok(())
        }
    }

    mod session {
        use super::*;

        #[test]
        fn test_read_write_round() -> anyhow::Result<()> {
            let backend = MemoryBackend::new();
            let session = connect(&backend);

            let mut writer = session.open_write("/data/out.txt")?;
            writer.write_all(b"hello")?;
            assert_eq!(backend.get(NN, "/data/out.txt"), None);
            writer.close()?;
            assert_eq!(backend.get(NN, "/data/out.txt").unwrap(), b"hello");

            let mut appender = session.open_append("/data/out.txt")?;
            appender.write_all(b" world")?;
            appender.close()?;

            let mut reader = session.open_read("/data/out.txt")?;
            let mut content = String::new();
            reader.read_to_string(&mut content)?;
            reader.close()?;
            assert_eq!(content, "hello world");

            let stats = backend.stats();
            assert_eq!(stats.stream_opens, 3);
            assert_eq!(stats.stream_closes, 3);
            Ok(())
        }

        #[test]
        fn test_seek_on_writer() -> anyhow::Result<()> {
            let backend = MemoryBackend::new();
            let session = connect(&backend);
            let mut writer = session.open_write("/f")?;
            writer.write_all(b"xxxx")?;
            writer.seek(SeekFrom::Start(1))?;
            writer.write_all(b"yy")?;
            writer.close()?;
            assert_eq!(backend.get(NN, "/f").unwrap(), b"xyyx");
            Ok(())
        }

        #[test]
        fn test_properties_and_stat() -> anyhow::Result<()> {
            let backend = MemoryBackend::new();
            backend.set_property(NN, "dfs.support.append", "false");
            backend.put(NN, "/data/a.csv", b"1,2");
            let session = connect(&backend);

            assert_eq!(session.get_property("dfs.support.append", "true"), "false");
            assert_eq!(session.get_property("missing", "dflt"), "dflt");
            assert_eq!(backend.stats().property_reads, 2);

            let attrs = session.stat("/data/a.csv")?.unwrap();
            assert_eq!(attrs.file_type(), FileType::File);
            assert_eq!(attrs.size(), 3);
            assert!(attrs.last_modified().is_some());
            assert!(session.exists("/data")?);
            assert!(!session.exists("/nope")?);
            Ok(())
        }

        #[test]
        fn test_closed_session_rejects_calls() -> anyhow::Result<()> {
            let backend = MemoryBackend::new();
            let session = connect(&backend);
            session.close()?;
            session.close()?;
            assert_eq!(backend.stats().session_closes, 1);
            assert!(session.open_read("/x").is_err());
            assert!(session.stat("/").is_err());
            Ok(())
        }

        #[test]
        fn test_faults() {
            let backend = MemoryBackend::new();
            backend.refuse_connections(true);
            assert!(backend.connect(&authority(), None, &FileSystemOptions::new()).is_err());
            assert_eq!(backend.stats().connects, 1);

            backend.refuse_connections(false);
            backend.fail_opens(true);
            backend.put(NN, "/a", b"a");
            let session = connect(&backend);
            assert!(session.open_read("/a").is_err());
            assert!(session.open_write("/b").is_err());
            assert_eq!(backend.stats().stream_opens, 0);
        }

        #[test]
        fn test_io_faults() -> anyhow::Result<()> {
            let backend = MemoryBackend::new();
            backend.put(NN, "/a", b"a");
            let session = connect(&backend);
            let mut reader = session.open_read("/a")?;
            let mut writer = session.open_write("/b")?;

            backend.fail_io(true);
            assert!(reader.read(&mut [0u8; 1]).is_err());
            assert!(writer.write(b"b").is_err());
            assert!(writer.close().is_err());
            assert!(backend.get(NN, "/b").is_none());
            assert_eq!(backend.stats().stream_closes, 1);

            backend.fail_io(false);
            assert!(reader.read(&mut [0u8; 1]).is_ok());
            Ok(())
        }

        #[test]
        fn test_credentials_required() {
            let backend = MemoryBackend::new();
            let creds = Credentials::new("etl", Some("pw"));
            backend.set_credentials(NN, creds.clone());
            let options = FileSystemOptions::new();

            assert!(backend.connect(&authority(), None, &options).is_err());
            let wrong = Credentials::new("etl", Some("nope"));
            assert!(backend.connect(&authority(), Some(&wrong), &options).is_err());
            assert!(backend.connect(&authority(), Some(&creds), &options).is_ok());
        }
    }
}
