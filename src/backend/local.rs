//! Backend that maps `file://` names onto a directory of the host file system.
//!
//! ### Key features:
//! - **Isolated root**: every inner path is resolved below the backend root. Inner paths
//!   are normalized by the name parser, so `..` can never escape it.
//! - **No tracking**: unlike object stores, the host directory is the single source of
//!   truth; nothing is cached between calls.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, bail};
use chrono::{DateTime, Utc};

use crate::backend::{Attributes, Backend, DirEntry, FileType, ReadStream, Session, WriteStream};
use crate::name::{Authority, Credentials};
use crate::options::FileSystemOptions;

/// A [`Backend`] rooted at an absolute host directory.
///
/// ### Example:
/// ```
/// use remote_vfs::backend::LocalBackend;
///
/// let root = std::env::temp_dir().join("remote_vfs_doc");
/// let backend = LocalBackend::new(&root).unwrap();
/// assert_eq!(backend.root(), root.as_path());
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf, // host-related absolute path
}

impl LocalBackend {
    /// * `root` must be absolute. It may not exist yet (see the `create_root` option),
    ///   but if it exists it must be a directory.
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            bail!("invalid root path: empty");
        }
        if root.is_relative() {
            bail!("the root path must be absolute");
        }
        if root.exists() && !root.is_dir() {
            bail!("{:?} is not a directory", root);
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Backend for LocalBackend {
    fn connect(
        &self,
        authority: &Authority,
        credentials: Option<&Credentials>,
        _options: &FileSystemOptions,
    ) -> anyhow::Result<Arc<dyn Session>> {
        if !authority.is_empty() {
            bail!("local backend cannot serve remote host {authority}");
        }
        if credentials.is_some() {
            log::debug!("local backend ignores credentials");
        }
        Ok(Arc::new(LocalSession {
            root: self.root.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct LocalSession {
    root: PathBuf,
    closed: AtomicBool,
}

impl LocalSession {
    /// Returns the host path of a normalized inner path.
    fn to_host(&self, inner: &str) -> anyhow::Result<PathBuf> {
        if self.closed.load(Ordering::SeqCst) {
            bail!("session to {} is closed", self.root.display());
        }
        Ok(self.root.join(inner.trim_start_matches('/')))
    }

    fn create_parent(host: &Path) -> anyhow::Result<()> {
        if let Some(parent) = host.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl Session for LocalSession {
    fn open_read(&self, path: &str) -> anyhow::Result<Box<dyn ReadStream>> {
        let host = self.to_host(path)?;
        if host.is_dir() {
            bail!("{path} is a directory");
        }
        Ok(Box::new(File::open(host)?))
    }

    fn open_write(&self, path: &str) -> anyhow::Result<Box<dyn WriteStream>> {
        let host = self.to_host(path)?;
        if host.is_dir() {
            bail!("{path} is a directory");
        }
        Self::create_parent(&host)?;
        Ok(Box::new(File::create(host)?))
    }

    fn open_append(&self, path: &str) -> anyhow::Result<Box<dyn WriteStream>> {
        let host = self.to_host(path)?;
        if host.is_dir() {
            bail!("{path} is a directory");
        }
        Self::create_parent(&host)?;
        let file = OpenOptions::new().create(true).append(true).open(host)?;
        Ok(Box::new(file))
    }

    fn get_property(&self, _key: &str, default: &str) -> String {
        default.to_string()
    }

    fn stat(&self, path: &str) -> anyhow::Result<Option<Attributes>> {
        let host = self.to_host(path)?;
        let metadata = match fs::metadata(&host) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let (file_type, size) = if metadata.is_dir() {
            (FileType::Directory, 0)
        } else {
            (FileType::File, metadata.len())
        };
        let last_modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        Ok(Some(Attributes::new(file_type, size, last_modified)))
    }

    fn delete(&self, path: &str) -> anyhow::Result<()> {
        if path == "/" {
            bail!("invalid path: the root cannot be removed");
        }
        let host = self.to_host(path)?;
        if host.is_dir() {
            fs::remove_dir_all(host)?;
        } else {
            fs::remove_file(host)?;
        }
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> anyhow::Result<()> {
        let from_host = self.to_host(from)?;
        let to_host = self.to_host(to)?;
        if to_host.exists() {
            bail!("{to} already exists");
        }
        Self::create_parent(&to_host)?;
        fs::rename(from_host, to_host)?;
        Ok(())
    }

    fn mkdir(&self, path: &str) -> anyhow::Result<()> {
        let host = self.to_host(path)?;
        if host.exists() && !host.is_dir() {
            bail!("path '{}' exists but is not a directory", path);
        }
        fs::create_dir_all(host)?;
        Ok(())
    }

    fn list_children(&self, path: &str) -> anyhow::Result<Vec<DirEntry>> {
        let host = self.to_host(path)?;
        let mut children = Vec::new();
        for entry in fs::read_dir(host)? {
            let entry = entry?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|name| anyhow!("non UTF-8 file name {name:?}"))?;
            let file_type = if entry.file_type()?.is_dir() {
                FileType::Directory
            } else {
                FileType::File
            };
            children.push(DirEntry::new(name, file_type));
        }
        Ok(children)
    }

    fn close(&self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl ReadStream for File {}

impl WriteStream for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(self, pos)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.flush()?;
        self.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use tempdir::TempDir;

    use super::*;

    fn setup_test_env() -> (TempDir, Arc<dyn Session>) {
        let tmp = TempDir::new("remote_vfs_local").unwrap();
        let backend = LocalBackend::new(tmp.path()).unwrap();
        let session = backend
            .connect(&Authority::new("", None), None, &FileSystemOptions::new())
            .unwrap();
        (tmp, session)
    }

    mod creations {
        use super::*;

        #[test]
        fn test_new_validates_root() {
            assert!(LocalBackend::new("").is_err());
            assert!(LocalBackend::new("relative/root").is_err());

            let tmp = TempDir::new("remote_vfs_local").unwrap();
            let file = tmp.path().join("file");
            fs::write(&file, b"x").unwrap();
            assert!(LocalBackend::new(&file).is_err());
            assert!(LocalBackend::new(tmp.path().join("missing")).is_ok());
        }

        #[test]
        fn test_connect_rejects_remote_host() {
            let tmp = TempDir::new("remote_vfs_local").unwrap();
            let backend = LocalBackend::new(tmp.path()).unwrap();
            let result = backend.connect(
                &Authority::new("server", None),
                None,
                &FileSystemOptions::new(),
            );
            assert!(result.is_err());
        }
    }

    mod streams {
        use super::*;

        #[test]
        fn test_write_append_read() -> anyhow::Result<()> {
            let (tmp, session) = setup_test_env();

            let mut writer = session.open_write("/docs/note.txt")?;
            writer.write_all(b"Hello")?;
            writer.close()?;

            let mut appender = session.open_append("/docs/note.txt")?;
            appender.write_all(b", World")?;
            appender.close()?;

            let mut reader = session.open_read("/docs/note.txt")?;
            let mut content = String::new();
            reader.read_to_string(&mut content)?;
            reader.close()?;

            assert_eq!(content, "Hello, World");
            assert_eq!(fs::read(tmp.path().join("docs/note.txt"))?, b"Hello, World");
            Ok(())
        }

        #[test]
        fn test_open_directory_fails() -> anyhow::Result<()> {
            let (_tmp, session) = setup_test_env();
            session.mkdir("/docs")?;
            assert!(session.open_read("/docs").is_err());
            assert!(session.open_write("/docs").is_err());
            assert!(session.open_read("/missing").is_err());
            Ok(())
        }
    }

    mod metadata {
        use super::*;

        #[test]
        fn test_stat_and_list() -> anyhow::Result<()> {
            let (tmp, session) = setup_test_env();
            fs::create_dir_all(tmp.path().join("project/src"))?;
            fs::write(tmp.path().join("project/Cargo.toml"), b"[package]")?;

            let attrs = session.stat("/project/Cargo.toml")?.unwrap();
            assert_eq!(attrs.file_type(), FileType::File);
            assert_eq!(attrs.size(), 9);
            assert!(attrs.last_modified().is_some());
            assert_eq!(
                session.stat("/project")?.map(|a| a.file_type()),
                Some(FileType::Directory)
            );
            assert_eq!(session.stat("/nope")?, None);

            let mut children = session.list_children("/project")?;
            children.sort_by(|a, b| a.name().cmp(b.name()));
            assert_eq!(
                children,
                vec![
                    DirEntry::new("Cargo.toml", FileType::File),
                    DirEntry::new("src", FileType::Directory),
                ]
            );
            Ok(())
        }

        #[test]
        fn test_mkdir_rename_delete() -> anyhow::Result<()> {
            let (tmp, session) = setup_test_env();
            session.mkdir("/a/b")?;
            session.mkdir("/a/b")?;
            fs::write(tmp.path().join("a/b/f.txt"), b"f")?;

            session.rename("/a/b", "/c/d")?;
            assert!(tmp.path().join("c/d/f.txt").exists());
            assert!(!tmp.path().join("a/b").exists());

            session.delete("/c")?;
            assert!(!tmp.path().join("c").exists());
            assert!(session.delete("/").is_err());
            Ok(())
        }

        #[test]
        fn test_closed_session() -> anyhow::Result<()> {
            let (_tmp, session) = setup_test_env();
            session.close()?;
            assert!(session.stat("/").is_err());
            Ok(())
        }
    }
}
