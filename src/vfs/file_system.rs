//! A file system owns the backend session of one root authority.

use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use log::{debug, info, warn};

use crate::backend::{Backend, Session};
use crate::capability::{Capability, CapabilitySet};
use crate::core::Result;
use crate::error::Operation;
use crate::name::FileName;
use crate::options::FileSystemOptions;
use crate::scheme::SchemeStrategy;
use crate::vfs::FileObject;
use crate::Error;

/// Session to one backend root, shared by every [`FileObject`] below that root.
///
/// ### Capabilities
///
/// The capability set is the strategy's registered set plus whatever a single runtime probe
/// of the backend adds (e.g. `append-content` when HDFS reports `dfs.support.append=true`).
/// The probe runs on first use and its result is kept for the lifetime of the file system.
///
/// ### Lifecycle
///
/// Closing releases the session. File objects created earlier stay around but every
/// operation on them fails with [`Error::StaleFileSystem`]. Dropping an unclosed file
/// system closes its session.
pub struct FileSystem {
    root: FileName,
    session: Arc<dyn Session>,
    options: FileSystemOptions,
    strategy: Arc<dyn SchemeStrategy>,
    probed: OnceLock<CapabilitySet>,
    closed: AtomicBool,
}

impl FileSystem {
    /// Wraps an already established session. No I/O happens here.
    pub fn new(
        strategy: Arc<dyn SchemeStrategy>,
        root: FileName,
        session: Arc<dyn Session>,
        options: FileSystemOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            root: root.root(),
            session,
            options,
            strategy,
            probed: OnceLock::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Connects to the authority of `root` and builds a file system on top of the session.
    ///
    /// Credentials from the options override those embedded in the name. With the
    /// `create_root` option set, the root folder or bucket is created when absent.
    pub fn connect(
        strategy: Arc<dyn SchemeStrategy>,
        backend: &dyn Backend,
        root: &FileName,
        options: FileSystemOptions,
    ) -> Result<Arc<Self>> {
        let credentials = options
            .credentials()
            .or_else(|| root.credentials().cloned());
        let session = backend
            .connect(root.authority(), credentials.as_ref(), &options)
            .map_err(|source| Error::BackendConnect {
                authority: root.authority().to_string(),
                source,
            })?;

        let fs = Self::new(strategy, root.clone(), session, options);
        info!("connected to {}", fs.display_root());
        if fs.options.create_root() {
            fs.ensure_root()?;
        }
        Ok(fs)
    }

    pub fn root_name(&self) -> &FileName {
        &self.root
    }

    pub fn scheme(&self) -> &str {
        self.root.scheme()
    }

    pub fn options(&self) -> &FileSystemOptions {
        &self.options
    }

    /// The backend session owned by this file system.
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Merges the registered capabilities and the probed ones into `target`.
    /// Never removes anything already in `target`.
    pub fn add_capabilities(&self, target: &mut CapabilitySet) {
        *target |= self.strategy.capabilities();
        *target |= self.probed_capabilities();
    }

    pub fn capabilities(&self) -> CapabilitySet {
        let mut capabilities = CapabilitySet::default();
        self.add_capabilities(&mut capabilities);
        capabilities
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }

    /// Builds a file object for `name`. Pure construction: the object connects lazily.
    ///
    /// Only the path of `name` is used; the object is addressed under this file system's
    /// root, so a name carrying another password of the same user gets the root's one.
    pub fn create_file_object(self: &Arc<Self>, name: FileName) -> FileObject {
        FileObject::new(name.rebase(&self.root), self)
    }

    /// Resolves `path` (absolute URI, absolute path or path relative to the root) to a
    /// file object of this file system.
    pub fn resolve_file(self: &Arc<Self>, path: &str) -> Result<FileObject> {
        let name = self.strategy.parser().parse(path, Some(&self.root))?;
        if !name.is_descendant_of(&self.root) {
            return Err(Error::malformed(
                path,
                format!("name does not belong to {}", self.display_root()),
            ));
        }
        Ok(self.create_file_object(name))
    }

    /// Creates the root folder (or bucket) if it does not exist yet.
    pub fn ensure_root(&self) -> Result<()> {
        self.check_open(Operation::CreateFolder, "/")?;
        self.require(Capability::CreateFolder, Operation::CreateFolder, "/")?;
        let exists = self
            .session
            .exists("/")
            .map_err(|source| self.backend_error(Operation::Stat, "/", source))?;
        if !exists {
            debug!("creating root of {}", self.display_root());
            self.session
                .mkdir("/")
                .map_err(|source| self.backend_error(Operation::CreateFolder, "/", source))?;
        }
        Ok(())
    }

    /// Releases the session. Idempotent.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("closing {}", self.display_root());
        self.session
            .close()
            .map_err(|source| self.backend_error(Operation::CloseFileSystem, "/", source))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn check_open(&self, operation: Operation, path: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::StaleFileSystem {
                operation,
                authority: self.root.authority().to_string(),
                path: path.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn require(
        &self,
        capability: Capability,
        operation: Operation,
        path: &str,
    ) -> Result<()> {
        if self.has_capability(capability) {
            return Ok(());
        }
        Err(Error::UnsupportedOperation {
            operation,
            authority: self.root.authority().to_string(),
            path: path.to_string(),
        })
    }

    pub(crate) fn backend_error(
        &self,
        operation: Operation,
        path: &str,
        source: anyhow::Error,
    ) -> Error {
        Error::BackendIo {
            operation,
            authority: self.root.authority().to_string(),
            path: path.to_string(),
            source,
        }
    }

    fn probed_capabilities(&self) -> CapabilitySet {
        if let Some(probed) = self.probed.get() {
            return *probed;
        }
        if self.is_closed() {
            return CapabilitySet::default();
        }
        *self.probed.get_or_init(|| {
            let extra = self.strategy.probe(self.session.as_ref());
            debug!("probed {}: {:?}", self.display_root(), extra);
            extra
        })
    }

    fn display_root(&self) -> String {
        self.strategy.authority_key(&self.root)
    }
}

impl Debug for FileSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystem")
            .field("root", &self.root)
            .field("options", &self.options.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for FileSystem {
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Err(e) = self.close() {
                warn!("failed to close {}: {}", self.display_root(), e);
            }
        }
    }
}
