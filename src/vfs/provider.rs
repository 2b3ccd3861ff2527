use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::backend::{Backend, LocalBackend, MemoryBackend};
use crate::capability::CapabilitySet;
use crate::core::Result;
use crate::name::{self, FileName};
use crate::options::FileSystemOptions;
use crate::scheme::{Hdfs, Local, Memory, S3, S3n, SchemeStrategy};
use crate::vfs::{FileObject, FileSystem};
use crate::Error;

type Slot = Arc<Mutex<Option<Arc<FileSystem>>>>;

/// Factory for the file systems of one URI scheme.
///
/// Keeps at most one live [`FileSystem`] per authority key (`scheme://[user@]authority`).
/// The cache map itself is locked only long enough to find the slot of a key; connecting
/// happens under that slot's own lock, so concurrent lookups of one authority wait for a
/// single connect while lookups of other authorities proceed.
///
/// The options of the first resolution of an authority are the ones its file system keeps;
/// later resolutions of the same authority share that instance whatever options they pass.
pub struct Provider {
    strategy: Arc<dyn SchemeStrategy>,
    backend: Arc<dyn Backend>,
    slots: Mutex<FxHashMap<String, Slot>>,
    constructed: AtomicUsize,
}

impl Provider {
    pub fn new(strategy: impl SchemeStrategy + 'static, backend: impl Backend + 'static) -> Self {
        Self {
            strategy: Arc::new(strategy),
            backend: Arc::new(backend),
            slots: Mutex::new(FxHashMap::default()),
            constructed: AtomicUsize::new(0),
        }
    }

    pub fn hdfs(backend: impl Backend + 'static) -> Self {
        Self::new(Hdfs::new(), backend)
    }

    pub fn s3(backend: impl Backend + 'static) -> Self {
        Self::new(S3::new(), backend)
    }

    pub fn s3n(backend: impl Backend + 'static) -> Self {
        Self::new(S3n::new(), backend)
    }

    pub fn local(backend: LocalBackend) -> Self {
        Self::new(Local::new(), backend)
    }

    pub fn memory(backend: MemoryBackend) -> Self {
        Self::new(Memory::new(), backend)
    }

    pub fn scheme(&self) -> &'static str {
        self.strategy.scheme()
    }

    /// Registered capabilities, before any runtime probe.
    pub fn capabilities(&self) -> CapabilitySet {
        self.strategy.capabilities()
    }

    /// Parses an absolute URI of this provider's scheme.
    pub fn parse_name(&self, raw: &str) -> Result<FileName> {
        match name::scheme_of(raw) {
            Some(scheme) if !scheme.eq_ignore_ascii_case(self.scheme()) => {
                Err(Error::UnsupportedScheme {
                    scheme: scheme.to_string(),
                    supported: self.scheme().to_string(),
                })
            }
            _ => self.strategy.parser().parse(raw, None),
        }
    }

    /// Returns the file system serving the authority of `raw`, connecting on first use.
    ///
    /// A cached file system that has been closed is replaced by a fresh connection.
    pub fn resolve_file_system(
        &self,
        raw: &str,
        options: &FileSystemOptions,
    ) -> Result<Arc<FileSystem>> {
        let name = self.parse_name(raw)?;
        self.file_system_for(&name, options)
    }

    /// Resolves `raw` to a file object, connecting its file system if needed.
    pub fn resolve_file(&self, raw: &str, options: &FileSystemOptions) -> Result<FileObject> {
        let name = self.parse_name(raw)?;
        let fs = self.file_system_for(&name, options)?;
        Ok(fs.create_file_object(name))
    }

    /// Drops the cached file system of the authority of `raw` and closes it.
    /// Returns whether a live file system was evicted.
    pub fn evict(&self, raw: &str) -> Result<bool> {
        let name = self.parse_name(raw)?;
        let key = self.strategy.authority_key(&name);
        let Some(slot) = self.slots.lock().remove(&key) else {
            return Ok(false);
        };
        let evicted = slot.lock().take();
        match evicted {
            Some(fs) if !fs.is_closed() => {
                debug!("evicting {key}");
                fs.close()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Closes and forgets every cached file system. All of them are closed even when some
    /// fail; the first failure is returned.
    pub fn close_all(&self) -> Result<()> {
        let slots: Vec<Slot> = self.slots.lock().drain().map(|(_, slot)| slot).collect();
        let mut first_error = None;
        for slot in slots {
            let Some(fs) = slot.lock().take() else {
                continue;
            };
            if let Err(e) = fs.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Number of cached file systems that are still open.
    pub fn cached_file_systems(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();
        slots
            .iter()
            .filter(|slot| slot.lock().as_ref().is_some_and(|fs| !fs.is_closed()))
            .count()
    }

    /// Number of file systems this provider has connected so far.
    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    fn file_system_for(
        &self,
        name: &FileName,
        options: &FileSystemOptions,
    ) -> Result<Arc<FileSystem>> {
        let key = self.strategy.authority_key(name);
        loop {
            let slot = self.slots.lock().entry(key.clone()).or_default().clone();

            let mut cached = slot.lock();
            if !self.is_current(&key, &slot) {
                // The slot left the map while we waited for its lock.
                continue;
            }
            if let Some(fs) = cached.as_ref() {
                if !fs.is_closed() {
                    debug!("cache hit for {key}");
                    return Ok(fs.clone());
                }
                debug!("replacing closed file system of {key}");
            }
            let connected = FileSystem::connect(
                self.strategy.clone(),
                self.backend.as_ref(),
                &name.root(),
                options.clone(),
            );
            let fs = match connected {
                Ok(fs) => fs,
                Err(e) => {
                    *cached = None;
                    self.retire(&key, &slot);
                    return Err(e);
                }
            };
            self.constructed.fetch_add(1, Ordering::SeqCst);
            *cached = Some(fs.clone());
            return Ok(fs);
        }
    }

    fn is_current(&self, key: &str, slot: &Slot) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    fn retire(&self, key: &str, slot: &Slot) {
        let mut slots = self.slots.lock();
        if slots.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            slots.remove(key);
        }
    }
}
