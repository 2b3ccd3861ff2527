use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::Result;
use crate::name;
use crate::options::FileSystemOptions;
use crate::vfs::{FileObject, FileSystem, Provider};
use crate::Error;

/// Routes raw URIs to the provider registered for their scheme.
#[derive(Default)]
pub struct FileSystemManager {
    providers: RwLock<FxHashMap<&'static str, Arc<Provider>>>,
}

impl FileSystemManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under its scheme, replacing any previous one.
    pub fn register(&self, provider: Provider) -> Arc<Provider> {
        let scheme = provider.scheme();
        let provider = Arc::new(provider);
        if self
            .providers
            .write()
            .insert(scheme, provider.clone())
            .is_some()
        {
            warn!("replaced provider for scheme {scheme}");
        } else {
            debug!("registered provider for scheme {scheme}");
        }
        provider
    }

    pub fn provider(&self, scheme: &str) -> Option<Arc<Provider>> {
        self.providers
            .read()
            .get(scheme.to_ascii_lowercase().as_str())
            .cloned()
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&'static str> {
        let mut schemes: Vec<_> = self.providers.read().keys().copied().collect();
        schemes.sort_unstable();
        schemes
    }

    pub fn resolve_file_system(
        &self,
        raw: &str,
        options: &FileSystemOptions,
    ) -> Result<Arc<FileSystem>> {
        self.route(raw)?.resolve_file_system(raw, options)
    }

    pub fn resolve_file(&self, raw: &str, options: &FileSystemOptions) -> Result<FileObject> {
        self.route(raw)?.resolve_file(raw, options)
    }

    /// Closes the cached file systems of every provider, returning the first failure.
    pub fn close(&self) -> Result<()> {
        let providers: Vec<_> = self.providers.read().values().cloned().collect();
        let mut first_error = None;
        for provider in providers {
            if let Err(e) = provider.close_all() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn route(&self, raw: &str) -> Result<Arc<Provider>> {
        let Some(scheme) = name::scheme_of(raw) else {
            return Err(Error::malformed(raw, "missing scheme"));
        };
        self.provider(scheme)
            .ok_or_else(|| Error::UnsupportedScheme {
                scheme: scheme.to_string(),
                supported: self.schemes().join(", "),
            })
    }
}
