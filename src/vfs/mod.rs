//! The virtual file system layer: providers cache file systems, file systems hand out
//! file objects.

mod file_object;
mod file_system;
mod manager;
mod provider;

pub use file_object::{FileObject, OpenMode};
pub use file_system::FileSystem;
pub use manager::FileSystemManager;
pub use provider::Provider;
