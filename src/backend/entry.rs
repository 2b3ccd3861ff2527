use chrono::{DateTime, Utc};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    /// Nothing exists at the path (yet).
    Imaginary,
}

impl FileType {
    pub fn is_file(&self) -> bool {
        *self == FileType::File
    }

    pub fn is_dir(&self) -> bool {
        *self == FileType::Directory
    }

    pub fn exists(&self) -> bool {
        *self != FileType::Imaginary
    }
}

/// Metadata of an existing remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    file_type: FileType,
    size: u64,
    last_modified: Option<DateTime<Utc>>,
}

impl Attributes {
    pub fn new(file_type: FileType, size: u64, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            file_type,
            size,
            last_modified,
        }
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Content length in bytes, 0 for folders.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Not every store tracks modification times of folders.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }
}

/// One child returned by [`Session::list_children`](crate::backend::Session::list_children).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    name: String,
    file_type: FileType,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, file_type: FileType) -> DirEntry {
        DirEntry {
            name: name.into(),
            file_type,
        }
    }

    /// Single path segment, relative to the listed folder.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn is_file(&self) -> bool {
        self.file_type.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }
}
