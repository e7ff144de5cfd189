//! Uploaded file handle
//!
//! Handed over by the upload layer for one request and consumed by the
//! storage writer.

use std::path::{Path, PathBuf};

use bytes::Bytes;

/// Where the uploaded bytes currently live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    /// Fully buffered upload
    Memory(Bytes),
    /// Upload spooled to a temporary file by the upload layer
    TempFile(PathBuf),
}

/// A file submitted with the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client file name, without any directory part
    name: String,
    content_type: Option<String>,
    size: u64,
    contents: FileContents,
}

impl UploadedFile {
    /// Create an upload from buffered bytes
    pub fn from_bytes(name: impl AsRef<str>, data: Bytes) -> Self {
        Self {
            name: client_file_name(name.as_ref()),
            content_type: None,
            size: data.len() as u64,
            contents: FileContents::Memory(data),
        }
    }

    /// Create an upload from a spooled temporary file
    pub fn from_temp_file(name: impl AsRef<str>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: client_file_name(name.as_ref()),
            content_type: None,
            size,
            contents: FileContents::TempFile(path.into()),
        }
    }

    /// Set the content type reported by the client
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Original file name, e.g. `Company Logo.PNG`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Original name without extension, e.g. `Company Logo`
    pub fn base_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => &self.name,
        }
    }

    /// Lowercase extension without the dot; empty when the name has none
    pub fn extension(&self) -> String {
        match self.name.rfind('.') {
            Some(idx) => self.name[idx + 1..].to_lowercase(),
            None => String::new(),
        }
    }

    /// Content type as reported, or guessed from the name
    pub fn content_type(&self) -> String {
        self.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&self.name)
                .first_or_octet_stream()
                .to_string()
        })
    }

    /// Whether the base name can be stored as is
    ///
    /// Empty names (`dir/`, `.png`) and dot-only names (`.`, `..`) would
    /// resolve to the storage directory itself or a hidden file.
    pub fn has_usable_name(&self) -> bool {
        let base = self.base_name();
        !base.is_empty() && !base.chars().all(|c| c == '.')
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn contents(&self) -> &FileContents {
        &self.contents
    }

    /// Path of the spooled temp file, if any
    pub fn temp_path(&self) -> Option<&Path> {
        match &self.contents {
            FileContents::TempFile(path) => Some(path),
            FileContents::Memory(_) => None,
        }
    }
}

/// Drop any directory part a client may have sent along
fn client_file_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).to_string()
}
