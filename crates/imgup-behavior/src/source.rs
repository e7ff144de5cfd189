//! Upload sources

use std::collections::HashMap;

use imgup_core::{UploadSource, UploadedFile};

/// In-memory upload source, keyed by attribute
#[derive(Debug, Clone, Default)]
pub struct MemoryUploadSource {
    files: HashMap<String, UploadedFile>,
}

impl MemoryUploadSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, attribute: impl Into<String>, file: UploadedFile) -> Self {
        self.insert(attribute, file);
        self
    }

    pub fn insert(&mut self, attribute: impl Into<String>, file: UploadedFile) {
        self.files.insert(attribute.into(), file);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl UploadSource for MemoryUploadSource {
    fn uploaded_file(&self, attribute: &str) -> Option<UploadedFile> {
        self.files.get(attribute).cloned()
    }
}
