//! Upload rules (file type and size checks)

use serde::{Deserialize, Serialize};

use crate::file::UploadedFile;

/// Message for uploads whose name cannot be stored
pub const INVALID_FILE_NAME: &str = "has an invalid file name";

/// Allowed file types for an attribute
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileRules {
    /// Allowed lowercase extensions without the dot (empty = allow all)
    pub allowed_extensions: Vec<String>,
    /// Allowed MIME types, `image/*` style wildcards accepted (empty = allow all)
    pub allowed_mime_types: Vec<String>,
    /// Maximum upload size in bytes
    pub max_size: Option<u64>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            allowed_extensions: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "webp".to_string(),
            ],
            allowed_mime_types: Vec::new(),
            max_size: Some(10 * 1024 * 1024), // 10 MB
        }
    }
}

impl FileRules {
    /// Rules that accept anything
    pub fn allow_all() -> Self {
        Self {
            allowed_extensions: Vec::new(),
            allowed_mime_types: Vec::new(),
            max_size: None,
        }
    }

    /// Check an upload, returning one message per violated rule
    pub fn check(&self, file: &UploadedFile) -> Vec<String> {
        let mut messages = Vec::new();

        if !file.has_usable_name() {
            messages.push(INVALID_FILE_NAME.to_string());
        }

        if let Some(max) = self.max_size {
            if file.size() > max {
                messages.push(format!(
                    "is too large ({} bytes, maximum is {} bytes)",
                    file.size(),
                    max
                ));
            }
        }

        let extension = file.extension();
        if !self.allowed_extensions.is_empty()
            && !self
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
        {
            messages.push(format!(
                "has an extension that is not allowed (allowed: {})",
                self.allowed_extensions.join(", ")
            ));
        }

        if !self.allowed_mime_types.is_empty() {
            let content_type = file.content_type();
            if !self
                .allowed_mime_types
                .iter()
                .any(|allowed| mime_matches(allowed, &content_type))
            {
                messages.push(format!("has a content type that is not allowed: {}", content_type));
            }
        }

        messages
    }
}

fn mime_matches(pattern: &str, content_type: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(top_level) => content_type
            .split('/')
            .next()
            .is_some_and(|t| t.eq_ignore_ascii_case(top_level)),
        None => pattern.eq_ignore_ascii_case(content_type),
    }
}
