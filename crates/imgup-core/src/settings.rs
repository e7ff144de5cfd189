//! Settings resolution
//!
//! [`EffectiveSettings`] is computed fresh for every attribute and passed by
//! value through the pipeline; nothing about one attribute's overrides is
//! kept on the behavior between attributes.

use std::path::{Path, PathBuf};

use crate::config::{AttributeConfig, Defaults, PreviewDir};
use crate::rules::FileRules;

/// Preview geometry and encoder quality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSpec {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

/// One attribute's configuration merged over the defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub attribute: String,
    pub record_field: String,
    pub web_path: String,
    pub storage_dir: PathBuf,
    pub generate_name: bool,
    pub generated_name_length: usize,
    pub generate_preview: bool,
    pub preview_width: u32,
    pub preview_height: u32,
    pub preview_quality: u8,
    pub preview_subdir: PreviewDir,
    pub preview_prefix: String,
    pub rules: FileRules,
}

impl Defaults {
    /// Merge an attribute's overrides over these defaults
    pub fn resolve(&self, attr: &AttributeConfig) -> EffectiveSettings {
        let storage_dir = attr
            .storage_dir
            .clone()
            .or_else(|| self.storage_dir.clone())
            .unwrap_or_default();
        let storage_dir = match &self.root_dir {
            Some(root) if storage_dir.is_relative() => root.join(storage_dir),
            _ => storage_dir,
        };

        EffectiveSettings {
            attribute: attr.attribute.clone(),
            record_field: attr.record_field.clone().unwrap_or_default(),
            web_path: attr.web_path.clone().unwrap_or_else(|| self.web_path.clone()),
            storage_dir,
            generate_name: attr.generate_name.unwrap_or(self.generate_name),
            generated_name_length: attr
                .generated_name_length
                .unwrap_or(self.generated_name_length),
            generate_preview: attr.generate_preview.unwrap_or(self.generate_preview),
            preview_width: attr.preview_width.unwrap_or(self.preview_width),
            preview_height: attr.preview_height.unwrap_or(self.preview_height),
            preview_quality: attr.preview_quality.unwrap_or(self.preview_quality),
            preview_subdir: attr
                .preview_subdir
                .clone()
                .unwrap_or_else(|| self.preview_subdir.clone()),
            preview_prefix: attr
                .preview_prefix
                .clone()
                .unwrap_or_else(|| self.preview_prefix.clone()),
            rules: attr.rules.clone().unwrap_or_else(|| self.rules.clone()),
        }
    }
}

impl EffectiveSettings {
    /// Directory previews are written to
    pub fn preview_dir(&self) -> PathBuf {
        match self.preview_subdir.as_subdir() {
            Some(subdir) => self.storage_dir.join(subdir),
            None => self.storage_dir.clone(),
        }
    }

    /// File name of the preview for a stored file
    pub fn preview_file_name(&self, filename: &str) -> String {
        format!("{}{}", self.preview_prefix, filename)
    }

    pub fn original_path(&self, filename: &str) -> PathBuf {
        self.storage_dir.join(filename)
    }

    pub fn preview_path(&self, filename: &str) -> PathBuf {
        self.preview_dir().join(self.preview_file_name(filename))
    }

    pub fn preview_spec(&self) -> PreviewSpec {
        PreviewSpec {
            width: self.preview_width,
            height: self.preview_height,
            quality: self.preview_quality,
        }
    }

    /// Public URL of a stored original
    pub fn full_link(&self, filename: &str) -> String {
        format!("{}/{}", self.web_root(), filename)
    }

    /// Public URL of a stored file's preview
    pub fn preview_link(&self, filename: &str) -> String {
        match self.preview_subdir.as_subdir() {
            Some(subdir) => format!(
                "{}/{}/{}",
                self.web_root(),
                subdir,
                self.preview_file_name(filename)
            ),
            None => format!("{}/{}", self.web_root(), self.preview_file_name(filename)),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn web_root(&self) -> &str {
        self.web_path.trim_end_matches('/')
    }
}
