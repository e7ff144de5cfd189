//! Configuration types and loading
//!
//! A behavior is configured with component-wide [`Defaults`] and one
//! [`AttributeConfig`] per file-bearing attribute. Any attribute setting left
//! unset falls back to the default of the same name.
//!
//! ```yaml
//! defaults:
//!   web_path: /uploads
//!   storage_dir: web/uploads
//!   preview_width: 120
//! attributes:
//!   - attribute: logo
//!     record_field: logo_name
//!     web_path: /uploads/logos
//!     storage_dir: web/uploads/logos
//!     preview_subdir: false
//!     preview_prefix: preview_
//!     generate_name: true
//!   - attribute: photo
//!     record_field: photo_name
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::FileRules;

/// Where previews are stored, relative to the storage directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PreviewDirRepr", into = "PreviewDirRepr")]
pub enum PreviewDir {
    /// Previews live next to the originals (use a prefix to avoid clobbering them)
    Disabled,
    /// Previews live in a subdirectory of the storage directory
    Subdir(String),
}

impl PreviewDir {
    pub fn subdir(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim_matches('/');
        if trimmed.is_empty() {
            Self::Disabled
        } else {
            Self::Subdir(trimmed.to_string())
        }
    }

    pub fn as_subdir(&self) -> Option<&str> {
        match self {
            Self::Disabled => None,
            Self::Subdir(name) => Some(name),
        }
    }
}

impl Default for PreviewDir {
    fn default() -> Self {
        Self::Subdir("previews".to_string())
    }
}

/// YAML form: either `false` or a directory name
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PreviewDirRepr {
    Flag(bool),
    Name(String),
}

impl TryFrom<PreviewDirRepr> for PreviewDir {
    type Error = String;

    fn try_from(repr: PreviewDirRepr) -> Result<Self, Self::Error> {
        match repr {
            PreviewDirRepr::Flag(false) => Ok(Self::Disabled),
            PreviewDirRepr::Flag(true) => {
                Err("preview_subdir must be false or a directory name".to_string())
            }
            PreviewDirRepr::Name(name) => Ok(Self::subdir(name)),
        }
    }
}

impl From<PreviewDir> for PreviewDirRepr {
    fn from(dir: PreviewDir) -> Self {
        match dir {
            PreviewDir::Disabled => Self::Flag(false),
            PreviewDir::Subdir(name) => Self::Name(name),
        }
    }
}

/// Component-wide defaults for every per-attribute setting
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Defaults {
    /// Public URL prefix of stored files
    pub web_path: String,
    /// Directory stored files are written to
    pub storage_dir: Option<PathBuf>,
    /// Base directory relative storage directories are resolved against
    pub root_dir: Option<PathBuf>,
    /// Replace the uploaded base name with a random one
    pub generate_name: bool,
    pub generated_name_length: usize,
    pub generate_preview: bool,
    pub preview_width: u32,
    pub preview_height: u32,
    /// JPEG encoder quality, 0-100; lossless formats ignore it
    pub preview_quality: u8,
    pub preview_subdir: PreviewDir,
    pub preview_prefix: String,
    pub rules: FileRules,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            web_path: String::new(),
            storage_dir: None,
            root_dir: None,
            generate_name: false,
            generated_name_length: 12,
            generate_preview: true,
            preview_width: 50,
            preview_height: 50,
            preview_quality: 90,
            preview_subdir: PreviewDir::default(),
            preview_prefix: String::new(),
            rules: FileRules::default(),
        }
    }
}

/// Per-attribute configuration; unset values fall back to [`Defaults`]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AttributeConfig {
    /// Logical attribute key, also the name of the record's upload slot
    pub attribute: String,
    /// Record field holding the stored filename
    pub record_field: Option<String>,
    pub web_path: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub generate_name: Option<bool>,
    pub generated_name_length: Option<usize>,
    pub generate_preview: Option<bool>,
    pub preview_width: Option<u32>,
    pub preview_height: Option<u32>,
    pub preview_quality: Option<u8>,
    pub preview_subdir: Option<PreviewDir>,
    pub preview_prefix: Option<String>,
    pub rules: Option<FileRules>,
}

impl AttributeConfig {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            ..Self::default()
        }
    }

    pub fn record_field(mut self, field: impl Into<String>) -> Self {
        self.record_field = Some(field.into());
        self
    }

    pub fn web_path(mut self, path: impl Into<String>) -> Self {
        self.web_path = Some(path.into());
        self
    }

    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn generate_name(mut self, length: usize) -> Self {
        self.generate_name = Some(true);
        self.generated_name_length = Some(length);
        self
    }

    pub fn keep_name(mut self) -> Self {
        self.generate_name = Some(false);
        self
    }

    pub fn without_preview(mut self) -> Self {
        self.generate_preview = Some(false);
        self
    }

    pub fn preview_size(mut self, width: u32, height: u32) -> Self {
        self.generate_preview = Some(true);
        self.preview_width = Some(width);
        self.preview_height = Some(height);
        self
    }

    pub fn preview_quality(mut self, quality: u8) -> Self {
        self.preview_quality = Some(quality);
        self
    }

    pub fn preview_subdir(mut self, dir: PreviewDir) -> Self {
        self.preview_subdir = Some(dir);
        self
    }

    pub fn preview_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.preview_prefix = Some(prefix.into());
        self
    }

    pub fn rules(mut self, rules: FileRules) -> Self {
        self.rules = Some(rules);
        self
    }
}

/// Permissions applied to everything the writer creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileModes {
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl Default for FileModes {
    fn default() -> Self {
        Self {
            // rwxrwxr-x
            dir_mode: 0o775,
            // rw-rw-r--
            file_mode: 0o664,
        }
    }
}

/// Full behavior configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub defaults: Defaults,
    pub modes: FileModes,
    /// Attributes in declaration order; they are processed in this order
    pub attributes: Vec<AttributeConfig>,
}

impl BehaviorConfig {
    pub fn new(defaults: Defaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    pub fn attribute(mut self, attribute: AttributeConfig) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn modes(mut self, modes: FileModes) -> Self {
        self.modes = modes;
        self
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::FileError(e.to_string()))
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&contents)
    }

    /// Defaults from environment variables, no attributes
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override defaults and modes from `IMGUP_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override defaults and modes from a key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = &mut self.defaults;

        if let Some(path) = lookup("IMGUP_WEB_PATH") {
            defaults.web_path = path;
        }
        if let Some(dir) = lookup("IMGUP_STORAGE_DIR") {
            defaults.storage_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("IMGUP_ROOT_DIR") {
            defaults.root_dir = Some(PathBuf::from(dir));
        }
        if let Some(v) = lookup("IMGUP_GENERATE_NAME") {
            defaults.generate_name = parse_bool("IMGUP_GENERATE_NAME", &v)?;
        }
        if let Some(v) = lookup("IMGUP_GENERATED_NAME_LENGTH") {
            defaults.generated_name_length = parse_number("IMGUP_GENERATED_NAME_LENGTH", &v)?;
        }
        if let Some(v) = lookup("IMGUP_GENERATE_PREVIEW") {
            defaults.generate_preview = parse_bool("IMGUP_GENERATE_PREVIEW", &v)?;
        }
        if let Some(v) = lookup("IMGUP_PREVIEW_WIDTH") {
            defaults.preview_width = parse_number("IMGUP_PREVIEW_WIDTH", &v)?;
        }
        if let Some(v) = lookup("IMGUP_PREVIEW_HEIGHT") {
            defaults.preview_height = parse_number("IMGUP_PREVIEW_HEIGHT", &v)?;
        }
        if let Some(v) = lookup("IMGUP_PREVIEW_QUALITY") {
            defaults.preview_quality = parse_number("IMGUP_PREVIEW_QUALITY", &v)?;
        }
        if let Some(v) = lookup("IMGUP_PREVIEW_SUBDIR") {
            defaults.preview_subdir = match v.as_str() {
                "false" | "0" | "no" => PreviewDir::Disabled,
                name => PreviewDir::subdir(name),
            };
        }
        if let Some(prefix) = lookup("IMGUP_PREVIEW_PREFIX") {
            defaults.preview_prefix = prefix;
        }
        if let Some(v) = lookup("IMGUP_DIR_MODE") {
            self.modes.dir_mode = parse_mode("IMGUP_DIR_MODE", &v)?;
        }
        if let Some(v) = lookup("IMGUP_FILE_MODE") {
            self.modes.file_mode = parse_mode("IMGUP_FILE_MODE", &v)?;
        }

        Ok(())
    }

    /// Check every attribute; run once before any record is processed
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for attr in &self.attributes {
            if attr.attribute.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "attribute".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            if !seen.insert(attr.attribute.as_str()) {
                return Err(ConfigError::DuplicateAttribute(attr.attribute.clone()));
            }
            match attr.record_field.as_deref() {
                Some(field) if !field.is_empty() => {}
                _ => {
                    return Err(ConfigError::MissingRecordField {
                        attribute: attr.attribute.clone(),
                    })
                }
            }
            if attr.storage_dir.is_none() && self.defaults.storage_dir.is_none() {
                return Err(ConfigError::MissingStorageDir(attr.attribute.clone()));
            }

            let settings = self.defaults.resolve(attr);
            let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
                key: format!("{}.{}", attr.attribute, key),
                message: message.to_string(),
            };
            if settings.generate_name && settings.generated_name_length == 0 {
                return Err(invalid("generated_name_length", "must be greater than 0"));
            }
            if settings.preview_quality > 100 {
                return Err(invalid("preview_quality", "must be between 0 and 100"));
            }
            if settings.generate_preview
                && (settings.preview_width == 0 || settings.preview_height == 0)
            {
                return Err(invalid("preview_width/preview_height", "must be greater than 0"));
            }
            if settings.generate_preview
                && settings.preview_subdir.as_subdir().is_none()
                && settings.preview_prefix.is_empty()
            {
                // The preview path would be the original's path
                return Err(invalid(
                    "preview_prefix",
                    "must be set when previews share the storage directory",
                ));
            }
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {:?}", value),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected a number, got {:?}", value),
    })
}

/// Octal permission bits, with or without a `0o` / `0` prefix
fn parse_mode(key: &str, value: &str) -> Result<u32, ConfigError> {
    let digits = value.trim().trim_start_matches("0o");
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|mode| *mode <= 0o7777)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected octal permission bits, got {:?}", value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const YAML: &str = r#"
defaults:
  web_path: /uploads
  storage_dir: web/uploads
  root_dir: /srv/app
  preview_width: 120
modes:
  dir_mode: 0o770
attributes:
  - attribute: logo
    record_field: logo_name
    web_path: /uploads/logos
    storage_dir: web/uploads/logos
    preview_subdir: false
    preview_prefix: preview_
    generate_name: true
  - attribute: photo
    record_field: photo_name
    preview_subdir: thumbs/
"#;

    #[test]
    fn test_default_config() {
        let defaults = Defaults::default();
        assert_eq!(defaults.generated_name_length, 12);
        assert_eq!(defaults.preview_width, 50);
        assert_eq!(defaults.preview_height, 50);
        assert_eq!(defaults.preview_quality, 90);
        assert!(defaults.generate_preview);
        assert!(!defaults.generate_name);
        assert_eq!(defaults.preview_subdir.as_subdir(), Some("previews"));

        let modes = FileModes::default();
        assert_eq!(modes.dir_mode, 0o775);
        assert_eq!(modes.file_mode, 0o664);
    }

    #[test]
    fn test_from_yaml() {
        let config = BehaviorConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.defaults.web_path, "/uploads");
        assert_eq!(config.defaults.preview_width, 120);
        assert_eq!(config.defaults.preview_height, 50);
        assert_eq!(config.modes.dir_mode, 0o770);
        assert_eq!(config.modes.file_mode, 0o664);

        let names: Vec<_> = config.attributes.iter().map(|a| a.attribute.as_str()).collect();
        assert_eq!(names, vec!["logo", "photo"]);

        let logo = &config.attributes[0];
        assert_eq!(logo.preview_subdir, Some(PreviewDir::Disabled));
        assert_eq!(logo.generate_name, Some(true));
        assert_eq!(logo.generated_name_length, None);

        let photo = &config.attributes[1];
        assert_eq!(photo.preview_subdir, Some(PreviewDir::Subdir("thumbs".into())));
        assert!(photo.web_path.is_none());

        config.validate().unwrap();
    }

    #[test]
    fn test_preview_subdir_true_is_rejected() {
        let yaml = "attributes:
  - attribute: logo
    record_field: logo_name
    preview_subdir: true
";
        let result = BehaviorConfig::from_yaml_str(yaml);
        assert!(matches!(result, Err(ConfigError::FileError(_))));
    }

    #[test]
    fn test_missing_record_field() {
        let config = BehaviorConfig::new(Defaults {
            storage_dir: Some("/tmp/uploads".into()),
            ..Defaults::default()
        })
        .attribute(AttributeConfig::new("logo").record_field("logo_name"))
        .attribute(AttributeConfig::new("banner"));

        match config.validate() {
            Err(ConfigError::MissingRecordField { attribute }) => assert_eq!(attribute, "banner"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_storage_dir() {
        let config = BehaviorConfig::default()
            .attribute(AttributeConfig::new("logo").record_field("logo_name"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingStorageDir(ref a)) if a == "logo"
        ));

        let config = BehaviorConfig::default().attribute(
            AttributeConfig::new("logo")
                .record_field("logo_name")
                .storage_dir("/tmp/logos"),
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_attribute() {
        let config = BehaviorConfig::default()
            .attribute(AttributeConfig::new("logo").record_field("a").storage_dir("/tmp"))
            .attribute(AttributeConfig::new("logo").record_field("b").storage_dir("/tmp"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateAttribute(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let base = || AttributeConfig::new("logo").record_field("logo_name").storage_dir("/tmp");

        let config = BehaviorConfig::default().attribute(base().preview_quality(101));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let config = BehaviorConfig::default().attribute(base().generate_name(0));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let config = BehaviorConfig::default().attribute(base().preview_size(0, 10));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        // Zero-sized previews are fine when previews are off
        let config =
            BehaviorConfig::default().attribute(base().preview_size(0, 10).without_preview());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preview_next_to_original_needs_prefix() {
        let base = || {
            AttributeConfig::new("logo")
                .record_field("logo_name")
                .storage_dir("/tmp")
                .preview_subdir(PreviewDir::Disabled)
        };

        let config = BehaviorConfig::default().attribute(base());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "logo.preview_prefix"
        ));

        let config = BehaviorConfig::default().attribute(base().preview_prefix("preview_"));
        assert!(config.validate().is_ok());

        let config = BehaviorConfig::default().attribute(base().without_preview());
        assert!(config.validate().is_ok());

        // Same check when the setting comes from the defaults
        let mut config = BehaviorConfig::default().attribute(
            AttributeConfig::new("photo")
                .record_field("photo_name")
                .storage_dir("/tmp"),
        );
        config.defaults.preview_subdir = PreviewDir::subdir("/");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("IMGUP_WEB_PATH", "/media"),
            ("IMGUP_STORAGE_DIR", "/var/media"),
            ("IMGUP_GENERATE_NAME", "yes"),
            ("IMGUP_GENERATED_NAME_LENGTH", "20"),
            ("IMGUP_PREVIEW_QUALITY", "75"),
            ("IMGUP_PREVIEW_SUBDIR", "false"),
            ("IMGUP_FILE_MODE", "0o640"),
            ("IMGUP_DIR_MODE", "0750"),
        ]
        .into_iter()
        .collect();

        let mut config = BehaviorConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.defaults.web_path, "/media");
        assert_eq!(config.defaults.storage_dir, Some(PathBuf::from("/var/media")));
        assert!(config.defaults.generate_name);
        assert_eq!(config.defaults.generated_name_length, 20);
        assert_eq!(config.defaults.preview_quality, 75);
        assert_eq!(config.defaults.preview_subdir, PreviewDir::Disabled);
        assert_eq!(config.modes.file_mode, 0o640);
        assert_eq!(config.modes.dir_mode, 0o750);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = BehaviorConfig::default();
        let result = config
            .apply_overrides(|key| (key == "IMGUP_PREVIEW_WIDTH").then(|| "wide".to_string()));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "IMGUP_PREVIEW_WIDTH"
        ));

        let result = config
            .apply_overrides(|key| (key == "IMGUP_FILE_MODE").then(|| "0o999".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
