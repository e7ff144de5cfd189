//! Image upload behavior
//!
//! Binds pending uploads to a record before validation, then on save stores
//! each upload, renders its preview, and writes the stored filename back to
//! the record.

use std::sync::Arc;

use imgup_core::{
    AttributeConfig, BehaviorConfig, ConfigError, Defaults, EffectiveSettings, FilenameField,
    UploadRecord, UploadResult, UploadSlot, UploadSource, UploadedFile, INVALID_FILE_NAME,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::storage::{stored_filename, LocalDisk};
use crate::thumbnail::{ImageThumbnailer, Thumbnailer};

/// Public URLs of a stored image and its preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeLinks {
    pub full: String,
    pub preview: String,
}

/// An attribute with its record accessors resolved
struct BoundAttribute<R> {
    config: AttributeConfig,
    slot: UploadSlot<R>,
    field: FilenameField<R>,
}

/// Upload behavior attached to records of type `R`
pub struct ImageUploadBehavior<R: UploadRecord, T: Thumbnailer = ImageThumbnailer> {
    defaults: Defaults,
    attributes: Vec<BoundAttribute<R>>,
    disk: LocalDisk,
    thumbnailer: Arc<T>,
}

impl<R: UploadRecord> ImageUploadBehavior<R> {
    /// Build a behavior using the `image`-backed thumbnailer
    pub fn new(config: BehaviorConfig) -> Result<Self, ConfigError> {
        Self::with_thumbnailer(config, Arc::new(ImageThumbnailer::default()))
    }
}

impl<R: UploadRecord, T: Thumbnailer> ImageUploadBehavior<R, T> {
    /// Build a behavior, checking the configuration against the record type
    pub fn with_thumbnailer(
        config: BehaviorConfig,
        thumbnailer: Arc<T>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let BehaviorConfig {
            defaults,
            modes,
            attributes,
        } = config;

        let attributes = attributes
            .into_iter()
            .map(|config| {
                let slot = R::upload_slot(&config.attribute)
                    .ok_or_else(|| ConfigError::UnknownUploadSlot(config.attribute.clone()))?;
                // Presence is checked by validate()
                let field_name = config.record_field.clone().unwrap_or_default();
                let field = R::filename_field(&field_name).ok_or_else(|| {
                    ConfigError::UnknownRecordField {
                        attribute: config.attribute.clone(),
                        field: field_name.clone(),
                    }
                })?;
                Ok(BoundAttribute {
                    config,
                    slot,
                    field,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        info!(
            attributes = attributes.len(),
            dir_mode = %format!("{:o}", modes.dir_mode),
            file_mode = %format!("{:o}", modes.file_mode),
            "Image upload behavior configured"
        );

        Ok(Self {
            defaults,
            attributes,
            disk: LocalDisk::new(modes),
            thumbnailer,
        })
    }

    /// Configured attribute names, in processing order
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.config.attribute.as_str())
    }

    /// Settings for an attribute, resolved against the defaults
    pub fn settings(&self, attribute: &str) -> Option<EffectiveSettings> {
        self.find(attribute).map(|a| self.defaults.resolve(&a.config))
    }

    fn find(&self, attribute: &str) -> Option<&BoundAttribute<R>> {
        self.attributes.iter().find(|a| a.config.attribute == attribute)
    }

    /// Populate every upload slot from the request
    ///
    /// Slots are overwritten even when the request carries no file for the
    /// attribute, so a stale upload never survives into a later save.
    pub fn bind<S>(&self, record: &mut R, source: &S)
    where
        S: UploadSource + ?Sized,
    {
        for bound in &self.attributes {
            let file = source.uploaded_file(&bound.config.attribute);
            debug!(
                attribute = %bound.config.attribute,
                present = file.is_some(),
                "Upload bound"
            );
            *(bound.slot.slot)(record) = file;
        }
    }

    /// Check bound uploads against their attribute's file rules
    ///
    /// Failures are added to the record's errors under the attribute name.
    /// Returns `true` when every bound upload passed.
    pub fn validate(&self, record: &mut R) -> bool {
        let mut valid = true;

        for bound in &self.attributes {
            let Some(file) = (bound.slot.peek)(record) else {
                continue;
            };
            let messages = self.defaults.resolve(&bound.config).rules.check(file);
            if messages.is_empty() {
                continue;
            }

            valid = false;
            for message in messages {
                record.add_error(&bound.config.attribute, message);
            }
        }

        valid
    }

    /// Store pending uploads and write their filenames back to the record
    ///
    /// Returns `Ok(false)` without touching the filesystem if the record
    /// already has validation errors. Attributes are handled in declaration
    /// order; a failed preview adds an error on that attribute and stops the
    /// run, leaving attributes already handled in place. I/O failures are
    /// returned as errors, with the failing upload put back in its slot.
    #[instrument(skip_all, fields(attributes = self.attributes.len()))]
    pub async fn process(&self, record: &mut R) -> UploadResult<bool> {
        if record.has_errors() {
            debug!("Record has validation errors, uploads skipped");
            return Ok(false);
        }

        for bound in &self.attributes {
            let Some(file) = (bound.slot.slot)(record).take() else {
                continue;
            };
            let settings = self.defaults.resolve(&bound.config);
            match self.store(record, bound, settings, &file).await {
                Ok(true) => {}
                Ok(false) => return Ok(false),
                Err(e) => {
                    *(bound.slot.slot)(record) = Some(file);
                    return Err(e);
                }
            }
        }

        Ok(true)
    }

    async fn store(
        &self,
        record: &mut R,
        bound: &BoundAttribute<R>,
        settings: EffectiveSettings,
        file: &UploadedFile,
    ) -> UploadResult<bool> {
        if !settings.generate_name && !file.has_usable_name() {
            warn!(
                attribute = %settings.attribute,
                name = %file.name(),
                "Upload has no usable file name"
            );
            record.add_error(&settings.attribute, INVALID_FILE_NAME);
            return Ok(false);
        }

        self.disk.ensure_dir(&settings.storage_dir).await?;

        let filename = stored_filename(file, &settings);
        let original = settings.original_path(&filename);
        self.disk.save_upload(file, &original).await?;
        info!(
            attribute = %settings.attribute,
            filename = %filename,
            size = file.size(),
            "Upload stored"
        );

        if !settings.generate_preview {
            (bound.field.set)(record, filename);
            return Ok(true);
        }

        self.disk.ensure_dir(&settings.preview_dir()).await?;
        let preview = settings.preview_path(&filename);
        if let Err(e) = self
            .thumbnailer
            .generate(&original, &preview, settings.preview_spec())
            .await
        {
            warn!(
                attribute = %settings.attribute,
                filename = %filename,
                error = %e,
                "Preview generation failed"
            );
            record.add_error(&settings.attribute, e.to_string());
            return Ok(false);
        }
        self.disk.apply_file_mode(&preview).await?;
        debug!(preview = %preview.display(), "Preview stored");

        (bound.field.set)(record, filename);
        Ok(true)
    }

    /// Public URL of the stored image, if the record has one
    pub fn full_link(&self, record: &R, attribute: &str) -> Option<String> {
        let (settings, filename) = self.stored(record, attribute)?;
        Some(settings.full_link(filename))
    }

    /// Public URL of the stored image's preview, if the record has one
    pub fn preview_link(&self, record: &R, attribute: &str) -> Option<String> {
        let (settings, filename) = self.stored(record, attribute)?;
        Some(settings.preview_link(filename))
    }

    pub fn links(&self, record: &R, attribute: &str) -> Option<AttributeLinks> {
        let (settings, filename) = self.stored(record, attribute)?;
        Some(AttributeLinks {
            full: settings.full_link(filename),
            preview: settings.preview_link(filename),
        })
    }

    fn stored<'r>(
        &self,
        record: &'r R,
        attribute: &str,
    ) -> Option<(EffectiveSettings, &'r str)> {
        let bound = self.find(attribute)?;
        let filename = (bound.field.get)(record).filter(|f| !f.is_empty())?;
        Some((self.defaults.resolve(&bound.config), filename))
    }
}
