//! Seams between the behavior and its host
//!
//! A host record exposes its upload slots and filename fields through typed
//! accessors. The behavior looks each accessor up once, when it is built,
//! and never addresses record fields by name afterwards.

use crate::error::ValidationErrors;
use crate::file::UploadedFile;

/// Accessor for the transient slot holding an attribute's pending upload
pub struct UploadSlot<R> {
    pub slot: fn(&mut R) -> &mut Option<UploadedFile>,
    pub peek: fn(&R) -> Option<&UploadedFile>,
}

impl<R> Clone for UploadSlot<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for UploadSlot<R> {}

impl<R> UploadSlot<R> {
    pub fn new(
        slot: fn(&mut R) -> &mut Option<UploadedFile>,
        peek: fn(&R) -> Option<&UploadedFile>,
    ) -> Self {
        Self { slot, peek }
    }
}

/// Getter/setter pair for the persisted filename field
pub struct FilenameField<R> {
    pub get: fn(&R) -> Option<&str>,
    pub set: fn(&mut R, String),
}

impl<R> Clone for FilenameField<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for FilenameField<R> {}

impl<R> FilenameField<R> {
    pub fn new(get: fn(&R) -> Option<&str>, set: fn(&mut R, String)) -> Self {
        Self { get, set }
    }
}

/// A host record the behavior is attached to
pub trait UploadRecord: Send + Sized {
    /// Upload slot for a logical attribute, if the record has one
    fn upload_slot(attribute: &str) -> Option<UploadSlot<Self>>;

    /// Persisted filename field by name, if the record has one
    fn filename_field(field: &str) -> Option<FilenameField<Self>>;

    /// The record's validation errors
    fn errors(&self) -> &ValidationErrors;

    fn errors_mut(&mut self) -> &mut ValidationErrors;

    fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    fn add_error(&mut self, attribute: &str, message: impl Into<String>) {
        self.errors_mut().add(attribute, message);
    }
}

/// Files submitted with the current request
pub trait UploadSource {
    /// The upload submitted for an attribute, if any
    fn uploaded_file(&self, attribute: &str) -> Option<UploadedFile>;
}

/// Build an [`UploadSlot`] for an `Option<UploadedFile>` field
///
/// ```rust,ignore
/// imgup_core::upload_slot!(Company, logo)
/// ```
#[macro_export]
macro_rules! upload_slot {
    ($record:ty, $field:ident) => {{
        fn slot(record: &mut $record) -> &mut Option<$crate::UploadedFile> {
            &mut record.$field
        }
        fn peek(record: &$record) -> Option<&$crate::UploadedFile> {
            record.$field.as_ref()
        }
        $crate::UploadSlot::new(slot, peek)
    }};
}

/// Build a [`FilenameField`] for an `Option<String>` field
#[macro_export]
macro_rules! filename_field {
    ($record:ty, $field:ident) => {{
        fn get(record: &$record) -> Option<&str> {
            record.$field.as_deref()
        }
        fn set(record: &mut $record, filename: String) {
            record.$field = Some(filename);
        }
        $crate::FilenameField::new(get, set)
    }};
}
