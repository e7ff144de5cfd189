//! Demo record the CLI runs the behavior against

use imgup_core::{
    filename_field, upload_slot, FilenameField, UploadRecord, UploadSlot, UploadedFile,
    ValidationErrors,
};

#[derive(Debug, Default)]
pub struct Artwork {
    pub image: Option<UploadedFile>,
    pub image_name: Option<String>,
    pub cover: Option<UploadedFile>,
    pub cover_name: Option<String>,
    pub errors: ValidationErrors,
}

impl UploadRecord for Artwork {
    fn upload_slot(attribute: &str) -> Option<UploadSlot<Self>> {
        match attribute {
            "image" => Some(upload_slot!(Artwork, image)),
            "cover" => Some(upload_slot!(Artwork, cover)),
            _ => None,
        }
    }

    fn filename_field(field: &str) -> Option<FilenameField<Self>> {
        match field {
            "image_name" => Some(filename_field!(Artwork, image_name)),
            "cover_name" => Some(filename_field!(Artwork, cover_name)),
            _ => None,
        }
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }
}
