//! Shared fixtures for the behavior tests

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imgup_core::{
    filename_field, upload_slot, FilenameField, PreviewSpec, UploadRecord, UploadSlot,
    UploadedFile, ValidationErrors,
};

use crate::thumbnail::{ThumbnailError, Thumbnailer};

/// A record with two image attributes
#[derive(Debug, Default)]
pub struct Company {
    pub logo: Option<UploadedFile>,
    pub logo_name: Option<String>,
    pub banner: Option<UploadedFile>,
    pub banner_name: Option<String>,
    pub errors: ValidationErrors,
}

impl UploadRecord for Company {
    fn upload_slot(attribute: &str) -> Option<UploadSlot<Self>> {
        match attribute {
            "logo" => Some(upload_slot!(Company, logo)),
            "banner" => Some(upload_slot!(Company, banner)),
            _ => None,
        }
    }

    fn filename_field(field: &str) -> Option<FilenameField<Self>> {
        match field {
            "logo_name" => Some(filename_field!(Company, logo_name)),
            "banner_name" => Some(filename_field!(Company, banner_name)),
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

/// Writes a placeholder preview; fails for destinations containing `fail_on`
#[derive(Debug, Default)]
pub struct FakeThumbnailer {
    pub calls: AtomicUsize,
    pub fail_on: Option<String>,
}

impl FakeThumbnailer {
    pub fn failing_on(marker: impl Into<String>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(marker.into()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Thumbnailer for FakeThumbnailer {
    async fn generate(
        &self,
        _source: &Path,
        dest: &Path,
        _spec: PreviewSpec,
    ) -> Result<(), ThumbnailError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_on {
            if dest.to_string_lossy().contains(marker.as_str()) {
                return Err(ThumbnailError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "unsupported image format",
                )));
            }
        }
        tokio::fs::write(dest, b"preview").await?;
        Ok(())
    }
}

/// A small encoded PNG
pub fn png_bytes(width: u32, height: u32) -> Bytes {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 120, 200])));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Png).unwrap();
    Bytes::from(cursor.into_inner())
}

pub fn png_upload(name: &str) -> UploadedFile {
    UploadedFile::from_bytes(name, png_bytes(120, 90))
}
