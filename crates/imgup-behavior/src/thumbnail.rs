//! Preview generation

use std::io::{BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use imgup_core::PreviewSpec;
use thiserror::Error;
use tracing::{debug, instrument};

/// Thumbnail errors
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("{0}")]
    Image(#[from] image::ImageError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("Thumbnail task failed: {0}")]
    Task(String),
}

/// Renders a preview of `source` into `dest`
#[async_trait]
pub trait Thumbnailer: Send + Sync {
    async fn generate(
        &self,
        source: &Path,
        dest: &Path,
        spec: PreviewSpec,
    ) -> Result<(), ThumbnailError>;
}

/// Thumbnailer backed by the `image` crate
///
/// The image is cropped to fill the preview box, centered, and never
/// upscaled. The output format follows the destination extension.
///
/// Quality only affects JPEG output. PNG and GIF previews are lossless and
/// the `image` crate's WebP encoder is lossless only, so those formats are
/// written at full quality whatever `preview_quality` says.
#[derive(Debug, Clone, Copy)]
pub struct ImageThumbnailer {
    filter: FilterType,
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl ImageThumbnailer {
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

#[async_trait]
impl Thumbnailer for ImageThumbnailer {
    #[instrument(skip_all, fields(source = %source.display(), dest = %dest.display()))]
    async fn generate(
        &self,
        source: &Path,
        dest: &Path,
        spec: PreviewSpec,
    ) -> Result<(), ThumbnailError> {
        let source = source.to_path_buf();
        let dest = dest.to_path_buf();
        let filter = self.filter;

        tokio::task::spawn_blocking(move || render(&source, &dest, spec, filter))
            .await
            .map_err(|e| ThumbnailError::Task(e.to_string()))?
    }
}

fn render(
    source: &Path,
    dest: &Path,
    spec: PreviewSpec,
    filter: FilterType,
) -> Result<(), ThumbnailError> {
    let img = ImageReader::open(source)?.with_guessed_format()?.decode()?;
    let (original_width, original_height) = (img.width(), img.height());
    let preview = fit(img, spec, filter);

    let format = ImageFormat::from_path(dest)?;
    match format {
        ImageFormat::Jpeg => {
            let mut writer = BufWriter::new(std::fs::File::create(dest)?);
            let encoder = JpegEncoder::new_with_quality(&mut writer, spec.quality.clamp(1, 100));
            DynamicImage::ImageRgb8(preview.to_rgb8()).write_with_encoder(encoder)?;
            writer.flush()?;
        }
        _ => preview.save_with_format(dest, format)?,
    }

    debug!(
        from = ?(original_width, original_height),
        to = ?(preview.width(), preview.height()),
        "Preview rendered"
    );
    Ok(())
}

/// Crop-to-fill into the preview box, without upscaling
fn fit(img: DynamicImage, spec: PreviewSpec, filter: FilterType) -> DynamicImage {
    let width = spec.width.min(img.width());
    let height = spec.height.min(img.height());

    if width == img.width() && height == img.height() {
        return img;
    }
    img.resize_to_fill(width, height, filter)
}
