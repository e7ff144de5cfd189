//! imgup
//!
//! Runs the image upload behavior over local files:
//!
//! ```text
//! imgup image=./photo.jpg cover=./cover.png
//! ```
//!
//! Configuration comes from the YAML file named by `IMGUP_CONFIG`, with
//! `IMGUP_*` environment overrides applied on top.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imgup_behavior::{
    AttributeLinks, ImageUploadBehavior, LifecycleHooks, MemoryUploadSource, RecordEvent,
};
use imgup_core::{AttributeConfig, BehaviorConfig, Defaults, PreviewDir, UploadedFile};

mod record;

use record::Artwork;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = load_config()?;
    let uploads = parse_uploads(std::env::args().skip(1))?;
    if uploads.is_empty() {
        bail!("usage: imgup <attribute>=<file> [<attribute>=<file> ...]");
    }

    info!(version = env!("CARGO_PKG_VERSION"), uploads = uploads.len(), "Starting imgup");

    let report = run(config, uploads).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.saved {
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,imgup_behavior=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config() -> anyhow::Result<BehaviorConfig> {
    let mut config = match std::env::var("IMGUP_CONFIG") {
        Ok(path) => BehaviorConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        Err(_) => {
            warn!("IMGUP_CONFIG not set, using built-in attributes");
            default_config()
        }
    };
    config.apply_env()?;
    Ok(config)
}

/// Attributes of [`Artwork`], stored under `./uploads`
fn default_config() -> BehaviorConfig {
    BehaviorConfig::new(Defaults {
        web_path: "/uploads".to_string(),
        storage_dir: Some(PathBuf::from("uploads")),
        ..Defaults::default()
    })
    .attribute(AttributeConfig::new("image").record_field("image_name"))
    .attribute(
        AttributeConfig::new("cover")
            .record_field("cover_name")
            .web_path("/uploads/covers")
            .storage_dir("uploads/covers")
            .generate_name(16)
            .preview_subdir(PreviewDir::Disabled)
            .preview_prefix("preview_"),
    )
}

/// Parse `attribute=path` arguments
fn parse_uploads<I>(args: I) -> anyhow::Result<Vec<(String, PathBuf)>>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| match arg.split_once('=') {
            Some((attribute, path)) if !attribute.is_empty() && !path.is_empty() => {
                Ok((attribute.to_string(), PathBuf::from(path)))
            }
            _ => bail!("expected <attribute>=<file>, got {:?}", arg),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct Report {
    saved: bool,
    files: BTreeMap<String, AttributeLinks>,
    errors: Vec<String>,
}

async fn run(config: BehaviorConfig, uploads: Vec<(String, PathBuf)>) -> anyhow::Result<Report> {
    let behavior = ImageUploadBehavior::<Artwork>::new(config)?;

    let mut source = MemoryUploadSource::new();
    for (attribute, path) in uploads {
        if !behavior.attributes().any(|a| a == attribute) {
            bail!("unknown attribute {:?}", attribute);
        }
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        source.insert(attribute, UploadedFile::from_bytes(name, Bytes::from(data)));
    }

    let mut artwork = Artwork::default();
    behavior
        .dispatch(RecordEvent::BeforeValidate, &mut artwork, &source)
        .await?;
    let saved = behavior
        .dispatch(RecordEvent::BeforeInsert, &mut artwork, &source)
        .await?;

    let files = behavior
        .attributes()
        .filter_map(|attribute| {
            behavior
                .links(&artwork, attribute)
                .map(|links| (attribute.to_string(), links))
        })
        .collect();

    Ok(Report {
        saved,
        files,
        errors: artwork.errors.full_messages(),
    })
}
