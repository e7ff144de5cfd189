//! # imgup-core
//!
//! Core types for the imgup upload behavior.
//!
//! This crate provides the building blocks shared by the behavior and its hosts:
//! - Error types and the record's validation error collection
//! - Configuration (defaults, per-attribute overrides, YAML/env loading)
//! - Settings resolution
//! - The uploaded file handle and upload rules
//! - Record and upload source traits

pub mod config;
pub mod error;
pub mod file;
pub mod rules;
pub mod settings;
pub mod traits;

pub use config::{AttributeConfig, BehaviorConfig, Defaults, FileModes, PreviewDir};
pub use error::*;
pub use file::{FileContents, UploadedFile};
pub use rules::{FileRules, INVALID_FILE_NAME};
pub use settings::{EffectiveSettings, PreviewSpec};
pub use traits::*;
