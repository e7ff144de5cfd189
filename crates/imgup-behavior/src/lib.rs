//! # imgup-behavior
//!
//! Image upload behavior for ORM-style records.
//!
//! ## Features
//!
//! - Binding of submitted files to a record before validation
//! - Per-attribute settings merged over shared defaults
//! - Local storage with explicit directory and file modes
//! - Optional random file names
//! - Preview rendering through a pluggable [`Thumbnailer`]
//! - Public links for originals and previews
//!
//! ## Example
//!
//! ```rust,ignore
//! use imgup_behavior::{ImageUploadBehavior, LifecycleHooks, MemoryUploadSource, RecordEvent};
//! use imgup_core::{AttributeConfig, BehaviorConfig, Defaults};
//!
//! let config = BehaviorConfig::new(Defaults {
//!     web_path: "/uploads".to_string(),
//!     storage_dir: Some("/srv/app/web/uploads".into()),
//!     ..Defaults::default()
//! })
//! .attribute(AttributeConfig::new("logo").record_field("logo_name"));
//!
//! let behavior = ImageUploadBehavior::<Company>::new(config)?;
//!
//! behavior.dispatch(RecordEvent::BeforeValidate, &mut company, &request_files).await?;
//! if behavior.dispatch(RecordEvent::BeforeInsert, &mut company, &request_files).await? {
//!     // persist company
//! }
//! let logo = behavior.full_link(&company, "logo");
//! ```

pub mod behavior;
pub mod hooks;
pub mod source;
pub mod storage;
pub mod thumbnail;

#[cfg(test)]
mod test_support;

pub use behavior::{AttributeLinks, ImageUploadBehavior};
pub use hooks::{LifecycleHooks, RecordEvent};
pub use source::MemoryUploadSource;
pub use storage::{generate_name, stored_filename, LocalDisk, NAME_CHARSET};
pub use thumbnail::{ImageThumbnailer, ThumbnailError, Thumbnailer};
