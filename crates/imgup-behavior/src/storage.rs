//! Local filesystem storage
//!
//! Directories and files are created with the configured modes applied
//! explicitly to each path, so the process umask is never touched.

use std::path::{Path, PathBuf};

use imgup_core::{
    EffectiveSettings, FileContents, FileModes, UploadError, UploadResult, UploadedFile,
};
use rand::Rng;
use tokio::fs;
use tracing::{debug, instrument};

/// Characters random file names are drawn from
pub const NAME_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Writes uploads and previews to local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDisk {
    modes: FileModes,
}

impl LocalDisk {
    pub fn new(modes: FileModes) -> Self {
        Self { modes }
    }

    /// Create a directory and its missing ancestors; a no-op if it exists
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub async fn ensure_dir(&self, dir: &Path) -> UploadResult<()> {
        let mut missing: Vec<PathBuf> = Vec::new();
        let mut current = Some(dir);
        while let Some(path) = current {
            if path.as_os_str().is_empty() || exists(path).await? {
                break;
            }
            missing.push(path.to_path_buf());
            current = path.parent();
        }

        if missing.is_empty() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(self.modes.dir_mode);
        builder
            .create(dir)
            .await
            .map_err(|e| UploadError::io(dir, e))?;

        // The umask may have masked bits off; set them outermost first
        for path in missing.iter().rev() {
            set_mode(path, self.modes.dir_mode).await?;
        }

        debug!(created = missing.len(), "Directories created");
        Ok(())
    }

    /// Write an upload to `dest`, replacing any existing file
    #[instrument(skip_all, fields(dest = %dest.display(), size = file.size()))]
    pub async fn save_upload(&self, file: &UploadedFile, dest: &Path) -> UploadResult<()> {
        match file.contents() {
            FileContents::Memory(data) => {
                fs::write(dest, data)
                    .await
                    .map_err(|e| UploadError::io(dest, e))?;
            }
            FileContents::TempFile(temp) => {
                // Cross-device moves fail with rename; fall back to a copy
                if fs::rename(temp, dest).await.is_err() {
                    fs::copy(temp, dest)
                        .await
                        .map_err(|e| UploadError::io(dest, e))?;
                    if let Err(e) = fs::remove_file(temp).await {
                        debug!(temp = %temp.display(), error = %e, "Temp file left behind");
                    }
                }
            }
        }

        self.apply_file_mode(dest).await?;
        debug!("Upload stored");
        Ok(())
    }

    /// Apply the configured file mode to a file created by someone else
    pub async fn apply_file_mode(&self, path: &Path) -> UploadResult<()> {
        set_mode(path, self.modes.file_mode).await
    }
}

async fn exists(path: &Path) -> UploadResult<bool> {
    fs::try_exists(path)
        .await
        .map_err(|e| UploadError::io(path, e))
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> UploadResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| UploadError::io(path, e))
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> UploadResult<()> {
    Ok(())
}

/// Generate a random file name of `length` characters from [`NAME_CHARSET`]
pub fn generate_name(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..NAME_CHARSET.len());
            NAME_CHARSET[idx] as char
        })
        .collect()
}

/// Name an upload is stored under: random or original base name, plus the
/// original extension
pub fn stored_filename(file: &UploadedFile, settings: &EffectiveSettings) -> String {
    let base = if settings.generate_name {
        generate_name(settings.generated_name_length)
    } else {
        file.base_name().to_string()
    };

    let extension = file.extension();
    if extension.is_empty() {
        base
    } else {
        format!("{}.{}", base, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use imgup_core::{AttributeConfig, Defaults};

    fn settings(attr: AttributeConfig) -> EffectiveSettings {
        Defaults {
            storage_dir: Some("/tmp".into()),
            ..Defaults::default()
        }
        .resolve(&attr.record_field("logo_name"))
    }

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o7777
    }

    #[test]
    fn test_generate_name() {
        let name = generate_name(12);
        assert_eq!(name.len(), 12);
        assert!(name.bytes().all(|b| NAME_CHARSET.contains(&b)));

        assert_ne!(generate_name(32), generate_name(32));
        assert_eq!(generate_name(0), "");
    }

    #[test]
    fn test_stored_filename_keeps_original_name() {
        let file = UploadedFile::from_bytes("Company Logo.PNG", Bytes::new());
        let name = stored_filename(&file, &settings(AttributeConfig::new("logo").keep_name()));
        assert_eq!(name, "Company Logo.png");
    }

    #[test]
    fn test_stored_filename_generated() {
        let file = UploadedFile::from_bytes("logo.jpeg", Bytes::new());
        let settings = settings(AttributeConfig::new("logo").generate_name(20));

        let name = stored_filename(&file, &settings);
        let (base, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(base.len(), 20);
        assert!(base.bytes().all(|b| NAME_CHARSET.contains(&b)));
        assert_eq!(ext, "jpeg");

        // Names do not depend on the upload
        assert_ne!(name, stored_filename(&file, &settings));
    }

    #[test]
    fn test_stored_filename_without_extension() {
        let file = UploadedFile::from_bytes("README", Bytes::new());
        assert_eq!(stored_filename(&file, &settings(AttributeConfig::new("doc"))), "README");
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_ancestors_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("web/uploads/logos");
        let disk = LocalDisk::default();

        disk.ensure_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        disk.ensure_dir(&dir).await.unwrap();
        assert!(dir.is_dir());

        #[cfg(unix)]
        {
            assert_eq!(mode_of(&dir), 0o775);
            assert_eq!(mode_of(&tmp.path().join("web")), 0o775);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ensure_dir_leaves_existing_dirs_alone() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o700)).unwrap();

        let disk = LocalDisk::new(FileModes {
            dir_mode: 0o750,
            file_mode: 0o640,
        });
        let dir = tmp.path().join("a");
        disk.ensure_dir(&dir).await.unwrap();

        assert_eq!(mode_of(tmp.path()), 0o700);
        assert_eq!(mode_of(&dir), 0o750);
    }

    #[tokio::test]
    async fn test_save_upload_replaces_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("logo.png");
        std::fs::write(&dest, b"old contents").unwrap();

        let disk = LocalDisk::default();
        let file = UploadedFile::from_bytes("logo.png", Bytes::from_static(b"new"));
        disk.save_upload(&file, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
        #[cfg(unix)]
        assert_eq!(mode_of(&dest), 0o664);
    }

    #[tokio::test]
    async fn test_save_upload_moves_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let temp = tmp.path().join("upload.tmp");
        std::fs::write(&temp, b"spooled").unwrap();

        let disk = LocalDisk::default();
        let file = UploadedFile::from_temp_file("photo.jpg", &temp, 7);
        let dest = tmp.path().join("photo.jpg");
        disk.save_upload(&file, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"spooled");
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_save_upload_into_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("missing/logo.png");

        let disk = LocalDisk::default();
        let file = UploadedFile::from_bytes("logo.png", Bytes::from_static(b"x"));
        let result = disk.save_upload(&file, &dest).await;

        assert!(matches!(result, Err(UploadError::Io { .. })));
    }
}
