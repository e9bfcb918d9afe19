use crate::catalog::Catalog;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Sibling path the original catalog is moved to: `<input>.original`.
pub fn backup_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".original");
    PathBuf::from(name)
}

/// Writes a catalog back over its input file.
///
/// The first save copies the original file to [`backup_path`] unless backups
/// are disabled. Every save is staged in a temporary file in the same
/// directory and then renamed over the input, so the input path always holds
/// either the old or the new catalog, even when a save fails halfway.
#[derive(Debug)]
pub struct CatalogWriter {
    path: PathBuf,
    backup_pending: bool,
}

impl CatalogWriter {
    pub fn new(path: impl Into<PathBuf>, skip_backup: bool) -> Self {
        Self {
            path: path.into(),
            backup_pending: !skip_backup,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&mut self, catalog: &Catalog) -> Result<()> {
        let bytes = catalog.to_pretty_json()?;
        let permissions = fs::metadata(&self.path).ok().map(|m| m.permissions());

        let staged = stage(&self.path, &bytes, permissions)?;

        if self.backup_pending {
            self.backup_original()?;
            self.backup_pending = false;
        }

        staged
            .persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write catalog to {}", self.path.display()))?;
        debug!("Saved catalog to {} ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }

    fn backup_original(&self) -> Result<()> {
        let backup = backup_path(&self.path);

        if backup.exists() {
            fs::remove_file(&backup)
                .with_context(|| format!("Failed to remove old backup {}", backup.display()))?;
        }
        fs::copy(&self.path, &backup).with_context(|| {
            format!(
                "Failed to back up {} to {}",
                self.path.display(),
                backup.display()
            )
        })?;

        info!("Backed up original catalog to {}", backup.display());
        Ok(())
    }
}

/// Write `bytes` to a temporary file next to `path`. Dropping the returned
/// file without persisting it removes it.
fn stage(path: &Path, bytes: &[u8], permissions: Option<fs::Permissions>) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write catalog for {}", path.display()))?;
    file.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush catalog for {}", path.display()))?;
    if let Some(permissions) = permissions {
        fs::set_permissions(file.path(), permissions)
            .with_context(|| format!("Failed to set permissions for {}", path.display()))?;
    }

    Ok(file)
}
