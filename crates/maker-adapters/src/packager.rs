//! Zip archives of generated project directories.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use tracing::{debug, instrument};
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use maker_core::{
    application::{ApplicationError, ports::Packager},
    error::{MakerError, MakerResult},
};

/// Packs every regular file under a directory into a deflated zip.
///
/// Entry names are relative to the directory and always use `/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPackager;

impl ZipPackager {
    pub fn new() -> Self {
        Self
    }
}

impl Packager for ZipPackager {
    #[instrument(skip(self), fields(dir = %source_dir.display()))]
    fn package(&self, source_dir: &Path) -> MakerResult<Vec<u8>> {
        if !source_dir.is_dir() {
            return Err(packaging_error(source_dir, "not a directory"));
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entries = 0usize;

        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| packaging_error(source_dir, e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|e| packaging_error(entry.path(), e))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let bytes = fs::read(entry.path()).map_err(|e| packaging_error(entry.path(), e))?;
            writer
                .start_file(name, options)
                .map_err(|e| packaging_error(entry.path(), e))?;
            writer
                .write_all(&bytes)
                .map_err(|e| packaging_error(entry.path(), e))?;
            entries += 1;
        }

        let archive = writer
            .finish()
            .map_err(|e| packaging_error(source_dir, e))?
            .into_inner();

        debug!(entries, bytes = archive.len(), "archive built");
        Ok(archive)
    }

    fn extension(&self) -> &'static str {
        "zip"
    }
}

fn packaging_error(path: &Path, reason: impl ToString) -> MakerError {
    ApplicationError::PackagingFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
    .into()
}
