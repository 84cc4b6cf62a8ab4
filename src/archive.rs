//! In-memory zip archives of label images

use crate::error::{Error, Result};
use image::{ImageFormat, RgbImage};
use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name offered for download
pub const ARCHIVE_FILE_NAME: &str = "qr_codes.zip";
/// MIME type of the archive
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// A finished zip archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    bytes: Vec<u8>,
    entries: Vec<String>,
}

impl Archive {
    /// Raw zip bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the archive, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Entry names in archive order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the archive holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the archive to disk, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, &self.bytes)?;
        tracing::info!(
            path = %path.display(),
            entries = self.entries.len(),
            bytes = self.bytes.len(),
            "Wrote archive"
        );
        Ok(())
    }
}

/// Resolve an image format name such as `png` or `JPG`.
pub fn image_format(identifier: &str) -> Result<ImageFormat> {
    let format = ImageFormat::from_extension(identifier.trim().to_ascii_lowercase())
        .ok_or_else(|| Error::Config(format!("Unknown image format '{identifier}'")))?;
    if !format.writing_enabled() {
        return Err(Error::Config(format!(
            "Image format '{identifier}' cannot be written"
        )));
    }
    Ok(format)
}

/// Replace path separators so a rendered stem names a single file.
///
/// With no separator left, a leading `..` is just part of the file name.
pub fn flat_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Check that `name` has no directory part.
pub(crate) fn ensure_flat(name: &str) -> Result<()> {
    if name.contains(['/', '\\']) {
        return Err(Error::Archive(format!(
            "Entry name '{name}' must not contain path separators"
        )));
    }
    Ok(())
}

/// Encode each image in `format` and store it under its filename.
///
/// Later items replace earlier items with the same filename. Names with a
/// directory part are rejected.
pub fn build<'a, I>(items: I, format: ImageFormat) -> Result<Archive>
where
    I: IntoIterator<Item = (&'a RgbImage, &'a str)>,
{
    let items: Vec<(&RgbImage, &str)> = items.into_iter().collect();
    for (_, name) in &items {
        ensure_flat(name)?;
    }

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    for (image, name) in items.into_iter().rev() {
        if seen.insert(name) {
            kept.push((image, name));
        } else {
            tracing::warn!(filename = name, "Duplicate archive entry, keeping the later image");
        }
    }
    kept.reverse();

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::with_capacity(kept.len());

    for (image, name) in kept {
        let mut encoded = Cursor::new(Vec::new());
        image.write_to(&mut encoded, format)?;

        writer.start_file(name, options)?;
        writer.write_all(encoded.get_ref())?;
        entries.push(name.to_string());
    }

    let bytes = writer.finish()?.into_inner();
    tracing::debug!(entries = entries.len(), bytes = bytes.len(), ?format, "Built archive");

    Ok(Archive { bytes, entries })
}
