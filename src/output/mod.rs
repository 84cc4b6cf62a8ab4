//! Helpers for presenting a conversion: link listings and image previews

use crate::LabeledCode;
use crate::archive;
use crate::error::Result;
use image::ImageFormat;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// Combined structured and human-readable listing of generated links
#[derive(Debug, Clone)]
pub struct RenderedLinks {
    /// Structured JSON representation suitable for downstream consumers
    pub json: Value,
    /// Human-readable `title: url` lines for terminal presentation
    pub human: Vec<String>,
}

/// Render the title → URL pairs of a batch in both JSON and human-readable forms.
pub fn render_links(labels: &[LabeledCode]) -> RenderedLinks {
    let human = labels
        .iter()
        .map(|label| format!("{}: {}", label.title, label.url))
        .collect();

    RenderedLinks {
        json: links_value(labels),
        human,
    }
}

/// Produce a structured JSON listing of the batch.
pub fn links_value(labels: &[LabeledCode]) -> Value {
    let links: Vec<Value> = labels
        .iter()
        .map(|label| {
            json!({
                "title": label.title,
                "url": label.url,
                "filename": label.filename,
                "width": label.image.width(),
                "height": label.image.height(),
            })
        })
        .collect();

    json!({
        "count": labels.len(),
        "links": links,
    })
}

/// Save every label image under `dir`, creating it when missing.
///
/// Labels sharing a filename overwrite each other, the last one wins. A
/// filename with a directory part is an error and nothing is written for it.
pub fn write_previews(
    labels: &[LabeledCode],
    dir: &Path,
    format: ImageFormat,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(labels.len());
    for label in labels {
        archive::ensure_flat(&label.filename)?;
        let path = dir.join(&label.filename);
        label.image.save_with_format(&path, format)?;
        tracing::debug!(path = %path.display(), "Wrote preview image");
        if !written.contains(&path) {
            written.push(path);
        }
    }

    Ok(written)
}
