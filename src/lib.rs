//! GPXQR - labeled QR codes for GPX waypoints
//!
//! Every waypoint of a GPX file becomes a QR code that encodes a URL built
//! from a template (by default a map link), with a title printed underneath.
//! The images are packaged into one zip archive.
//!
//! # Pipeline
//!
//! - **Track parsing**: waypoints in file order ([`track`])
//! - **Templates**: URL, title and file name per waypoint ([`template`])
//! - **QR encoding**: level H, rescaled to a fixed size ([`qr`])
//! - **Labels**: code plus centered title ([`label`])
//! - **Archive**: in-memory zip ([`archive`])
//!
//! # Example
//!
//! ```no_run
//! use gpxqr::{RenderOptions, convert, track};
//!
//! fn main() -> gpxqr::Result<()> {
//!     let bytes = std::fs::read("hike.gpx")?;
//!     let archive = convert(&bytes, &track::file_stem("hike.gpx"), &RenderOptions::default())?;
//!
//!     archive.write_to(std::path::Path::new(gpxqr::ARCHIVE_FILE_NAME))?;
//!     println!("{} codes", archive.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod archive;
pub mod config;
pub mod error;
pub mod label;
pub mod logging;
pub mod output;
pub mod qr;
pub mod template;
pub mod track;

// Re-exports for convenience
pub use error::{Error, Result};

pub use archive::{ARCHIVE_CONTENT_TYPE, ARCHIVE_FILE_NAME, Archive};
pub use config::{FontOptions, GpxQrConfig, LogRotation, LoggingOptions, RenderOptions};
pub use label::LabelFont;
pub use qr::{QrDecoder, QrEncoder, QrPayload};
pub use template::{RenderContext, Template};
pub use track::{TrackFile, Waypoint};

use image::RgbImage;

/// Strings rendered from the templates for one waypoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedItem {
    /// URL encoded in the QR code
    pub url: String,
    /// Title printed under the code
    pub title: String,
    /// File name without extension, path separators replaced by `_`
    pub output_stem: String,
}

/// One finished label image
#[derive(Debug, Clone)]
pub struct LabeledCode {
    /// Title printed under the code
    pub title: String,
    /// URL encoded in the code
    pub url: String,
    /// Archive entry name, `{output_stem}.{image_format}`
    pub filename: String,
    /// Composed label pixels
    pub image: RgbImage,
}

/// Generate one label per waypoint, in file order.
///
/// Options are validated and templates compiled before any waypoint is
/// processed. The first error aborts the batch.
pub fn generate(
    track_bytes: &[u8],
    file_stem: &str,
    options: &RenderOptions,
) -> Result<Vec<LabeledCode>> {
    options.validate()?;
    let templates = options.templates()?;
    let font = LabelFont::load(&options.font, options.font_size)?;
    let track = track::parse(track_bytes, file_stem)?;

    tracing::info!(
        stem = %track.stem,
        waypoints = track.len(),
        width = options.image_width,
        height = options.image_height,
        "Generating QR labels"
    );

    let mut labels = Vec::with_capacity(track.len());
    for (index, waypoint) in track.waypoints.iter().enumerate() {
        let span = tracing::info_span!("waypoint", index, name = %waypoint.name);
        let _entered = span.enter();

        let ctx = RenderContext::new(waypoint, &track.stem);
        let item = RenderedItem {
            url: templates.url.render(&ctx),
            title: templates.title.render(&ctx),
            output_stem: archive::flat_file_name(&templates.filename.render(&ctx)),
        };
        labels.push(label_waypoint(item, &font, options)?);
    }

    Ok(labels)
}

/// Generate all labels and package them into a zip archive.
pub fn convert(track_bytes: &[u8], file_stem: &str, options: &RenderOptions) -> Result<Archive> {
    let labels = generate(track_bytes, file_stem, options)?;
    archive_labels(&labels, options)
}

/// Package already generated labels using the configured image format.
pub fn archive_labels(labels: &[LabeledCode], options: &RenderOptions) -> Result<Archive> {
    let format = options.output_format()?;
    archive::build(
        labels
            .iter()
            .map(|label| (&label.image, label.filename.as_str())),
        format,
    )
}

fn label_waypoint(item: RenderedItem, font: &LabelFont, options: &RenderOptions) -> Result<LabeledCode> {
    // A fresh encoder per waypoint: nothing from the previous payload survives.
    let encoder = QrEncoder::new();
    let code = encoder.encode_sized(&item.url, options.image_width, options.image_height)?;

    if options.verify {
        verify_code(&code, &item.url)?;
    }

    let image = label::compose(&code, &item.title, font, options.title_padding);
    let filename = format!("{}.{}", item.output_stem, options.image_format);
    tracing::debug!(
        url = %item.url,
        filename = %filename,
        width = image.width(),
        height = image.height(),
        "Composed label"
    );

    Ok(LabeledCode {
        title: item.title,
        url: item.url,
        filename,
        image,
    })
}

fn verify_code(code: &RgbImage, url: &str) -> Result<()> {
    let decoded = QrDecoder::new().decode_rgb(code)?;
    match decoded.as_str() {
        Some(text) if text == url => Ok(()),
        other => Err(Error::Verification {
            url: url.to_string(),
            decoded: other
                .map(str::to_string)
                .unwrap_or_else(|| format!("<{} non-UTF-8 bytes>", decoded.as_bytes().len())),
        }),
    }
}
