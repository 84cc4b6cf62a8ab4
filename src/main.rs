//! gpxqr command-line entrypoint

use clap::Parser;
use gpxqr::output::{render_links, write_previews};
use gpxqr::{ARCHIVE_FILE_NAME, GpxQrConfig, Result, archive_labels, generate, logging, track};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "gpxqr",
    version,
    about = "Turn GPX waypoints into labeled QR codes packaged as a zip archive"
)]
struct Cli {
    /// GPX file to convert
    #[arg(value_name = "TRACK")]
    track: PathBuf,

    /// Optional configuration file (toml/yaml). Defaults to gpxqr.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where to write the zip archive
    #[arg(short, long, value_name = "PATH", default_value = ARCHIVE_FILE_NAME)]
    output: PathBuf,

    /// URL template, e.g. "geo:{wp.latitude},{wp.longitude}"
    #[arg(long, value_name = "TEMPLATE")]
    url_template: Option<String>,

    /// Title template printed under each code
    #[arg(long, value_name = "TEMPLATE")]
    title_template: Option<String>,

    /// Image file stem template
    #[arg(long, value_name = "TEMPLATE")]
    filename_template: Option<String>,

    /// Image format and file extension (png, jpg, bmp, ...)
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// QR code width in pixels
    #[arg(long, value_name = "PX")]
    width: Option<u32>,

    /// QR code height in pixels
    #[arg(long, value_name = "PX")]
    height: Option<u32>,

    /// Title font size in pixels
    #[arg(long, value_name = "PX")]
    font_size: Option<f32>,

    /// Title padding in pixels
    #[arg(long, value_name = "PX")]
    padding: Option<u32>,

    /// TrueType/OpenType font file for titles
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// System font family for titles
    #[arg(long, value_name = "NAME", conflicts_with = "font")]
    font_family: Option<String>,

    /// Also write every image into this directory
    #[arg(long, value_name = "DIR")]
    preview_dir: Option<PathBuf>,

    /// Decode every generated code and check it against its URL
    #[arg(long)]
    verify: bool,

    /// Print links as JSON instead of `title: url` lines
    #[arg(long)]
    json: bool,

    /// Only print the links, do not write the archive
    #[arg(long)]
    links_only: bool,
}

impl Cli {
    fn apply(&self, config: &mut GpxQrConfig) {
        let render = &mut config.render;
        if let Some(template) = &self.url_template {
            render.url_template = template.clone();
        }
        if let Some(template) = &self.title_template {
            render.title_template = template.clone();
        }
        if let Some(template) = &self.filename_template {
            render.filename_template = template.clone();
        }
        if let Some(format) = &self.format {
            render.image_format = format.clone();
        }
        if let Some(width) = self.width {
            render.image_width = width;
        }
        if let Some(height) = self.height {
            render.image_height = height;
        }
        if let Some(size) = self.font_size {
            render.font_size = size;
        }
        if let Some(padding) = self.padding {
            render.title_padding = padding;
        }
        if let Some(path) = &self.font {
            render.font.path = Some(path.clone());
            render.font.family = None;
        }
        if let Some(family) = &self.font_family {
            render.font.family = Some(family.clone());
            render.font.path = None;
        }
        if self.verify {
            render.verify = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = GpxQrConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    logging::init(&config.logging)?;

    let bytes = std::fs::read(&cli.track)?;
    let stem = track::file_stem(&cli.track);
    info!(track = %cli.track.display(), stem = %stem, "Converting track file");

    let labels = generate(&bytes, &stem, &config.render)?;

    let links = render_links(&labels);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&links.json)?);
    } else {
        for line in &links.human {
            println!("{line}");
        }
    }

    if let Some(dir) = &cli.preview_dir {
        let written = write_previews(&labels, dir, config.render.output_format()?)?;
        info!(dir = %dir.display(), images = written.len(), "Wrote preview images");
    }

    if cli.links_only {
        return Ok(());
    }

    let archive = archive_labels(&labels, &config.render)?;
    archive.write_to(&cli.output)?;

    Ok(())
}
