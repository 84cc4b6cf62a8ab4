//! gpxqr runtime configuration handling

use crate::archive;
use crate::error::{Error, Result};
use crate::template::Template;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default URL template: a Google Maps search for the waypoint
pub const DEFAULT_URL_TEMPLATE: &str = "http://maps.google.com/?q={wp.latitude},{wp.longitude}";
/// Default title template
pub const DEFAULT_TITLE_TEMPLATE: &str = "{wp.name}";
/// Default filename stem template
pub const DEFAULT_FILENAME_TEMPLATE: &str = "{gpx_stem}_{wp.name}";

/// Largest accepted QR width or height in pixels
pub const MAX_IMAGE_SIDE: u32 = 8192;
/// Largest accepted title padding in pixels
pub const MAX_TITLE_PADDING: u32 = 4096;
/// Largest accepted title font size in pixels
pub const MAX_FONT_SIZE: f32 = 1024.0;

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpxQrConfig {
    /// Templates and image layout
    pub render: RenderOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl GpxQrConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No gpxqr.toml / gpxqr.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["gpxqr.toml", "gpxqr.yaml", "gpxqr.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("gpxqr");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.render.apply_env_overrides();
        self.logging.apply_env_overrides();
    }
}

/// Templates, image layout and output format for one conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Template for the URL encoded in each QR code
    pub url_template: String,
    /// Template for the title printed under each code
    pub title_template: String,
    /// Template for each image's file name, without extension
    pub filename_template: String,
    /// Image format identifier, also used as the file extension (e.g. `png`)
    pub image_format: String,
    /// QR code width in pixels
    pub image_width: u32,
    /// QR code height in pixels
    pub image_height: u32,
    /// Title font size in pixels
    pub font_size: f32,
    /// Vertical padding around the title in pixels
    pub title_padding: u32,
    /// Title font selection
    pub font: FontOptions,
    /// Decode every generated code and compare it with its URL
    pub verify: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            title_template: DEFAULT_TITLE_TEMPLATE.to_string(),
            filename_template: DEFAULT_FILENAME_TEMPLATE.to_string(),
            image_format: "png".to_string(),
            image_width: 78,
            image_height: 78,
            font_size: 15.0,
            title_padding: 10,
            font: FontOptions::default(),
            verify: false,
        }
    }
}

impl RenderOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(template) = env::var("GPXQR_URL_TEMPLATE") {
            self.url_template = template;
        }
        if let Ok(template) = env::var("GPXQR_TITLE_TEMPLATE") {
            self.title_template = template;
        }
        if let Ok(template) = env::var("GPXQR_FILENAME_TEMPLATE") {
            self.filename_template = template;
        }
        if let Ok(format) = env::var("GPXQR_IMAGE_FORMAT") {
            self.image_format = format;
        }
        if let Ok(width) = env::var("GPXQR_IMAGE_WIDTH") {
            if let Ok(parsed) = width.parse::<u32>() {
                self.image_width = parsed;
            }
        }
        if let Ok(height) = env::var("GPXQR_IMAGE_HEIGHT") {
            if let Ok(parsed) = height.parse::<u32>() {
                self.image_height = parsed;
            }
        }
        if let Ok(size) = env::var("GPXQR_FONT_SIZE") {
            if let Ok(parsed) = size.parse::<f32>() {
                self.font_size = parsed;
            }
        }
        if let Ok(padding) = env::var("GPXQR_TITLE_PADDING") {
            if let Ok(parsed) = padding.parse::<u32>() {
                self.title_padding = parsed;
            }
        }
        if let Ok(path) = env::var("GPXQR_FONT_PATH") {
            self.font.path = if path.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Ok(family) = env::var("GPXQR_FONT_FAMILY") {
            self.font.family = if family.trim().is_empty() {
                None
            } else {
                Some(family)
            };
        }
        if let Ok(verify) = env::var("GPXQR_VERIFY") {
            match verify.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => self.verify = true,
                "0" | "false" | "off" => self.verify = false,
                _ => {}
            }
        }
    }

    /// Check sizes, the image format and all three templates.
    pub fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(Error::Config(format!(
                "Image size must be positive, got {}x{}",
                self.image_width, self.image_height
            )));
        }
        if self.image_width > MAX_IMAGE_SIDE || self.image_height > MAX_IMAGE_SIDE {
            return Err(Error::Config(format!(
                "Image size {}x{} exceeds the {MAX_IMAGE_SIDE} px limit",
                self.image_width, self.image_height
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(Error::Config(format!(
                "Font size must be positive, got {}",
                self.font_size
            )));
        }
        if self.font_size > MAX_FONT_SIZE {
            return Err(Error::Config(format!(
                "Font size {} exceeds the {MAX_FONT_SIZE} px limit",
                self.font_size
            )));
        }
        if self.title_padding > MAX_TITLE_PADDING {
            return Err(Error::Config(format!(
                "Title padding {} exceeds the {MAX_TITLE_PADDING} px limit",
                self.title_padding
            )));
        }
        self.output_format()?;
        self.templates()?;
        Ok(())
    }

    /// Resolved image format
    pub fn output_format(&self) -> Result<ImageFormat> {
        archive::image_format(&self.image_format)
    }

    /// Parsed URL, title and filename templates
    pub fn templates(&self) -> Result<Templates> {
        Ok(Templates {
            url: Template::parse(&self.url_template)?,
            title: Template::parse(&self.title_template)?,
            filename: Template::parse(&self.filename_template)?,
        })
    }
}

/// The three parsed templates of a [`RenderOptions`]
#[derive(Debug, Clone)]
pub struct Templates {
    /// URL template
    pub url: Template,
    /// Title template
    pub title: Template,
    /// Filename stem template
    pub filename: Template,
}

/// Title font selection; the embedded bitmap font is used when both are unset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontOptions {
    /// TrueType / OpenType file to load
    pub path: Option<PathBuf>,
    /// System font family name, looked up when `path` is unset
    pub family: Option<String>,
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `GPXQR_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stderr logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("GPXQR_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("GPXQR_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("GPXQR_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("GPXQR_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::from_str(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}
