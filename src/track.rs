//! GPX track file parsing
//!
//! Only waypoints (`<wpt>`) are read; tracks and routes in the same file are
//! ignored.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// A named geographic point from a track file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Waypoint name, empty when the file has none
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Waypoint {
    /// Create a waypoint from its parts
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Waypoints parsed from one uploaded file, together with its stem
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFile {
    /// File name without directory and extension
    pub stem: String,
    /// Waypoints in file order
    pub waypoints: Vec<Waypoint>,
}

impl TrackFile {
    /// Number of waypoints
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// True when the file holds no waypoints
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Parse GPX bytes into a [`TrackFile`].
pub fn parse(bytes: &[u8], stem: &str) -> Result<TrackFile> {
    let gpx = gpx::read(Cursor::new(bytes)).map_err(|e| Error::Parse(e.to_string()))?;

    let waypoints: Vec<Waypoint> = gpx
        .waypoints
        .iter()
        .map(|wpt| {
            let point = wpt.point();
            Waypoint {
                name: wpt.name.clone().unwrap_or_default(),
                latitude: point.y(),
                longitude: point.x(),
            }
        })
        .collect();

    tracing::debug!(
        stem,
        waypoints = waypoints.len(),
        tracks = gpx.tracks.len(),
        "Parsed track file"
    );

    Ok(TrackFile {
        stem: stem.to_string(),
        waypoints,
    })
}

/// File stem of an uploaded file name: no directory, no final extension.
pub fn file_stem(name: impl AsRef<Path>) -> String {
    name.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
