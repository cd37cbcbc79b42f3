//! Tracker configuration.
//!
//! Every struct deserializes with defaults for missing fields, so a partial
//! JSON/TOML document is enough. Values are fixed once a tracker is built.

use crate::error::TrackError;
use serde::{Deserialize, Serialize};

fn check_unit(name: &str, value: f32) -> Result<(), TrackError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(TrackError::ConfigError(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f32) -> Result<(), TrackError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(TrackError::ConfigError(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ByteTrackConfig {
    /// Minimum score to spawn a track or join the first association.
    pub track_thresh: f32,
    /// Frames a lost track is kept before it is removed.
    pub track_buffer: usize,
    /// Maximum `1 - IoU` cost accepted in the first association.
    pub match_thresh: f32,
    /// Detections smaller than this are ignored entirely.
    pub min_box_area: f32,
}

impl Default for ByteTrackConfig {
    fn default() -> Self {
        Self {
            track_thresh: 0.5,
            track_buffer: 30,
            match_thresh: 0.8,
            min_box_area: 10.0,
        }
    }
}

impl ByteTrackConfig {
    pub fn validate(&self) -> Result<(), TrackError> {
        check_unit("track_thresh", self.track_thresh)?;
        check_unit("match_thresh", self.match_thresh)?;
        if !(self.min_box_area.is_finite() && self.min_box_area >= 0.0) {
            return Err(TrackError::ConfigError(format!(
                "min_box_area must be >= 0, got {}",
                self.min_box_area
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentroidConfig {
    pub max_distance: f32,
    pub max_age: usize,
}

impl Default for CentroidConfig {
    fn default() -> Self {
        Self {
            max_distance: 50.0,
            max_age: 5,
        }
    }
}

impl CentroidConfig {
    pub fn validate(&self) -> Result<(), TrackError> {
        check_positive("max_distance", self.max_distance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// When false no tracker runs and blobs are numbered 0.. in detection
    /// order every frame.
    pub track_ids: bool,
    /// Run ByteTrack first; when false only the centroid tracker is used.
    pub use_bytetrack: bool,
    pub bytetrack: ByteTrackConfig,
    pub centroid: CentroidConfig,
    /// A track binds to a detected shape only if their centroids are closer
    /// than this.
    pub association_radius: f32,
    /// Score given to shapes, which carry no confidence of their own.
    pub detection_score: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            track_ids: true,
            use_bytetrack: true,
            bytetrack: ByteTrackConfig::default(),
            centroid: CentroidConfig::default(),
            association_radius: 50.0,
            detection_score: 1.0,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), TrackError> {
        self.bytetrack.validate()?;
        self.centroid.validate()?;
        check_positive("association_radius", self.association_radius)?;
        check_unit("detection_score", self.detection_score)
    }
}
