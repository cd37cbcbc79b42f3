//! The per-frame contract shared by every tracker in the crate.

use crate::{detection::Detection, error::TrackError, rect::Rect};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A track reported for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub track_id: usize,
    pub rect: Rect<f32>,
    pub score: f32,
}

impl TrackedObject {
    pub fn new(track_id: usize, rect: Rect<f32>, score: f32) -> Self {
        Self {
            track_id,
            rect,
            score,
        }
    }

    pub fn center(&self) -> Point2<f32> {
        let (cx, cy) = self.rect.center();
        Point2::new(cx, cy)
    }
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    pub active_tracks: usize,
    pub lost_tracks: usize,
    /// Ids handed out since construction or the last reset.
    pub total_tracks: usize,
    pub frame_id: usize,
}

pub trait MultiObjectTracker: Send {
    /// Consumes one frame of detections and returns the tracks alive in it.
    fn update(
        &mut self,
        detections: &[Detection],
    ) -> Result<Vec<TrackedObject>, TrackError>;

    /// Forgets every track and zeroes the id and frame counters.
    fn reset(&mut self);

    fn stats(&self) -> TrackerStats;
}
