//! Per-frame glue: shapes in, identified blobs out.
//!
//! ByteTrack runs first. If it is disabled or returns an error, that frame
//! is handed to the centroid tracker instead, and the next frame tries
//! ByteTrack again. With `track_ids` off no tracker runs at all.

use crate::{
    byte_tracker::ByteTracker,
    centroid_tracker::CentroidTracker,
    config::PipelineConfig,
    detection::Detection,
    error::TrackError,
    reconcile::{reconcile, Shape, TrackedBlob},
    tracker::{MultiObjectTracker, TrackedObject, TrackerStats},
};
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerKind {
    ByteTrack,
    Centroid,
    /// Tracking is off; ids are per-frame indices.
    Sequential,
}

#[derive(Debug, Clone)]
pub struct FrameResult {
    pub blobs: Vec<TrackedBlob>,
    pub stats: TrackerStats,
    pub source: TrackerKind,
}

pub struct BlobPipeline {
    primary: Option<Box<dyn MultiObjectTracker>>,
    fallback: CentroidTracker,
    track_ids: bool,
    association_radius: f32,
    detection_score: f32,
    fallback_frames: usize,
}

impl BlobPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self, TrackError> {
        config.validate()?;

        let primary: Option<Box<dyn MultiObjectTracker>> = if config.use_bytetrack {
            Some(Box::new(ByteTracker::from_config(&config.bytetrack)?))
        } else {
            None
        };
        info!(
            "blob pipeline ready: track_ids={}, bytetrack={}, radius={}",
            config.track_ids, config.use_bytetrack, config.association_radius
        );

        Ok(Self {
            primary,
            fallback: CentroidTracker::from_config(&config.centroid)?,
            track_ids: config.track_ids,
            association_radius: config.association_radius,
            detection_score: config.detection_score,
            fallback_frames: 0,
        })
    }

    /// Swap in a different primary tracker.
    pub fn with_tracker(self, tracker: Box<dyn MultiObjectTracker>) -> Self {
        Self {
            primary: Some(tracker),
            ..self
        }
    }

    /// Frames that were processed by the centroid tracker.
    pub fn fallback_frames(&self) -> usize {
        self.fallback_frames
    }

    pub fn to_detections(&self, shapes: &[Shape]) -> Vec<Detection> {
        shapes
            .iter()
            .map(|shape| Detection::new(shape.rect.clone(), self.detection_score, None))
            .collect()
    }

    fn track(&mut self, detections: &[Detection]) -> (Vec<TrackedObject>, TrackerKind) {
        if let Some(primary) = self.primary.as_mut() {
            match primary.update(detections) {
                Ok(tracks) => return (tracks, TrackerKind::ByteTrack),
                Err(e) => warn!("tracker update failed: {}, using centroid tracker", e),
            }
        }

        self.fallback_frames += 1;
        match self.fallback.update(detections) {
            Ok(tracks) => (tracks, TrackerKind::Centroid),
            Err(e) => {
                warn!("centroid tracker rejected frame: {}", e);
                (Vec::new(), TrackerKind::Centroid)
            }
        }
    }

    pub fn process(&mut self, shapes: &[Shape]) -> FrameResult {
        if !self.track_ids {
            let blobs = shapes
                .iter()
                .enumerate()
                .map(|(i, shape)| TrackedBlob::bind(i, shape.clone(), false))
                .collect();
            return FrameResult {
                blobs,
                stats: self.stats(),
                source: TrackerKind::Sequential,
            };
        }

        let detections = self.to_detections(shapes);
        let (tracks, source) = self.track(&detections);
        let blobs = reconcile(&tracks, shapes, self.association_radius);

        FrameResult {
            blobs,
            stats: self.stats_for(source),
            source,
        }
    }

    fn stats_for(&self, kind: TrackerKind) -> TrackerStats {
        match (kind, self.primary.as_ref()) {
            (TrackerKind::ByteTrack, Some(primary)) => primary.stats(),
            _ => self.fallback.stats(),
        }
    }

    /// Stats of the tracker that normally serves frames.
    pub fn stats(&self) -> TrackerStats {
        match self.primary.as_ref() {
            Some(primary) => primary.stats(),
            None => self.fallback.stats(),
        }
    }

    pub fn reset(&mut self) {
        if let Some(primary) = self.primary.as_mut() {
            primary.reset();
        }
        self.fallback.reset();
        self.fallback_frames = 0;
    }
}
