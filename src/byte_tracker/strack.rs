use super::motion::{ConstantVelocity, StateMean, StateVar};
use crate::{detection::Detection, rect::Rect};
use nalgebra::Point2;
use std::fmt::Debug;

/*----------------------------------------------------------------------------
STrack State enums
----------------------------------------------------------------------------*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum STrackState {
    New,
    Tracked,
    Lost,
    Removed,
}

/*----------------------------------------------------------------------------
STrack struct
----------------------------------------------------------------------------*/

impl Debug for STrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "STrack {{ track_id: {}, frame_id: {}, start_frame_id: {}, tracklet_len: {}, state: {:?}, score: {}, bbox: {:?} }}",
            self.track_id,
            self.frame_id,
            self.start_frame_id,
            self.tracklet_len,
            self.state,
            self.score,
            self.get_bbox().get_xyxy()
        )
    }
}

#[derive(Clone)]
pub struct STrack {
    motion: ConstantVelocity,
    mean: StateMean,
    variance: StateVar,
    rect: Rect<f32>,
    state: STrackState,
    score: f32,
    track_id: usize,
    frame_id: usize,
    start_frame_id: usize,
    tracklet_len: usize,
}

impl STrack {
    pub fn new(detection: &Detection) -> Self {
        Self {
            motion: ConstantVelocity::default(),
            mean: StateMean::zeros(),
            variance: StateVar::zeros(),
            rect: detection.get_rect().clone(),
            state: STrackState::New,
            score: detection.get_score(),
            track_id: 0,
            frame_id: 0,
            start_frame_id: 0,
            tracklet_len: 0,
        }
    }

    /// Last associated detection box, before any prediction.
    pub fn get_rect(&self) -> Rect<f32> {
        self.rect.clone()
    }

    /// Box derived from the motion state (predicted while unmatched).
    pub fn get_bbox(&self) -> Rect<f32> {
        Rect::from_cxcywh(
            self.mean[(0, 0)],
            self.mean[(0, 1)],
            self.mean[(0, 2)],
            self.mean[(0, 3)],
        )
    }

    pub fn get_center(&self) -> Point2<f32> {
        Point2::new(self.mean[(0, 0)], self.mean[(0, 1)])
    }

    pub fn get_velocity(&self) -> [f32; 4] {
        [
            self.mean[(0, 4)],
            self.mean[(0, 5)],
            self.mean[(0, 6)],
            self.mean[(0, 7)],
        ]
    }

    pub fn get_variance(&self) -> [f32; 8] {
        let mut out = [0.0; 8];
        out.copy_from_slice(self.variance.as_slice());
        out
    }

    pub fn get_strack_state(&self) -> STrackState {
        self.state
    }

    pub fn get_score(&self) -> f32 {
        self.score
    }

    pub fn get_track_id(&self) -> usize {
        self.track_id
    }

    pub fn get_frame_id(&self) -> usize {
        self.frame_id
    }

    pub fn get_start_frame_id(&self) -> usize {
        self.start_frame_id
    }

    pub fn get_tracklet_length(&self) -> usize {
        self.tracklet_len
    }

    pub(crate) fn activate(&mut self, frame_id: usize, track_id: usize) {
        self.motion.initiate(
            &mut self.mean,
            &mut self.variance,
            &self.rect.get_cxcywh(),
        );

        self.state = STrackState::Tracked;
        self.track_id = track_id;
        self.frame_id = frame_id;
        self.start_frame_id = frame_id;
        self.tracklet_len = 1;
    }

    pub(crate) fn predict(&mut self) {
        self.motion.predict(&mut self.mean, &mut self.variance);
    }

    pub(crate) fn update(&mut self, detection: &Detection, frame_id: usize) {
        self.motion
            .update(&mut self.mean, &detection.get_rect().get_cxcywh());

        self.rect = detection.get_rect().clone();
        self.state = STrackState::Tracked;
        self.score = detection.get_score();
        self.frame_id = frame_id;
        self.tracklet_len += 1;
    }

    pub(crate) fn mark_as_lost(&mut self) {
        self.state = STrackState::Lost;
    }

    pub(crate) fn mark_as_removed(&mut self) {
        self.state = STrackState::Removed;
    }

    /// Frames elapsed since the last successful update.
    pub fn frames_since_update(&self, current_frame: usize) -> usize {
        current_frame.saturating_sub(self.frame_id)
    }
}

impl PartialEq for STrack {
    fn eq(&self, other: &Self) -> bool {
        self.track_id == other.track_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    fn activated(x1: f32, y1: f32, x2: f32, y2: f32) -> STrack {
        let mut track = STrack::new(&Detection::from_xyxy(x1, y1, x2, y2, 0.9));
        track.activate(1, 7);
        track
    }

    #[test]
    fn test_activate() {
        let track = activated(0.0, 0.0, 10.0, 20.0);
        assert_eq!(track.get_track_id(), 7);
        assert_eq!(track.get_strack_state(), STrackState::Tracked);
        assert_eq!(track.get_tracklet_length(), 1);
        assert_eq!(track.get_start_frame_id(), 1);
        assert_eq!(track.get_bbox().get_xyxy(), [0.0, 0.0, 10.0, 20.0]);
        assert_eq!(track.get_velocity(), [0.0; 4]);
    }

    #[test]
    fn test_update_then_predict_extrapolates() {
        let mut track = activated(0.0, 0.0, 10.0, 10.0);
        track.predict();
        track.update(&Detection::from_xyxy(2.0, 1.0, 12.0, 11.0, 0.7), 2);

        assert_eq!(track.get_velocity(), [2.0, 1.0, 0.0, 0.0]);
        assert_eq!(track.get_tracklet_length(), 2);
        assert_eq!(track.get_frame_id(), 2);
        assert_eq!(track.get_score(), 0.7);

        track.predict();
        assert_eq!(track.get_bbox().get_xyxy(), [4.0, 2.0, 14.0, 12.0]);
        // The raw box stays at the last detection.
        assert_eq!(track.get_rect().get_xyxy(), [2.0, 1.0, 12.0, 11.0]);
    }

    #[test]
    fn test_variance_is_inflated_but_not_corrected() {
        let mut track = activated(0.0, 0.0, 10.0, 10.0);
        track.predict();
        track.update(&Detection::from_xyxy(0.0, 0.0, 10.0, 10.0, 0.9), 2);
        for v in track.get_variance() {
            assert_nearly_eq!(v, 1100.0, 1e-2);
        }
    }

    #[test]
    fn test_frames_since_update() {
        let track = activated(0.0, 0.0, 10.0, 10.0);
        assert_eq!(track.frames_since_update(4), 3);
        assert_eq!(track.frames_since_update(0), 0);
    }
}
