use super::strack::{STrack, STrackState};
use crate::{
    config::ByteTrackConfig,
    detection::Detection,
    error::TrackError,
    matching::{associate, Assignment, AssignmentSolver, LapjvSolver},
    rect::Rect,
    tracker::{MultiObjectTracker, TrackedObject, TrackerStats},
};
use log::debug;
use std::collections::HashMap;

/// Cost threshold for the low-score and lost-track associations.
const SECONDARY_MATCH_THRESH: f32 = 0.5;

/// Drops boxes below `min_box_area`, then splits the rest by score.
///
/// Both halves keep the input order.
pub fn partition_detections<'a>(
    detections: &'a [Detection],
    min_box_area: f32,
    track_thresh: f32,
) -> (Vec<&'a Detection>, Vec<&'a Detection>) {
    detections
        .iter()
        .filter(|det| det.area() >= min_box_area)
        .partition(|det| det.get_score() >= track_thresh)
}

/*-----------------------------------------------------------------------------
ByteTracker
-----------------------------------------------------------------------------*/

#[derive(Debug)]
pub struct ByteTracker {
    track_thresh: f32,
    track_buffer: usize,
    match_thresh: f32,
    min_box_area: f32,
    solver: Option<Box<dyn AssignmentSolver>>,

    frame_id: usize,
    track_id_count: usize,

    stracks: HashMap<usize, STrack>,
    tracked_ids: Vec<usize>,
    lost_ids: Vec<usize>,
    removed_ids: Vec<usize>,
}

impl Default for ByteTracker {
    fn default() -> Self {
        let config = ByteTrackConfig::default();
        Self::new(
            config.track_thresh,
            config.track_buffer,
            config.match_thresh,
            config.min_box_area,
        )
    }
}

impl ByteTracker {
    pub fn new(
        track_thresh: f32,
        track_buffer: usize,
        match_thresh: f32,
        min_box_area: f32,
    ) -> Self {
        Self {
            track_thresh,
            track_buffer,
            match_thresh,
            min_box_area,
            solver: Some(Box::new(LapjvSolver)),

            frame_id: 0,
            track_id_count: 0,

            stracks: HashMap::new(),
            tracked_ids: Vec::new(),
            lost_ids: Vec::new(),
            removed_ids: Vec::new(),
        }
    }

    pub fn from_config(config: &ByteTrackConfig) -> Result<Self, TrackError> {
        config.validate()?;
        Ok(Self::new(
            config.track_thresh,
            config.track_buffer,
            config.match_thresh,
            config.min_box_area,
        ))
    }

    /// Replace the optimal assignment strategy.
    pub fn with_solver(self, solver: Box<dyn AssignmentSolver>) -> Self {
        Self {
            solver: Some(solver),
            ..self
        }
    }

    /// Use greedy matching only.
    pub fn without_optimal_solver(self) -> Self {
        Self {
            solver: None,
            ..self
        }
    }

    pub fn frame_id(&self) -> usize {
        self.frame_id
    }

    pub fn tracked_stracks(&self) -> Vec<&STrack> {
        self.tracks_in(&self.tracked_ids)
    }

    pub fn lost_stracks(&self) -> Vec<&STrack> {
        self.tracks_in(&self.lost_ids)
    }

    /// Ids of every track that has expired, in removal order.
    pub fn removed_track_ids(&self) -> &[usize] {
        &self.removed_ids
    }

    fn tracks_in(&self, ids: &[usize]) -> Vec<&STrack> {
        ids.iter().filter_map(|id| self.stracks.get(id)).collect()
    }

    fn strack(&self, track_id: usize) -> Result<&STrack, TrackError> {
        self.stracks.get(&track_id).ok_or_else(|| {
            TrackError::ByteTrackerError(format!(
                "track {} is not in the arena",
                track_id
            ))
        })
    }

    fn strack_mut(&mut self, track_id: usize) -> Result<&mut STrack, TrackError> {
        self.stracks.get_mut(&track_id).ok_or_else(|| {
            TrackError::ByteTrackerError(format!(
                "track {} is not in the arena",
                track_id
            ))
        })
    }

    fn bboxes(&self, ids: &[usize]) -> Result<Vec<Rect<f32>>, TrackError> {
        ids.iter()
            .map(|&id| self.strack(id).map(STrack::get_bbox))
            .collect()
    }

    fn associate(
        &self,
        track_ids: &[usize],
        detections: &[&Detection],
        thresh: f32,
    ) -> Result<Assignment, TrackError> {
        let track_rects = self.bboxes(track_ids)?;
        let det_rects = detections
            .iter()
            .map(|det| det.get_rect().clone())
            .collect::<Vec<_>>();
        Ok(associate(
            self.solver.as_deref(),
            &track_rects,
            &det_rects,
            thresh,
        ))
    }

    /// Updates the matched tracks and returns their ids.
    fn apply_matches(
        &mut self,
        assignment: &Assignment,
        track_ids: &[usize],
        detections: &[&Detection],
    ) -> Result<Vec<usize>, TrackError> {
        let frame_id = self.frame_id;
        let mut updated = Vec::with_capacity(assignment.matches.len());
        for &(ti, di) in &assignment.matches {
            let track_id = track_ids[ti];
            self.strack_mut(track_id)?.update(detections[di], frame_id);
            updated.push(track_id);
        }
        Ok(updated)
    }

    pub fn update(
        &mut self,
        detections: &[Detection],
    ) -> Result<Vec<STrack>, TrackError> {
        for det in detections {
            det.validate()?;
        }

        ////////////////// Step 1: Get detections //////////////////
        self.frame_id += 1;

        let (high_dets, low_dets) = partition_detections(
            detections,
            self.min_box_area,
            self.track_thresh,
        );

        let tracked_ids = std::mem::take(&mut self.tracked_ids);
        for &track_id in &tracked_ids {
            self.strack_mut(track_id)?.predict();
        }

        ////////////////// Step 2: First association, with high score detections //////////////////
        let first = self.associate(&tracked_ids, &high_dets, self.match_thresh)?;
        let mut activated_ids = self.apply_matches(&first, &tracked_ids, &high_dets)?;

        ////////////////// Step 3: Second association, with low score detections //////////////////
        let remain_ids = first
            .unmatched_tracks
            .iter()
            .map(|&ti| tracked_ids[ti])
            .collect::<Vec<_>>();
        let second = self.associate(&remain_ids, &low_dets, SECONDARY_MATCH_THRESH)?;
        activated_ids.extend(self.apply_matches(&second, &remain_ids, &low_dets)?);

        for &ti in &second.unmatched_tracks {
            let track_id = remain_ids[ti];
            self.strack_mut(track_id)?.mark_as_lost();
            self.lost_ids.push(track_id);
        }

        ////////////////// Step 4: Revive lost tracks from what is left //////////////////
        let remain_dets = first
            .unmatched_detections
            .iter()
            .map(|&di| high_dets[di])
            .chain(second.unmatched_detections.iter().map(|&di| low_dets[di]))
            .collect::<Vec<_>>();

        let lost_ids = std::mem::take(&mut self.lost_ids);
        let third = self.associate(&lost_ids, &remain_dets, SECONDARY_MATCH_THRESH)?;
        let refound_ids = self.apply_matches(&third, &lost_ids, &remain_dets)?;
        activated_ids.extend(refound_ids.iter().copied());
        self.lost_ids = third
            .unmatched_tracks
            .iter()
            .map(|&ti| lost_ids[ti])
            .collect();

        ////////////////// Step 5: Init new stracks //////////////////
        for &di in &third.unmatched_detections {
            let det = remain_dets[di];
            if det.get_score() < self.track_thresh {
                continue;
            }
            let track_id = self.track_id_count;
            self.track_id_count += 1;

            let mut strack = STrack::new(det);
            strack.activate(self.frame_id, track_id);
            self.stracks.insert(track_id, strack);
            activated_ids.push(track_id);
        }

        ////////////////// Step 6: Remove expired lost tracks //////////////////
        let mut kept_lost = Vec::with_capacity(self.lost_ids.len());
        for track_id in std::mem::take(&mut self.lost_ids) {
            let expired = self.strack(track_id)?.frames_since_update(self.frame_id)
                > self.track_buffer;
            if expired {
                if let Some(mut strack) = self.stracks.remove(&track_id) {
                    strack.mark_as_removed();
                    debug!("{:?} expired at frame {}", strack, self.frame_id);
                }
                self.removed_ids.push(track_id);
            } else {
                kept_lost.push(track_id);
            }
        }
        self.lost_ids = kept_lost;
        self.tracked_ids = activated_ids;

        debug!(
            "frame {}: {} high / {} low detections, {} tracked, {} refound, {} lost",
            self.frame_id,
            high_dets.len(),
            low_dets.len(),
            self.tracked_ids.len(),
            refound_ids.len(),
            self.lost_ids.len()
        );

        let output = self
            .tracked_stracks()
            .into_iter()
            .filter(|t| t.get_strack_state() == STrackState::Tracked)
            .cloned()
            .collect();
        Ok(output)
    }

    pub fn reset(&mut self) {
        self.frame_id = 0;
        self.track_id_count = 0;
        self.stracks.clear();
        self.tracked_ids.clear();
        self.lost_ids.clear();
        self.removed_ids.clear();
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            active_tracks: self.tracked_ids.len(),
            lost_tracks: self.lost_ids.len(),
            total_tracks: self.track_id_count,
            frame_id: self.frame_id,
        }
    }
}

impl MultiObjectTracker for ByteTracker {
    fn update(
        &mut self,
        detections: &[Detection],
    ) -> Result<Vec<TrackedObject>, TrackError> {
        let stracks = ByteTracker::update(self, detections)?;
        Ok(stracks
            .iter()
            .map(|t| TrackedObject::new(t.get_track_id(), t.get_bbox(), t.get_score()))
            .collect())
    }

    fn reset(&mut self) {
        ByteTracker::reset(self);
    }

    fn stats(&self) -> TrackerStats {
        ByteTracker::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Detection {
        Detection::from_xyxy(x1, y1, x2, y2, score)
    }

    fn ids(tracks: &[STrack]) -> Vec<usize> {
        tracks.iter().map(STrack::get_track_id).collect()
    }

    #[test]
    fn test_partition_detections() {
        let dets = vec![
            det(0., 0., 10., 10., 0.9),
            det(0., 0., 2., 2., 0.9),
            det(20., 20., 30., 30., 0.3),
            det(40., 40., 50., 50., 0.5),
        ];
        let (high, low) = partition_detections(&dets, 10.0, 0.5);
        assert_eq!(high, vec![&dets[0], &dets[3]]);
        assert_eq!(low, vec![&dets[2]]);
    }

    #[test]
    fn test_min_box_area_is_inclusive() {
        // 2 x 5 = 10 is kept, 3 x 3 = 9 is dropped.
        let dets = vec![det(0., 0., 2., 5., 0.9), det(10., 10., 13., 13., 0.9)];
        let (high, low) = partition_detections(&dets, 10.0, 0.5);
        assert_eq!(high, vec![&dets[0]]);
        assert!(low.is_empty());

        let mut tracker = ByteTracker::default();
        let out = tracker.update(&dets).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(tracker.stats().total_tracks, 1);
    }

    #[test]
    fn test_low_score_detection_never_spawns() {
        let mut tracker = ByteTracker::default();
        let out = tracker.update(&[det(0., 0., 10., 10., 0.3)]).unwrap();
        assert!(out.is_empty());
        assert_eq!(tracker.stats().total_tracks, 0);
    }

    #[test]
    fn test_low_score_detection_keeps_track_alive() {
        let mut tracker = ByteTracker::default();
        tracker.update(&[det(0., 0., 10., 10., 0.9)]).unwrap();
        let out = tracker.update(&[det(1., 0., 11., 10., 0.2)]).unwrap();
        assert_eq!(ids(&out), vec![0]);
        assert_eq!(out[0].get_tracklet_length(), 2);
        assert_eq!(out[0].get_score(), 0.2);
        assert_eq!(tracker.stats().lost_tracks, 0);
    }

    #[test]
    fn test_unmatched_track_becomes_lost() {
        let mut tracker = ByteTracker::default();
        tracker.update(&[det(0., 0., 10., 10., 0.9)]).unwrap();
        let out = tracker.update(&[det(100., 100., 110., 110., 0.9)]).unwrap();
        assert_eq!(ids(&out), vec![1]);

        let lost = tracker.lost_stracks();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].get_track_id(), 0);
        assert_eq!(lost[0].get_strack_state(), STrackState::Lost);
    }

    #[test]
    fn test_pools_stay_disjoint() {
        let mut tracker = ByteTracker::new(0.5, 3, 0.8, 10.0);
        let frames = vec![
            vec![det(0., 0., 10., 10., 0.9), det(50., 50., 60., 60., 0.9)],
            vec![det(0., 0., 10., 10., 0.9)],
            vec![],
            vec![det(50., 50., 60., 60., 0.9), det(200., 0., 210., 10., 0.9)],
            vec![],
            vec![],
            vec![],
            vec![],
        ];
        for frame in frames {
            tracker.update(&frame).unwrap();
            let tracked = tracker.tracked_ids.clone();
            let lost = tracker.lost_ids.clone();
            let removed = tracker.removed_ids.clone();
            for id in &tracked {
                assert!(!lost.contains(id) && !removed.contains(id));
            }
            for id in &lost {
                assert!(!removed.contains(id));
            }
            assert_eq!(
                tracked.len() + lost.len() + removed.len(),
                tracker.stats().total_tracks
            );
        }
    }

    #[test]
    fn test_greedy_only_tracker() {
        let mut tracker = ByteTracker::default().without_optimal_solver();
        tracker.update(&[det(0., 0., 10., 10., 0.9)]).unwrap();
        let out = tracker.update(&[det(1., 1., 11., 11., 0.9)]).unwrap();
        assert_eq!(ids(&out), vec![0]);
    }

    #[test]
    fn test_invalid_detection_is_rejected_without_side_effects() {
        let mut tracker = ByteTracker::default();
        let res = tracker.update(&[det(0., 0., f32::NAN, 10., 0.9)]);
        assert!(matches!(res, Err(TrackError::InvalidDetection(_))));
        assert_eq!(tracker.stats(), TrackerStats::default());
    }

    #[test]
    fn test_reset() {
        let mut tracker = ByteTracker::default();
        tracker.update(&[det(0., 0., 10., 10., 0.9)]).unwrap();
        tracker.update(&[]).unwrap();
        tracker.reset();
        assert_eq!(tracker.stats(), TrackerStats::default());

        let out = tracker.update(&[det(0., 0., 10., 10., 0.9)]).unwrap();
        assert_eq!(ids(&out), vec![0]);
        assert_eq!(out[0].get_start_frame_id(), 1);
    }
}
