//! Nearest-centroid tracker used when ByteTrack is disabled or fails.
//!
//! Matching is greedy in detection order, so it is not globally optimal.

use crate::{
    config::CentroidConfig,
    detection::Detection,
    error::TrackError,
    rect::Rect,
    tracker::{MultiObjectTracker, TrackedObject, TrackerStats},
};
use nalgebra::{distance, Point2};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone)]
struct CentroidEntry {
    center: Point2<f32>,
    area: f32,
    age: usize,
}

#[derive(Debug, Clone)]
pub struct CentroidTracker {
    max_distance: f32,
    max_age: usize,

    frame_id: usize,
    next_id: usize,

    entries: BTreeMap<usize, CentroidEntry>,
}

impl Default for CentroidTracker {
    fn default() -> Self {
        let config = CentroidConfig::default();
        Self::new(config.max_distance, config.max_age)
    }
}

impl CentroidTracker {
    pub fn new(max_distance: f32, max_age: usize) -> Self {
        Self {
            max_distance,
            max_age,
            frame_id: 0,
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &CentroidConfig) -> Result<Self, TrackError> {
        config.validate()?;
        Ok(Self::new(config.max_distance, config.max_age))
    }

    /// Last known area of an entry, matched or not.
    pub fn area_of(&self, id: usize) -> Option<f32> {
        self.entries.get(&id).map(|e| e.area)
    }

    /// Ages and evicts entries, then returns one id per centroid, in input
    /// order.
    fn assign(&mut self, centroids: &[(f32, f32, f32)]) -> Vec<usize> {
        self.frame_id += 1;

        let max_age = self.max_age;
        self.entries.retain(|_, entry| {
            entry.age += 1;
            entry.age <= max_age
        });

        let candidates: Vec<(usize, Point2<f32>)> = self
            .entries
            .iter()
            .map(|(&id, entry)| (id, entry.center))
            .collect();
        let mut used: HashSet<usize> = HashSet::new();
        let mut ids = Vec::with_capacity(centroids.len());

        for &(cx, cy, area) in centroids {
            let center = Point2::new(cx, cy);
            let mut best: Option<(usize, f32)> = None;
            if used.len() < candidates.len() {
                for &(id, known) in &candidates {
                    if used.contains(&id) {
                        continue;
                    }
                    let dist = distance(&center, &known);
                    if dist <= self.max_distance
                        && best.map_or(true, |(_, d)| dist < d)
                    {
                        best = Some((id, dist));
                    }
                }
            }

            let id = match best {
                Some((id, _)) => {
                    used.insert(id);
                    id
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    id
                }
            };
            self.entries.insert(id, CentroidEntry { center, area, age: 0 });
            ids.push(id);
        }

        ids
    }

    /// Takes `(cx, cy, area)` triples and returns `id -> (cx, cy)` for every
    /// entry matched or created this frame.
    pub fn update_centroids(
        &mut self,
        centroids: &[(f32, f32, f32)],
    ) -> BTreeMap<usize, (f32, f32)> {
        let ids = self.assign(centroids);
        ids.into_iter()
            .zip(centroids)
            .map(|(id, &(cx, cy, _))| (id, (cx, cy)))
            .collect()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.next_id = 0;
        self.frame_id = 0;
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            active_tracks: self.entries.values().filter(|e| e.age == 0).count(),
            lost_tracks: self.entries.values().filter(|e| e.age > 0).count(),
            total_tracks: self.next_id,
            frame_id: self.frame_id,
        }
    }
}

impl MultiObjectTracker for CentroidTracker {
    fn update(
        &mut self,
        detections: &[Detection],
    ) -> Result<Vec<TrackedObject>, TrackError> {
        for det in detections {
            det.validate()?;
        }
        let centroids = detections
            .iter()
            .map(|det| {
                let (cx, cy) = det.get_rect().center();
                (cx, cy, det.area())
            })
            .collect::<Vec<_>>();

        let ids = self.assign(&centroids);
        Ok(ids
            .into_iter()
            .zip(detections)
            .map(|(id, det)| {
                let rect: Rect<f32> = det.get_rect().clone();
                TrackedObject::new(id, rect, det.get_score())
            })
            .collect())
    }

    fn reset(&mut self) {
        CentroidTracker::reset(self);
    }

    fn stats(&self) -> TrackerStats {
        CentroidTracker::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_ids_for_slow_motion() {
        let mut tracker = CentroidTracker::default();
        let first = tracker.update_centroids(&[(10.0, 10.0, 100.0), (200.0, 200.0, 50.0)]);
        assert_eq!(first.keys().copied().collect::<Vec<_>>(), vec![0, 1]);

        let second = tracker.update_centroids(&[(205.0, 198.0, 52.0), (12.0, 11.0, 101.0)]);
        assert_eq!(second[&0], (12.0, 11.0));
        assert_eq!(second[&1], (205.0, 198.0));
        assert_eq!(tracker.area_of(1), Some(52.0));
    }

    #[test]
    fn test_far_detection_gets_new_id() {
        let mut tracker = CentroidTracker::new(50.0, 5);
        tracker.update_centroids(&[(0.0, 0.0, 10.0)]);
        let out = tracker.update_centroids(&[(100.0, 0.0, 10.0)]);
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![1]);
        // The old entry is kept but not reported.
        assert_eq!(tracker.stats().lost_tracks, 1);
    }

    #[test]
    fn test_greedy_in_detection_order() {
        let mut tracker = CentroidTracker::new(50.0, 5);
        tracker.update_centroids(&[(0.0, 0.0, 10.0)]);
        // Both are in range; the first detection claims the only entry even
        // though the second one is closer.
        let out = tracker.update_centroids(&[(30.0, 0.0, 10.0), (1.0, 0.0, 10.0)]);
        assert_eq!(out[&0], (30.0, 0.0));
        assert_eq!(out[&1], (1.0, 0.0));
    }

    #[test]
    fn test_eviction_after_max_age() {
        let mut tracker = CentroidTracker::new(50.0, 2);
        tracker.update_centroids(&[(0.0, 0.0, 10.0)]);
        tracker.update_centroids(&[]);
        // aged to 2 <= max_age before matching, still claimable
        let out = tracker.update_centroids(&[(1.0, 1.0, 10.0)]);
        assert!(out.contains_key(&0));

        tracker.update_centroids(&[]);
        tracker.update_centroids(&[]);
        // aged to 3 > max_age, evicted before matching
        let out = tracker.update_centroids(&[(1.0, 1.0, 10.0)]);
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(tracker.stats().total_tracks, 2);
    }

    #[test]
    fn test_multi_object_tracker_contract() {
        let mut tracker = CentroidTracker::default();
        let dets = [Detection::from_xyxy(0.0, 0.0, 10.0, 10.0, 0.9)];
        let out = MultiObjectTracker::update(&mut tracker, &dets).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_id, 0);
        assert_eq!(out[0].rect, dets[0].rect);

        MultiObjectTracker::reset(&mut tracker);
        assert_eq!(tracker.stats(), TrackerStats::default());
    }
}
