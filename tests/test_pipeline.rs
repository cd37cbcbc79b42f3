use blobtrack_rs::{
    BlobPipeline, ByteTracker, Detection, MultiObjectTracker, PipelineConfig, Shape, TrackError,
    TrackedObject, TrackerKind, TrackerStats,
};
use nalgebra::Point2;
use nearly_eq::assert_nearly_eq;

/// ByteTracker that refuses every frame listed in `fail_on`.
#[derive(Debug)]
struct FlakyTracker {
    inner: ByteTracker,
    calls: usize,
    fail_on: Vec<usize>,
}

impl MultiObjectTracker for FlakyTracker {
    fn update(&mut self, detections: &[Detection]) -> Result<Vec<TrackedObject>, TrackError> {
        self.calls += 1;
        if self.fail_on.contains(&self.calls) {
            return Err(TrackError::ByteTrackerError(format!(
                "frame {} refused",
                self.calls
            )));
        }
        MultiObjectTracker::update(&mut self.inner, detections)
    }

    fn reset(&mut self) {
        self.calls = 0;
        self.inner.reset();
    }

    fn stats(&self) -> TrackerStats {
        self.inner.stats()
    }
}

/// Diamond outline centered on `(cx, cy)`.
fn diamond(cx: f32, cy: f32, r: f32) -> Shape {
    Shape::from_polygon(vec![
        Point2::new(cx, cy - r),
        Point2::new(cx + r, cy),
        Point2::new(cx, cy + r),
        Point2::new(cx - r, cy),
    ])
}

#[test]
fn test_blobs_follow_detected_outlines() {
    let mut pipeline = BlobPipeline::new(&PipelineConfig::default()).unwrap();

    for n in 0..10 {
        let shift = n as f32 * 4.0;
        let shapes = vec![diamond(100.0 + shift, 100.0, 30.0), diamond(400.0, 300.0 - shift, 20.0)];
        let result = pipeline.process(&shapes);

        assert_eq!(result.source, TrackerKind::ByteTrack);
        assert_eq!(result.blobs.len(), 2);
        for (blob, shape) in result.blobs.iter().zip(&shapes) {
            assert!(!blob.synthesized);
            assert_eq!(blob.polygon, shape.polygon);
            assert_nearly_eq!(blob.area, shape.area, 1e-3);
        }
        assert_eq!(result.blobs[0].track_id, 0);
        assert_eq!(result.blobs[1].track_id, 1);
    }

    let stats = pipeline.stats();
    assert_eq!(stats.frame_id, 10);
    assert_eq!(stats.total_tracks, 2);
}

#[test]
fn test_fallback_only_covers_failing_frames() {
    let flaky = FlakyTracker {
        inner: ByteTracker::default(),
        calls: 0,
        fail_on: vec![3],
    };
    let mut pipeline = BlobPipeline::new(&PipelineConfig::default())
        .unwrap()
        .with_tracker(Box::new(flaky));
    let shapes = vec![diamond(50.0, 50.0, 15.0)];

    let sources = (0..5)
        .map(|_| pipeline.process(&shapes).source)
        .collect::<Vec<_>>();
    assert_eq!(
        sources,
        vec![
            TrackerKind::ByteTrack,
            TrackerKind::ByteTrack,
            TrackerKind::Centroid,
            TrackerKind::ByteTrack,
            TrackerKind::ByteTrack,
        ]
    );
    assert_eq!(pipeline.fallback_frames(), 1);

    // The primary skipped one frame and kept its track.
    let result = pipeline.process(&shapes);
    assert_eq!(result.blobs.len(), 1);
    assert_eq!(result.blobs[0].track_id, 0);
}

#[test]
fn test_reset_starts_a_new_stream() {
    let mut pipeline = BlobPipeline::new(&PipelineConfig::default()).unwrap();
    let shapes = vec![diamond(50.0, 50.0, 15.0)];
    pipeline.process(&shapes);
    pipeline.process(&[diamond(300.0, 300.0, 15.0)]);
    assert_eq!(pipeline.stats().total_tracks, 2);

    pipeline.reset();
    assert_eq!(pipeline.stats(), TrackerStats::default());
    let result = pipeline.process(&shapes);
    assert_eq!(result.blobs[0].track_id, 0);
}

#[test]
fn test_config_from_json() {
    let config: PipelineConfig = serde_json::from_str(
        r#"{
            "use_bytetrack": false,
            "centroid": { "max_distance": 25.0, "max_age": 1 },
            "association_radius": 30.0
        }"#,
    )
    .unwrap();
    let mut pipeline = BlobPipeline::new(&config).unwrap();

    let first = pipeline.process(&[diamond(100.0, 100.0, 10.0)]);
    assert_eq!(first.source, TrackerKind::Centroid);
    assert_eq!(first.blobs[0].track_id, 0);

    // 30 px away is beyond max_distance, so a new id is issued.
    let second = pipeline.process(&[diamond(130.0, 100.0, 10.0)]);
    assert_eq!(second.blobs[0].track_id, 1);
}
