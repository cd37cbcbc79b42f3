//! Binds tracker output back onto the shapes the detector produced.

use crate::{rect::Rect, tracker::TrackedObject};
use nalgebra::{distance, Point2};

/// A detected blob outline, as handed over by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub polygon: Vec<Point2<f32>>,
    pub rect: Rect<f32>,
    pub centroid: Point2<f32>,
    pub area: f32,
}

impl Shape {
    pub fn new(
        polygon: Vec<Point2<f32>>,
        rect: Rect<f32>,
        centroid: Point2<f32>,
        area: f32,
    ) -> Self {
        Self {
            polygon,
            rect,
            centroid,
            area,
        }
    }

    /// Builds a shape from a closed outline.
    ///
    /// Area and centroid come from the polygon moments; a zero-area outline
    /// falls back to the center of its bounding box.
    pub fn from_polygon(polygon: Vec<Point2<f32>>) -> Self {
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &polygon {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let rect = if polygon.is_empty() {
            Rect::new(0.0, 0.0, 0.0, 0.0)
        } else {
            Rect::from_xyxy(min_x, min_y, max_x, max_y)
        };

        let (mut m00, mut m10, mut m01) = (0.0f64, 0.0f64, 0.0f64);
        for (i, p) in polygon.iter().enumerate() {
            let q = &polygon[(i + 1) % polygon.len()];
            let (px, py, qx, qy) = (p.x as f64, p.y as f64, q.x as f64, q.y as f64);
            let cross = px * qy - qx * py;
            m00 += cross;
            m10 += (px + qx) * cross;
            m01 += (py + qy) * cross;
        }
        m00 /= 2.0;

        let centroid = if m00.abs() > f64::EPSILON {
            Point2::new((m10 / (6.0 * m00)) as f32, (m01 / (6.0 * m00)) as f32)
        } else {
            let (cx, cy) = rect.center();
            Point2::new(cx, cy)
        };

        Self::new(polygon, rect, centroid, m00.abs() as f32)
    }

    /// Placeholder outline: the four corners of `rect`.
    pub fn from_rect(rect: &Rect<f32>) -> Self {
        let [x1, y1, x2, y2] = rect.get_xyxy();
        let polygon = vec![
            Point2::new(x1, y1),
            Point2::new(x2, y1),
            Point2::new(x2, y2),
            Point2::new(x1, y2),
        ];
        let (cx, cy) = rect.center();
        Self::new(polygon, rect.clone(), Point2::new(cx, cy), rect.area().abs())
    }
}

/// One identified entity of the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedBlob {
    pub track_id: usize,
    pub rect: Rect<f32>,
    pub centroid: Point2<f32>,
    pub polygon: Vec<Point2<f32>>,
    pub area: f32,
    /// True when no detected shape was close enough and the geometry was
    /// made up from the track box.
    pub synthesized: bool,
}

fn round3(v: f32) -> f32 {
    (v * 1000.0).round() / 1000.0
}

impl TrackedBlob {
    pub(crate) fn bind(track_id: usize, shape: Shape, synthesized: bool) -> Self {
        Self {
            track_id,
            rect: shape.rect,
            centroid: shape.centroid,
            polygon: shape.polygon,
            area: shape.area,
            synthesized,
        }
    }

    /// Centroid scaled into 0..1 of the region, rounded to 3 decimals.
    pub fn normalized_center(&self, width: f32, height: f32) -> (f32, f32) {
        (
            round3(self.centroid.x / width),
            round3(self.centroid.y / height),
        )
    }

    /// `(x, y, w, h)` scaled into 0..1 of the region, rounded to 3 decimals.
    pub fn normalized_rect(&self, width: f32, height: f32) -> (f32, f32, f32, f32) {
        (
            round3(self.rect.x() / width),
            round3(self.rect.y() / height),
            round3(self.rect.width() / width),
            round3(self.rect.height() / height),
        )
    }
}

/// Produces one record per track, in track order.
///
/// Each track takes the nearest shape not yet taken if it lies strictly
/// within `radius`; otherwise a box-shaped placeholder is synthesized.
/// First come, first served: this is not a global assignment.
pub fn reconcile(
    tracks: &[TrackedObject],
    shapes: &[Shape],
    radius: f32,
) -> Vec<TrackedBlob> {
    let mut used = vec![false; shapes.len()];

    tracks
        .iter()
        .map(|track| {
            let center = track.center();
            let nearest = shapes
                .iter()
                .enumerate()
                .filter(|(i, _)| !used[*i])
                .map(|(i, shape)| (i, distance(&center, &shape.centroid)))
                .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
                    Some((_, bd)) if bd <= d => best,
                    _ => Some((i, d)),
                });

            match nearest {
                Some((i, d)) if d < radius => {
                    used[i] = true;
                    TrackedBlob::bind(track.track_id, shapes[i].clone(), false)
                }
                _ => TrackedBlob::bind(track.track_id, Shape::from_rect(&track.rect), true),
            }
        })
        .collect()
}
