//! Cost matrices and detection-to-track assignment.
//!
//! The optimal solver is a strategy behind [`AssignmentSolver`]; when it is
//! missing or fails, [`associate`] falls back to [`GreedySolver`] for that
//! call only.

use crate::{error::TrackError, lapjv::lapjv, rect::Rect};
use log::warn;
use nalgebra::DMatrix;
use std::fmt::Debug;

/// Added to the dummy cost so a pair at exactly `thresh` beats leaving both
/// sides unmatched.
const PAD_EPS: f64 = 1e-6;

/* -----------------------------------------------------------------------------
 * IoU / cost matrices
 * ----------------------------------------------------------------------------- */

/// Pairwise IoU, `a.len()` rows by `b.len()` columns.
pub fn iou_batch(a_rects: &[Rect<f32>], b_rects: &[Rect<f32>]) -> DMatrix<f32> {
    DMatrix::from_fn(a_rects.len(), b_rects.len(), |ai, bi| {
        a_rects[ai].calc_iou(&b_rects[bi])
    })
}

/// `1 - IoU` for every track/detection pair.
pub fn iou_distance(
    track_rects: &[Rect<f32>],
    det_rects: &[Rect<f32>],
) -> DMatrix<f32> {
    iou_batch(track_rects, det_rects).map(|iou| 1.0 - iou)
}

/* -----------------------------------------------------------------------------
 * Assignment
 * ----------------------------------------------------------------------------- */

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    /// (track index, detection index)
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl Assignment {
    /// Nothing matched: every track and every detection is left over.
    pub fn unmatched(num_tracks: usize, num_dets: usize) -> Self {
        Self {
            matches: Vec::new(),
            unmatched_tracks: (0..num_tracks).collect(),
            unmatched_detections: (0..num_dets).collect(),
        }
    }

    /// Matches come out sorted by track index whatever order the solver
    /// found them in.
    fn from_matches(
        mut matches: Vec<(usize, usize)>,
        num_tracks: usize,
        num_dets: usize,
    ) -> Self {
        matches.sort_unstable();
        let mut track_used = vec![false; num_tracks];
        let mut det_used = vec![false; num_dets];
        for &(t, d) in &matches {
            track_used[t] = true;
            det_used[d] = true;
        }
        Self {
            matches,
            unmatched_tracks: (0..num_tracks).filter(|&t| !track_used[t]).collect(),
            unmatched_detections: (0..num_dets).filter(|&d| !det_used[d]).collect(),
        }
    }
}

pub trait AssignmentSolver: Debug + Send {
    /// Matches rows (tracks) to columns (detections), keeping only pairs
    /// whose cost is `<= thresh`.
    fn solve(
        &self,
        cost: &DMatrix<f32>,
        thresh: f32,
    ) -> Result<Assignment, TrackError>;
}

/// Repeatedly commits the globally cheapest remaining pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl GreedySolver {
    pub fn assign(cost: &DMatrix<f32>, thresh: f32) -> Assignment {
        let (num_tracks, num_dets) = cost.shape();
        let mut track_used = vec![false; num_tracks];
        let mut det_used = vec![false; num_dets];
        let mut matches = Vec::new();

        while matches.len() < num_tracks.min(num_dets) {
            let mut best: Option<(usize, usize, f32)> = None;
            for t in (0..num_tracks).filter(|&t| !track_used[t]) {
                for d in (0..num_dets).filter(|&d| !det_used[d]) {
                    let c = cost[(t, d)];
                    if best.map_or(c.is_finite(), |(_, _, b)| c < b) {
                        best = Some((t, d, c));
                    }
                }
            }
            match best {
                Some((t, d, c)) if c <= thresh => {
                    track_used[t] = true;
                    det_used[d] = true;
                    matches.push((t, d));
                }
                _ => break,
            }
        }

        Assignment::from_matches(matches, num_tracks, num_dets)
    }
}

impl AssignmentSolver for GreedySolver {
    fn solve(
        &self,
        cost: &DMatrix<f32>,
        thresh: f32,
    ) -> Result<Assignment, TrackError> {
        Ok(Self::assign(cost, thresh))
    }
}

/// Minimum-cost matching via Jonker-Volgenant.
///
/// The matrix is extended to `(rows + cols)` square, padded with a little
/// more than `thresh / 2`, so leaving a track and a detection unmatched
/// always costs more than pairing them at or below the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct LapjvSolver;

impl AssignmentSolver for LapjvSolver {
    fn solve(
        &self,
        cost: &DMatrix<f32>,
        thresh: f32,
    ) -> Result<Assignment, TrackError> {
        let (n_rows, n_cols) = cost.shape();
        if n_rows == 0 || n_cols == 0 {
            return Ok(Assignment::unmatched(n_rows, n_cols));
        }
        if !thresh.is_finite() {
            return Err(TrackError::AssignmentError(format!(
                "cost limit must be finite, got {}",
                thresh
            )));
        }
        if let Some(bad) = cost.iter().find(|c| !c.is_finite()) {
            return Err(TrackError::AssignmentError(format!(
                "cost matrix contains {}",
                bad
            )));
        }

        let n = n_rows + n_cols;
        let pad = thresh as f64 / 2.0 + PAD_EPS;
        let mut extended = vec![vec![pad; n]; n];
        for row in extended.iter_mut().skip(n_rows) {
            for c in row.iter_mut().skip(n_cols) {
                *c = 0.0;
            }
        }
        for i in 0..n_rows {
            for j in 0..n_cols {
                extended[i][j] = cost[(i, j)] as f64;
            }
        }

        let mut x = vec![-1; n];
        let mut y = vec![-1; n];
        lapjv(&extended, &mut x, &mut y)?;

        let matches = x
            .iter()
            .take(n_rows)
            .enumerate()
            .filter_map(|(i, &j)| {
                let j = usize::try_from(j).ok()?;
                (j < n_cols && cost[(i, j)] <= thresh).then_some((i, j))
            })
            .collect();

        Ok(Assignment::from_matches(matches, n_rows, n_cols))
    }
}

/// Associates tracks with detections by IoU distance.
///
/// Empty inputs short-circuit to the trivial result without building a
/// cost matrix.
pub fn associate(
    solver: Option<&dyn AssignmentSolver>,
    track_rects: &[Rect<f32>],
    det_rects: &[Rect<f32>],
    thresh: f32,
) -> Assignment {
    if track_rects.is_empty() || det_rects.is_empty() {
        return Assignment::unmatched(track_rects.len(), det_rects.len());
    }

    let cost = iou_distance(track_rects, det_rects);
    match solver.map(|s| s.solve(&cost, thresh)) {
        Some(Ok(assignment)) => assignment,
        Some(Err(e)) => {
            warn!("optimal assignment failed: {}, using greedy fallback", e);
            GreedySolver::assign(&cost, thresh)
        }
        None => GreedySolver::assign(&cost, thresh),
    }
}
