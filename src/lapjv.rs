use crate::error::TrackError;

/* -----------------------------------------------------------------------------
 * lapjv.rs - Jonker-Volgenant linear assignment on a dense square matrix
 * ----------------------------------------------------------------------------- */

const LARGE: f64 = 1_000_000.0;

/// Column reduction and reduction transfer. Returns the number of free rows.
fn column_reduction(
    cost: &[Vec<f64>],
    free_rows: &mut [usize],
    x: &mut [isize],
    y: &mut [isize],
    v: &mut [f64],
) -> usize {
    let n = cost.len();

    for i in 0..n {
        x[i] = -1;
        v[i] = LARGE;
        y[i] = 0;
    }
    for (i, row) in cost.iter().enumerate() {
        for (j, &c) in row.iter().enumerate() {
            if c < v[j] {
                v[j] = c;
                y[j] = i as isize;
            }
        }
    }

    let mut unique = vec![true; n];
    for j in (0..n).rev() {
        let i = y[j] as usize;
        if x[i] < 0 {
            x[i] = j as isize;
        } else {
            unique[i] = false;
            y[j] = -1;
        }
    }

    let mut n_free_rows = 0;
    for i in 0..n {
        if x[i] < 0 {
            free_rows[n_free_rows] = i;
            n_free_rows += 1;
        } else if unique[i] {
            let j = x[i] as usize;
            let mut min = LARGE;
            for j2 in 0..n {
                if j2 == j {
                    continue;
                }
                let c = cost[i][j2] - v[j2];
                if c < min {
                    min = c;
                }
            }
            v[j] -= min;
        }
    }
    n_free_rows
}

/// Augmenting row reduction. Returns the number of rows still free.
fn augmenting_row_reduction(
    cost: &[Vec<f64>],
    n_free_rows: usize,
    free_rows: &mut [usize],
    x: &mut [isize],
    y: &mut [isize],
    v: &mut [f64],
) -> usize {
    let n = cost.len();
    let mut current = 0;
    let mut new_free_rows = 0;
    let mut rr_cnt = 0;

    while current < n_free_rows {
        rr_cnt += 1;
        let free_i = free_rows[current];
        current += 1;

        let mut j1: isize = 0;
        let mut j2: isize = -1;
        let mut v1 = cost[free_i][0] - v[0];
        let mut v2 = LARGE;

        for j in 1..n {
            let c = cost[free_i][j] - v[j];
            if c < v2 {
                if c >= v1 {
                    v2 = c;
                    j2 = j as isize;
                } else {
                    v2 = v1;
                    v1 = c;
                    j2 = j1;
                    j1 = j as isize;
                }
            }
        }

        let mut i0 = y[j1 as usize];
        let v1_new = v[j1 as usize] - (v2 - v1);
        let v1_lowers = v1_new < v[j1 as usize];

        if rr_cnt < current * n {
            if v1_lowers {
                v[j1 as usize] = v1_new;
            } else if i0 >= 0 && j2 >= 0 {
                j1 = j2;
                i0 = y[j2 as usize];
            }

            if i0 >= 0 {
                if v1_lowers {
                    current -= 1;
                    free_rows[current] = i0 as usize;
                } else {
                    free_rows[new_free_rows] = i0 as usize;
                    new_free_rows += 1;
                }
            }
        } else if i0 >= 0 {
            free_rows[new_free_rows] = i0 as usize;
            new_free_rows += 1;
        }
        x[free_i] = j1;
        y[j1 as usize] = free_i as isize;
    }
    new_free_rows
}

/// Moves every column with the minimum `d` to the front of `cols[lo..]`.
fn find_dense(lo: usize, d: &[f64], cols: &mut [usize]) -> usize {
    let n = cols.len();
    let mut hi = lo + 1;
    let mut mind = d[cols[lo]];
    for k in hi..n {
        let j = cols[k];
        if d[j] <= mind {
            if d[j] < mind {
                hi = lo;
                mind = d[j];
            }
            cols[k] = cols[hi];
            cols[hi] = j;
            hi += 1;
        }
    }
    hi
}

/// Scans the columns in `cols[lo..hi]`. Returns a free column if the
/// shortest path reached one.
#[allow(clippy::too_many_arguments)]
fn scan_dense(
    cost: &[Vec<f64>],
    plo: &mut usize,
    phi: &mut usize,
    d: &mut [f64],
    cols: &mut [usize],
    pred: &mut [usize],
    y: &[isize],
    v: &[f64],
) -> Option<usize> {
    let n = cost.len();
    let mut lo = *plo;
    let mut hi = *phi;

    while lo != hi {
        let mut j = cols[lo];
        lo += 1;
        let i = y[j] as usize;
        let mind = d[j];
        let h = cost[i][j] - v[j] - mind;
        for k in hi..n {
            j = cols[k];
            let cred_ij = cost[i][j] - v[j] - h;
            if cred_ij < d[j] {
                d[j] = cred_ij;
                pred[j] = i;
                if cred_ij == mind {
                    if y[j] < 0 {
                        return Some(j);
                    }
                    cols[k] = cols[hi];
                    cols[hi] = j;
                    hi += 1;
                }
            }
        }
    }
    *plo = lo;
    *phi = hi;
    None
}

/// Dijkstra-style shortest augmenting path from `start_i`.
fn find_path_dense(
    cost: &[Vec<f64>],
    start_i: usize,
    y: &[isize],
    v: &mut [f64],
    pred: &mut [usize],
) -> usize {
    let n = cost.len();
    let mut lo = 0;
    let mut hi = 0;
    let mut final_j = None;
    let mut n_ready = 0;
    let mut cols: Vec<usize> = (0..n).collect();
    let mut d = vec![0.0; n];

    for i in 0..n {
        pred[i] = start_i;
        d[i] = cost[start_i][i] - v[i];
    }

    let final_j = loop {
        if lo == hi {
            n_ready = lo;
            hi = find_dense(lo, &d, &mut cols);
            for &j in &cols[lo..hi] {
                if y[j] < 0 {
                    final_j = Some(j);
                }
            }
        }
        if final_j.is_none() {
            final_j = scan_dense(
                cost, &mut lo, &mut hi, &mut d, &mut cols, pred, y, v,
            );
        }
        if let Some(j) = final_j {
            break j;
        }
    };

    let mind = d[cols[lo]];
    for &j in &cols[..n_ready] {
        v[j] += d[j] - mind;
    }
    final_j
}

/// Augments along shortest paths until every free row is assigned.
fn augment(
    cost: &[Vec<f64>],
    n_free_rows: usize,
    free_rows: &[usize],
    x: &mut [isize],
    y: &mut [isize],
    v: &mut [f64],
) -> Result<(), TrackError> {
    let n = cost.len();
    let mut pred = vec![0; n];

    for &free_row in &free_rows[..n_free_rows] {
        let mut j = find_path_dense(cost, free_row, y, v, &mut pred);
        let mut steps = 0;
        loop {
            let i = pred[j];
            y[j] = i as isize;
            let next = x[i];
            x[i] = j as isize;
            if i == free_row {
                break;
            }
            if next < 0 {
                return Err(TrackError::LapjvError(format!(
                    "row {} on augmenting path has no column",
                    i
                )));
            }
            j = next as usize;
            steps += 1;
            if steps > n {
                return Err(TrackError::LapjvError(format!(
                    "augmenting path from row {} did not terminate",
                    free_row
                )));
            }
        }
    }
    Ok(())
}

/// Solves the square assignment problem `cost` (n x n).
///
/// On success `x[row]` holds the assigned column and `y[col]` the assigned
/// row.
pub(crate) fn lapjv(
    cost: &[Vec<f64>],
    x: &mut [isize],
    y: &mut [isize],
) -> Result<(), TrackError> {
    let n = cost.len();
    if n == 0 {
        return Err(TrackError::LapjvError(
            "cost matrix must not be empty".to_string(),
        ));
    }
    if n != x.len() || n != y.len() {
        return Err(TrackError::LapjvError(format!(
            "cost.len() must equal x.len() and y.len(), but cost.len() = {}, x.len() = {}, y.len() = {}",
            n,
            x.len(),
            y.len()
        )));
    }
    if let Some(row) = cost.iter().position(|row| row.len() != n) {
        return Err(TrackError::LapjvError(format!(
            "row {} has {} columns, expected {}",
            row,
            cost[row].len(),
            n
        )));
    }
    if cost.iter().flatten().any(|c| !c.is_finite()) {
        return Err(TrackError::LapjvError(
            "cost matrix contains non-finite values".to_string(),
        ));
    }

    let mut free_rows = vec![0; n];
    let mut v = vec![0.0; n];
    let mut n_free = column_reduction(cost, &mut free_rows, x, y, &mut v);
    let mut round = 0;
    while n_free > 0 && round < 2 {
        n_free =
            augmenting_row_reduction(cost, n_free, &mut free_rows, x, y, &mut v);
        round += 1;
    }
    if n_free > 0 {
        augment(cost, n_free, &free_rows, x, y, &mut v)?;
    }
    Ok(())
}
