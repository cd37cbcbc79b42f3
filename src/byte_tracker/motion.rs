use nalgebra::SMatrix;

/* -----------------------------------------------------------------------------
 * Type aliases
 * ----------------------------------------------------------------------------- */
// 1x4: cx, cy, w, h
pub(crate) type Measurement = SMatrix<f32, 1, 4>;
// 1x8: cx, cy, w, h, vx, vy, vw, vh
pub(crate) type StateMean = SMatrix<f32, 1, 8>;
// 1x8, one variance per state dimension
pub(crate) type StateVar = SMatrix<f32, 1, 8>;

const NDIM: usize = 4;

/* -----------------------------------------------------------------------------
 * Constant velocity model
 * ----------------------------------------------------------------------------- */

/// One-frame constant velocity predictor.
///
/// The variance only grows; it is never corrected by a measurement and does
/// not take part in matching.
#[derive(Debug, Clone)]
pub(crate) struct ConstantVelocity {
    initial_variance: f32,
    variance_growth: f32,
}

impl Default for ConstantVelocity {
    fn default() -> Self {
        Self::new(1000.0, 1.1)
    }
}

impl ConstantVelocity {
    pub(crate) fn new(initial_variance: f32, variance_growth: f32) -> Self {
        Self {
            initial_variance,
            variance_growth,
        }
    }

    pub(crate) fn initiate(
        &self,
        mean: &mut StateMean,
        variance: &mut StateVar,
        measurement: &Measurement,
    ) {
        mean.fill(0.0);
        for i in 0..NDIM {
            mean[(0, i)] = measurement[(0, i)];
        }
        variance.fill(self.initial_variance);
    }

    pub(crate) fn predict(&self, mean: &mut StateMean, variance: &mut StateVar) {
        for i in 0..NDIM {
            mean[(0, i)] += mean[(0, i + NDIM)];
        }
        *variance *= self.variance_growth;
    }

    /// Overwrites position and size, velocity becomes `(new - old) / 1`.
    pub(crate) fn update(&self, mean: &mut StateMean, measurement: &Measurement) {
        for i in 0..NDIM {
            let velocity = measurement[(0, i)] - mean[(0, i)];
            mean[(0, i)] = measurement[(0, i)];
            mean[(0, i + NDIM)] = velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    #[test]
    fn test_initiate() {
        let model = ConstantVelocity::default();
        let mut mean = StateMean::repeat(7.0);
        let mut variance = StateVar::zeros();
        model.initiate(&mut mean, &mut variance, &Measurement::new(1.0, 2.0, 3.0, 4.0));

        assert_eq!(mean, StateMean::from_row_slice(&[1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0]));
        assert_eq!(variance, StateVar::repeat(1000.0));
    }

    #[test]
    fn test_predict_moves_by_velocity_and_inflates_variance() {
        let model = ConstantVelocity::default();
        let mut mean =
            StateMean::from_row_slice(&[10.0, 20.0, 5.0, 6.0, 1.0, -2.0, 0.5, 0.0]);
        let mut variance = StateVar::repeat(1000.0);

        model.predict(&mut mean, &mut variance);
        assert_eq!(
            mean,
            StateMean::from_row_slice(&[11.0, 18.0, 5.5, 6.0, 1.0, -2.0, 0.5, 0.0])
        );
        for &v in variance.iter() {
            assert_nearly_eq!(v, 1100.0, 1e-2);
        }

        model.predict(&mut mean, &mut variance);
        for &v in variance.iter() {
            assert_nearly_eq!(v, 1210.0, 1e-2);
        }
    }

    #[test]
    fn test_update_computes_velocity() {
        let model = ConstantVelocity::default();
        let mut mean =
            StateMean::from_row_slice(&[10.0, 20.0, 5.0, 6.0, 9.0, 9.0, 9.0, 9.0]);
        model.update(&mut mean, &Measurement::new(13.0, 19.0, 5.0, 8.0));
        assert_eq!(
            mean,
            StateMean::from_row_slice(&[13.0, 19.0, 5.0, 8.0, 3.0, -1.0, 0.0, 2.0])
        );
    }
}
