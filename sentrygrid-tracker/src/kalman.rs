//! Constant-velocity Kalman filter over a bounding box's `(cx, cy, aspect,
//! h, vx, vy, va, vh)` state, structured the way `tracking`'s 2D/3D motion
//! and observation models are: a `*Model::calc_for_dt` constructor builds a
//! fixed-dt instance implementing `adskalman`'s transition/observation
//! traits, which carry their own `predict`/`update`.

use nalgebra::allocator::Allocator;
use nalgebra::core::dimension::{DimMin, U4, U8};
use nalgebra::{DefaultAllocator, OMatrix, OVector, RealField};

use adskalman::{ObservationModel, TransitionModelLinearNoControl};

/// `[cx, cy, aspect, h, vx, vy, va, vh]`
pub type State<R> = OVector<R, U8>;
/// `[cx, cy, aspect, h]`
pub type Observation<R> = OVector<R, U4>;

#[derive(Debug)]
pub struct BBoxMotionModelBuilder<R: RealField> {
    motion_noise_scale: R,
}

impl<R: RealField> BBoxMotionModelBuilder<R> {
    pub fn new(motion_noise_scale: R) -> Self {
        Self { motion_noise_scale }
    }

    pub fn calc_for_dt(&self, dt: R) -> BBoxMotionModel<R> {
        let zero: R = nalgebra::convert(0.0);

        let mut transition_model = OMatrix::<R, U8, U8>::identity();
        for i in 0..4 {
            transition_model[(i, i + 4)] = dt.clone();
        }
        let transition_model_transpose = transition_model.transpose();

        let two: R = nalgebra::convert(2.0);
        let three: R = nalgebra::convert(3.0);
        let t33 = (dt.clone() * dt.clone() * dt.clone()) / three;
        let t22 = (dt.clone() * dt.clone()) / two;

        let mut transition_noise_covariance = OMatrix::<R, U8, U8>::from_element(zero.clone());
        for i in 0..4 {
            transition_noise_covariance[(i, i)] = t33.clone();
            transition_noise_covariance[(i, i + 4)] = t22.clone();
            transition_noise_covariance[(i + 4, i)] = t22.clone();
            transition_noise_covariance[(i + 4, i + 4)] = dt.clone();
        }
        transition_noise_covariance *= self.motion_noise_scale.clone();

        BBoxMotionModel {
            transition_model,
            transition_model_transpose,
            transition_noise_covariance,
        }
    }
}

#[derive(Debug)]
pub struct BBoxMotionModel<R: RealField> {
    transition_model: OMatrix<R, U8, U8>,
    transition_model_transpose: OMatrix<R, U8, U8>,
    transition_noise_covariance: OMatrix<R, U8, U8>,
}

impl<R: RealField> TransitionModelLinearNoControl<R, U8> for BBoxMotionModel<R> {
    fn F(&self) -> &OMatrix<R, U8, U8> {
        &self.transition_model
    }
    fn FT(&self) -> &OMatrix<R, U8, U8> {
        &self.transition_model_transpose
    }
    fn Q(&self) -> &OMatrix<R, U8, U8> {
        &self.transition_noise_covariance
    }
}

/// Observes the first four state components directly; velocities are
/// latent.
#[derive(Debug)]
pub struct BBoxObservationModel<R: RealField> {
    observation_matrix: OMatrix<R, U4, U8>,
    observation_matrix_transpose: OMatrix<R, U8, U4>,
    observation_noise_covariance: OMatrix<R, U4, U4>,
}

impl<R: RealField> BBoxObservationModel<R> {
    pub fn new(observation_noise_covariance: OMatrix<R, U4, U4>) -> Self {
        let mut observation_matrix = OMatrix::<R, U4, U8>::from_element(nalgebra::convert(0.0));
        for i in 0..4 {
            observation_matrix[(i, i)] = nalgebra::convert(1.0);
        }
        let observation_matrix_transpose = observation_matrix.transpose();
        Self {
            observation_matrix,
            observation_matrix_transpose,
            observation_noise_covariance,
        }
    }
}

impl<R: RealField> ObservationModel<R, U8, U4> for BBoxObservationModel<R>
where
    DefaultAllocator: Allocator<R, U8, U8>,
    DefaultAllocator: Allocator<R, U8>,
    DefaultAllocator: Allocator<R, U4, U8>,
    DefaultAllocator: Allocator<R, U8, U4>,
    DefaultAllocator: Allocator<R, U4, U4>,
    DefaultAllocator: Allocator<R, U4>,
    DefaultAllocator: Allocator<(usize, usize), U4>,
    U4: DimMin<U4, Output = U4>,
{
    fn H(&self) -> &OMatrix<R, U4, U8> {
        &self.observation_matrix
    }
    fn HT(&self) -> &OMatrix<R, U8, U4> {
        &self.observation_matrix_transpose
    }
    fn R(&self) -> &OMatrix<R, U4, U4> {
        &self.observation_noise_covariance
    }
    fn predict_observation(&self, state: &OVector<R, U8>) -> OVector<R, U4> {
        &self.observation_matrix * state
    }
}

pub fn identity_observation_noise(sigma: f64) -> OMatrix<f64, U4, U4> {
    OMatrix::<f64, U4, U4>::identity() * (sigma * sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adskalman::StateAndCovariance;
    use approx::assert_relative_eq;

    #[test]
    fn two_half_steps_match_one_full_step() {
        let builder = BBoxMotionModelBuilder::new(1.0_f64);
        let state0 = State::from_row_slice(&[10.0, 20.0, 0.5, 40.0, 1.0, 0.5, 0.0, 0.2]);
        let covar0 = OMatrix::<f64, U8, U8>::identity() * 5.0;
        let est0 = StateAndCovariance::new(state0, covar0);

        let half = builder.calc_for_dt(0.5);
        let one = half.predict(&est0);
        let two = half.predict(&one);

        let full = builder.calc_for_dt(1.0);
        let direct = full.predict(&est0);

        assert_relative_eq!(two.state(), direct.state(), epsilon = 1e-9);
    }
}
