//! Gaussian-1D: `I(r) = I0 * exp(-r^2/(2*sigma^2))`, `r = |x - x0|`.
//! Literally one-dimensional — the profile depends only on the horizontal
//! offset from the center, `y0` is carried only to give every kind the same
//! `(X0, Y0, ...)` config-block shape.

use super::FunctionComponent;
use crate::consts::EPSILON;
use crate::error::{ModelError, Result};

#[derive(Clone, Copy, Debug)]
pub struct Gaussian1D {
    pub x0: f64,
    pub y0: f64,
    i0: f64,
    sigma: f64,
    inv_two_sigma2: f64,
}

impl FunctionComponent for Gaussian1D {
    const NAME: &'static str = "Gaussian1D";
    const N_PARAMS: usize = 4;

    fn setup(params: &[f64], zp: f64) -> Result<Self> {
        if params.len() != Self::N_PARAMS {
            return Err(ModelError::ParameterCountMismatch {
                expected: Self::N_PARAMS,
                got: params.len(),
            });
        }
        let [x0, y0, mu, sigma] = [params[0], params[1], params[2], params[3]];
        if !(sigma > 0.0) {
            return Err(ModelError::ParameterOutOfDomain {
                component: Self::NAME.into(),
                label: "SIGMA".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(Self {
            x0,
            y0,
            i0: super::common::mag_to_intensity(zp, mu),
            sigma,
            inv_two_sigma2: 1.0 / (2.0 * sigma * sigma + EPSILON),
        })
    }

    fn get_value(&self, x: f64, _y: f64) -> f64 {
        let r = x - self.x0;
        self.i0 * (-r * r * self.inv_two_sigma2).exp()
    }

    fn is_steep_near_peak(&self) -> bool {
        true
    }

    fn activation_radius(&self) -> f64 {
        crate::consts::SUBPIXEL_ACTIVATION_RADIUS_SCALE_LENGTHS * self.sigma
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn peak_and_one_sigma_offset_match_mag_to_intensity() {
        // x0=16, mu=20.0, sigma=3.0, ZP=25.0.
        let g = Gaussian1D::setup(&[16.0, 16.0, 20.0, 3.0], 25.0).unwrap();
        assert_relative_eq!(g.get_value(16.0, 16.0), 100.0, epsilon = 1e-9);
        assert_relative_eq!(
            g.get_value(19.0, 16.0),
            100.0 * (-0.5f64).exp(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn y_coordinate_does_not_affect_value() {
        let g = Gaussian1D::setup(&[16.0, 16.0, 20.0, 3.0], 25.0).unwrap();
        assert_relative_eq!(
            g.get_value(18.0, 1.0),
            g.get_value(18.0, 500.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn rejects_non_positive_sigma() {
        assert!(Gaussian1D::setup(&[16.0, 16.0, 20.0, 0.0], 25.0).is_err());
        assert!(Gaussian1D::setup(&[16.0, 16.0, 20.0, -1.0], 25.0).is_err());
    }

    #[test]
    fn rejects_wrong_parameter_count() {
        assert!(Gaussian1D::setup(&[16.0, 16.0, 20.0], 25.0).is_err());
    }
}
