//! Exponential-2D: `I(r) = I0 * exp(-r/h)`, `r` the deprojected
//! elliptical radius in major/minor-axis coordinates.

use super::common::{elliptical_radius, Orientation};
use super::FunctionComponent;
use crate::error::{ModelError, Result};

#[derive(Clone, Copy, Debug)]
pub struct Exponential2D {
    pub x0: f64,
    pub y0: f64,
    orientation: Orientation,
    q: f64,
    i0: f64,
    inv_h: f64,
}

impl FunctionComponent for Exponential2D {
    const NAME: &'static str = "Exponential2D";
    const N_PARAMS: usize = 6;

    fn setup(params: &[f64], _zp: f64) -> Result<Self> {
        if params.len() != Self::N_PARAMS {
            return Err(ModelError::ParameterCountMismatch {
                expected: Self::N_PARAMS,
                got: params.len(),
            });
        }
        let [x0, y0, pa, ell, i0, h] = [
            params[0], params[1], params[2], params[3], params[4], params[5],
        ];
        if !(h > 0.0) {
            return Err(ModelError::ParameterOutOfDomain {
                component: Self::NAME.into(),
                label: "H".into(),
                reason: "scale length must be positive".into(),
            });
        }
        if !(0.0..1.0).contains(&ell) {
            return Err(ModelError::ParameterOutOfDomain {
                component: Self::NAME.into(),
                label: "ELL".into(),
                reason: "ellipticity must be in [0, 1)".into(),
            });
        }
        Ok(Self {
            x0,
            y0,
            orientation: Orientation::from_degrees(pa),
            q: 1.0 - ell,
            i0,
            inv_h: 1.0 / h,
        })
    }

    fn get_value(&self, x: f64, y: f64) -> f64 {
        let (x_maj, y_min) = self.orientation.to_major_minor(x - self.x0, y - self.y0);
        let r = elliptical_radius(x_maj, y_min, self.q);
        self.i0 * (-r * self.inv_h).exp()
    }

    fn is_steep_near_peak(&self) -> bool {
        true
    }

    fn activation_radius(&self) -> f64 {
        crate::consts::SUBPIXEL_ACTIVATION_RADIUS_SCALE_LENGTHS / self.inv_h
    }
}
