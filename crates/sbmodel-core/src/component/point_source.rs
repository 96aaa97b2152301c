//! PointSource: an unresolved source, `I(x,y) = I0` at the exact center
//! only. Has no spatial profile of its own — the `ModelBuilder` special-
//! cases its rasterization rather than evaluating it on the per-pixel
//! grid like every other kind.

use super::FunctionComponent;
use crate::error::{ModelError, Result};

#[derive(Clone, Copy, Debug)]
pub struct PointSource {
    pub x0: f64,
    pub y0: f64,
    pub total_flux: f64,
}

impl FunctionComponent for PointSource {
    const NAME: &'static str = "PointSource";
    const N_PARAMS: usize = 3;

    fn setup(params: &[f64], zp: f64) -> Result<Self> {
        if params.len() != Self::N_PARAMS {
            return Err(ModelError::ParameterCountMismatch {
                expected: Self::N_PARAMS,
                got: params.len(),
            });
        }
        let [x0, y0, mag] = [params[0], params[1], params[2]];
        Ok(Self {
            x0,
            y0,
            total_flux: super::common::mag_to_intensity(zp, mag),
        })
    }

    /// Never called on the regular per-pixel grid (see [`Self::is_point_like`]);
    /// returns zero so a stray call from generic code is harmless rather
    /// than silently depositing flux everywhere.
    fn get_value(&self, _x: f64, _y: f64) -> f64 {
        0.0
    }

    fn is_point_like(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn total_flux_follows_mag_to_intensity() {
        let p = PointSource::setup(&[10.0, 10.0, 20.0], 25.0).unwrap();
        assert_relative_eq!(p.total_flux, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn get_value_is_always_zero() {
        let p = PointSource::setup(&[10.0, 10.0, 20.0], 25.0).unwrap();
        assert_eq!(p.get_value(10.0, 10.0), 0.0);
        assert_eq!(p.get_value(0.0, 0.0), 0.0);
    }
}
