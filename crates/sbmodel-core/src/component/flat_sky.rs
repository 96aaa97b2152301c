//! FlatSky: a constant background level `I(x,y) = I0` over the
//! whole image. No center, no orientation; additive like every other kind
//! so the `ModelBuilder`'s per-pixel sum needs no special case for it.

use super::FunctionComponent;
use crate::error::{ModelError, Result};

#[derive(Clone, Copy, Debug)]
pub struct FlatSky {
    i0: f64,
}

impl FunctionComponent for FlatSky {
    const NAME: &'static str = "FlatSky";
    const N_PARAMS: usize = 1;

    fn setup(params: &[f64], _zp: f64) -> Result<Self> {
        if params.len() != Self::N_PARAMS {
            return Err(ModelError::ParameterCountMismatch {
                expected: Self::N_PARAMS,
                got: params.len(),
            });
        }
        Ok(Self { i0: params[0] })
    }

    fn get_value(&self, _x: f64, _y: f64) -> f64 {
        self.i0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_constant_everywhere() {
        let sky = FlatSky::setup(&[5.0], 25.0).unwrap();
        assert_eq!(sky.get_value(1.0, 1.0), 5.0);
        assert_eq!(sky.get_value(500.0, -30.0), 5.0);
    }

    #[test]
    fn rejects_wrong_parameter_count() {
        assert!(FlatSky::setup(&[5.0, 1.0], 25.0).is_err());
    }
}
