//! Sérsic: `I(r) = I_e * exp(-b_n * ((r/r_e)^(1/n) - 1))`, with `b_n`
//! computed from the Sérsic index `n` via a closed-form approximation for
//! `n >= 0.36` and a low-order polynomial series below that.

use super::common::{elliptical_radius, Orientation};
use super::FunctionComponent;
use crate::error::{ModelError, Result};

/// Sérsic index threshold below which the Ciotti & Bertin closed-form
/// approximation for `b_n` loses accuracy and a polynomial series is used
/// instead (MacArthur, Courteau & Holtzman 2003).
const BN_SERIES_THRESHOLD_N: f64 = 0.36;

#[derive(Clone, Copy, Debug)]
pub struct Sersic {
    pub x0: f64,
    pub y0: f64,
    orientation: Orientation,
    q: f64,
    n: f64,
    i_e: f64,
    inv_r_e: f64,
    b_n: f64,
}

impl FunctionComponent for Sersic {
    const NAME: &'static str = "Sersic";
    const N_PARAMS: usize = 7;

    fn setup(params: &[f64], _zp: f64) -> Result<Self> {
        if params.len() != Self::N_PARAMS {
            return Err(ModelError::ParameterCountMismatch {
                expected: Self::N_PARAMS,
                got: params.len(),
            });
        }
        let [x0, y0, pa, ell, n, i_e, r_e] = [
            params[0], params[1], params[2], params[3], params[4], params[5], params[6],
        ];
        if !(n > 0.0) {
            return Err(ModelError::ParameterOutOfDomain {
                component: Self::NAME.into(),
                label: "N".into(),
                reason: "Sersic index must be positive".into(),
            });
        }
        if !(r_e > 0.0) {
            return Err(ModelError::ParameterOutOfDomain {
                component: Self::NAME.into(),
                label: "R_E".into(),
                reason: "effective radius must be positive".into(),
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
            n,
            i_e,
            inv_r_e: 1.0 / r_e,
            b_n: sersic_bn(n),
        })
    }

    fn get_value(&self, x: f64, y: f64) -> f64 {
        let (x_maj, y_min) = self.orientation.to_major_minor(x - self.x0, y - self.y0);
        let r = elliptical_radius(x_maj, y_min, self.q);
        let ratio = (r * self.inv_r_e).powf(1.0 / self.n);
        self.i_e * (-self.b_n * (ratio - 1.0)).exp()
    }

    fn is_steep_near_peak(&self) -> bool {
        true
    }

    fn activation_radius(&self) -> f64 {
        crate::consts::SUBPIXEL_ACTIVATION_RADIUS_SCALE_LENGTHS / self.inv_r_e
    }
}

/// The Sérsic coefficient `b_n` such that `r_e` encloses half the total
/// light. Ciotti & Bertin (1999) asymptotic expansion for `n >= 0.36`;
/// the MacArthur, Courteau & Holtzman (2003) polynomial fit below that,
/// where the asymptotic series diverges from the exact (incomplete-gamma)
/// solution.
fn sersic_bn(n: f64) -> f64 {
    if n >= BN_SERIES_THRESHOLD_N {
        2.0 * n - 1.0 / 3.0 + 4.0 / (405.0 * n) + 46.0 / (25515.0 * n * n)
            + 131.0 / (1_148_175.0 * n * n * n)
            - 2_194_697.0 / (30_690_717_750.0 * n * n * n * n)
    } else {
        0.01945 - 0.8902 * n + 10.95 * n * n - 19.67 * n.powi(3) + 13.43 * n.powi(4)
    }
}
