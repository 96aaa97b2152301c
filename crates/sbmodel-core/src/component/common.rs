//! Helpers shared by every `FunctionComponent` kind: the universal
//! pixel-to-sky coordinate transform, and the magnitude-to-linear-intensity
//! conversion that uses the process-wide photometric zero-point. Factored
//! out here instead of duplicated per component or hung off a shared base
//! class.

/// Cached trigonometry for a position angle, measured counter-clockwise
/// from the +x axis and stored in radians.
#[derive(Clone, Copy, Debug, Default)]
pub struct Orientation {
    cos_pa: f64,
    sin_pa: f64,
}

impl Orientation {
    /// `pa_deg` is the position angle in degrees, the convention used in
    /// configuration files.
    pub fn from_degrees(pa_deg: f64) -> Self {
        let pa_rad = pa_deg.to_radians();
        Self {
            cos_pa: pa_rad.cos(),
            sin_pa: pa_rad.sin(),
        }
    }

    /// Rotate a sky offset `(dx, dy)` from `(x0, y0)` by `-PA` into
    /// major/minor-axis coordinates `(x_maj, y_min)`, the coordinate
    /// transform universal to every 2D component.
    pub fn to_major_minor(&self, dx: f64, dy: f64) -> (f64, f64) {
        let x_maj = dx * self.cos_pa + dy * self.sin_pa;
        let y_min = -dx * self.sin_pa + dy * self.cos_pa;
        (x_maj, y_min)
    }
}

/// Cached trigonometry for an inclination angle (0 = face-on, 90 = edge-on).
#[derive(Clone, Copy, Debug, Default)]
pub struct Inclination {
    pub cos_i: f64,
    pub sin_i: f64,
}

impl Inclination {
    pub fn from_degrees(i_deg: f64) -> Self {
        let i_rad = i_deg.to_radians();
        Self {
            cos_i: i_rad.cos(),
            sin_i: i_rad.sin(),
        }
    }
}

/// Convert a surface-brightness parameter in magnitudes/arcsec^2 (or any
/// consistent magnitude unit) to linear intensity using the process-wide
/// photometric zero-point `ZP`: `I0 = 10^(0.4*(ZP - mu))`.
pub fn mag_to_intensity(zp: f64, mu: f64) -> f64 {
    10f64.powf(0.4 * (zp - mu))
}

/// Deprojected elliptical radius in major/minor-axis coordinates, given
/// the minor-to-major axis ratio `q = 1 - ellipticity`.
pub fn elliptical_radius(x_maj: f64, y_min: f64, q: f64) -> f64 {
    (x_maj * x_maj + (y_min / q) * (y_min / q)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mag_to_intensity_known_value() {
        // ZP = 25.0, mu = 20.0 -> I0 = 100.0
        assert_relative_eq!(mag_to_intensity(25.0, 20.0), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_pa_is_identity() {
        let o = Orientation::from_degrees(0.0);
        let (xm, ym) = o.to_major_minor(3.0, -4.0);
        assert_relative_eq!(xm, 3.0, epsilon = 1e-12);
        assert_relative_eq!(ym, -4.0, epsilon = 1e-12);
    }

    #[test]
    fn ninety_degree_pa_swaps_axes() {
        let o = Orientation::from_degrees(90.0);
        let (xm, ym) = o.to_major_minor(1.0, 0.0);
        assert_relative_eq!(xm, 0.0, epsilon = 1e-9);
        assert_relative_eq!(ym, -1.0, epsilon = 1e-9);
    }
}
