//! OversampledRegion: a separate synthesis pipeline for a rectangular
//! sub-region where the PSF is sharper than one pixel or a component has a
//! cusp.
//!
//! Procedure: synthesize the region at `s`x oversampling, convolve with a
//! dedicated oversampled PSF, downsample by `s*s` block-averaging, and
//! hand the caller a base-resolution patch to blit into the scratch image.
//! Per-pixel evaluation is a pure function of `(x, y)` given `Setup`, so
//! this module takes the per-pixel evaluator as a closure rather than
//! depending on [`crate::component`] or [`crate::model`] directly — the
//! same evaluation code the base grid uses.

use ndarray::Array2;

use crate::convolve::Convolver;
use crate::error::{ModelDiagnostics, ModelError, Result};
use crate::psf::PsfKernel;

/// Where an oversampled region sits in the base image, and at what factor.
#[derive(Clone, Debug)]
pub struct OversampledRegionSpec {
    /// 0-indexed base-resolution row/col of the region's top-left pixel.
    pub row_start: usize,
    pub col_start: usize,
    /// Base-resolution width/height of the region.
    pub width: usize,
    pub height: usize,
    /// Oversampling factor `s >= 2`.
    pub oversample: usize,
    pub psf: PsfKernel,
}

/// A configured oversampled region: validated geometry plus a dedicated
/// [`Convolver`] built once at `Configure` time (mirrors the main
/// `Convolver`'s "plan once, reuse" contract).
#[derive(Clone, Debug)]
pub struct OversampledRegion {
    row_start: usize,
    col_start: usize,
    width: usize,
    height: usize,
    oversample: usize,
    convolver: Convolver,
}

impl OversampledRegion {
    /// Validate `spec` against the base image geometry and build its
    /// dedicated convolver.
    pub fn new(spec: OversampledRegionSpec, image_rows: usize, image_cols: usize) -> Result<Self> {
        if spec.oversample < 2 {
            return Err(ModelError::BadGeometry {
                width: spec.width as i64,
                height: spec.height as i64,
            });
        }
        if spec.row_start + spec.height > image_rows || spec.col_start + spec.width > image_cols {
            return Err(ModelError::OversampleRegionOutOfBounds);
        }

        let hi_rows = spec.height * spec.oversample;
        let hi_cols = spec.width * spec.oversample;
        let convolver = Convolver::new(hi_rows, hi_cols, &spec.psf)?;

        Ok(Self {
            row_start: spec.row_start,
            col_start: spec.col_start,
            width: spec.width,
            height: spec.height,
            oversample: spec.oversample,
            convolver,
        })
    }

    pub fn row_start(&self) -> usize {
        self.row_start
    }
    pub fn col_start(&self) -> usize {
        self.col_start
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn oversample_factor(&self) -> usize {
        self.oversample
    }

    /// Run the full synthesize -> convolve -> downsample pipeline and
    /// return a base-resolution `(height, width)` patch plus diagnostics.
    pub fn render(
        &self,
        eval: impl Fn(f64, f64) -> (f64, bool) + Sync,
    ) -> Result<(Array2<f64>, ModelDiagnostics)> {
        let (hi_res, mut diagnostics) = self.synthesize(eval);
        let patch = self.convolve_and_downsample(&hi_res, &mut diagnostics)?;
        Ok((patch, diagnostics))
    }

    /// Evaluate every spatial component at oversampled sub-pixel sky
    /// coordinates, before convolution. Exposed separately from
    /// [`Self::render`] so the `ModelBuilder` can inject a `PointSource`'s
    /// flux as a delta before convolving.
    pub fn synthesize(&self, eval: impl Fn(f64, f64) -> (f64, bool) + Sync) -> (Array2<f64>, ModelDiagnostics) {
        let s = self.oversample;
        let hi_rows = self.height * s;
        let hi_cols = self.width * s;

        let mut hi_res = Array2::<f64>::zeros((hi_rows, hi_cols));
        let mut diagnostics = ModelDiagnostics::default();
        let s_f = s as f64;
        let (x_off, y_off) = self.anchor();

        for j in 0..hi_rows {
            for i in 0..hi_cols {
                let x = x_off + (i as f64 + 0.5) / s_f;
                let y = y_off + (j as f64 + 0.5) / s_f;
                let (value, converged) = eval(x, y);
                hi_res[[j, i]] = value;
                if !converged {
                    diagnostics.non_converged_pixels += 1;
                }
            }
        }
        (hi_res, diagnostics)
    }

    /// Convolve the oversampled buffer with this region's dedicated PSF
    /// and block-average it back to base resolution.
    pub fn convolve_and_downsample(
        &self,
        hi_res: &Array2<f64>,
        diagnostics: &mut ModelDiagnostics,
    ) -> Result<Array2<f64>> {
        let convolved = self.convolver.convolve(hi_res)?;
        if convolved.iter().any(|v| !v.is_finite()) {
            diagnostics.non_finite = true;
        }
        Ok(downsample_block_average(&convolved, self.oversample))
    }

    fn anchor(&self) -> (f64, f64) {
        // Anchor so the oversampled sub-grid spanning base pixel
        // `col_start` (0-indexed, 1-indexed sky center `col_start + 1`) is
        // itself centered on that same sky coordinate.
        (self.col_start as f64 + 0.5, self.row_start as f64 + 0.5)
    }

    /// `true` if the 0-indexed base pixel `(row, col)` falls inside this
    /// region (where a `PointSource` defers rasterization).
    pub fn contains_base_pixel(&self, row: usize, col: usize) -> bool {
        row >= self.row_start
            && row < self.row_start + self.height
            && col >= self.col_start
            && col < self.col_start + self.width
    }

    /// Nearest oversampled pixel index `(hi_row, hi_col)` (within this
    /// region's hi-res buffer) to true sky coordinate `(x, y)`.
    pub fn nearest_hi_res_pixel(&self, x: f64, y: f64) -> (usize, usize) {
        let s = self.oversample;
        let (x_off, y_off) = self.anchor();
        let s_f = s as f64;
        let hi_col = (((x - x_off) * s_f - 0.5).round() as isize)
            .clamp(0, (self.width * s) as isize - 1) as usize;
        let hi_row = (((y - y_off) * s_f - 0.5).round() as isize)
            .clamp(0, (self.height * s) as isize - 1) as usize;
        (hi_row, hi_col)
    }
}

/// Sum `s*s` blocks and divide by `s^2` (area average).
fn downsample_block_average(hi_res: &Array2<f64>, s: usize) -> Array2<f64> {
    let (hi_rows, hi_cols) = hi_res.dim();
    let rows = hi_rows / s;
    let cols = hi_cols / s;
    let norm = (s * s) as f64;

    Array2::from_shape_fn((rows, cols), |(row, col)| {
        let mut sum = 0.0;
        for dr in 0..s {
            for dc in 0..s {
                sum += hi_res[[row * s + dr, col * s + dc]];
            }
        }
        sum / norm
    })
}

/// Validate that no two oversampled regions overlap.
pub fn validate_non_overlapping(regions: &[OversampledRegionSpec]) -> Result<()> {
    for (idx, a) in regions.iter().enumerate() {
        for b in &regions[idx + 1..] {
            let row_overlap = a.row_start < b.row_start + b.height && b.row_start < a.row_start + a.height;
            let col_overlap = a.col_start < b.col_start + b.width && b.col_start < a.col_start + a.width;
            if row_overlap && col_overlap {
                return Err(ModelError::OverlappingOversampleRegions);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psf::gaussian_psf;

    fn flat_region(oversample: usize) -> OversampledRegionSpec {
        OversampledRegionSpec {
            row_start: 4,
            col_start: 4,
            width: 8,
            height: 8,
            oversample,
            psf: gaussian_psf(9, 1.0),
        }
    }

    #[test]
    fn idempotent_when_oversample_is_one_with_identity_psf() {
        // No oversampled PSF should reproduce the base region unchanged.
        // We approximate "no PSF" with a single-pixel identity kernel,
        // since the Convolver always requires one.
        use ndarray::array;
        let identity = PsfKernel::from_array(array![[1.0]]).unwrap();
        let spec = OversampledRegionSpec {
            row_start: 4,
            col_start: 4,
            width: 8,
            height: 8,
            oversample: 2,
            psf: identity,
        };
        // s must be >= 2 by contract; exercise s=2 with identity PSF and
        // check the patch matches direct evaluation at base resolution.
        let region = OversampledRegion::new(spec, 32, 32).unwrap();
        let (patch, diag) = region
            .render(|x, y| ((x + y), true))
            .unwrap();
        assert!(!diag.non_finite);
        assert_eq!(patch.dim(), (8, 8));
        // Block-average of a linear function over a 2x2 sub-grid equals
        // the value at the base pixel's own sky center, (col_start+1)*2.
        let expected = 2.0 * (4.0 + 1.0);
        assert!((patch[[0, 0]] - expected).abs() < 1e-6);
    }

    #[test]
    fn rejects_region_out_of_bounds() {
        let spec = flat_region(2);
        assert!(OversampledRegion::new(spec, 8, 8).is_err());
    }

    #[test]
    fn rejects_oversample_factor_below_two() {
        let spec = flat_region(1);
        assert!(OversampledRegion::new(spec, 32, 32).is_err());
    }

    #[test]
    fn detects_overlap() {
        let a = flat_region(2);
        let b = flat_region(2);
        assert!(validate_non_overlapping(&[a, b]).is_err());
    }

    #[test]
    fn non_overlapping_regions_pass() {
        let a = flat_region(2);
        let mut b = flat_region(2);
        b.row_start = 20;
        b.col_start = 20;
        assert!(validate_non_overlapping(&[a, b]).is_ok());
    }
}
