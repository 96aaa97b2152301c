//! `PSFKernel`: a 2D array of real weights, area-normalized to 1.

use ndarray::Array2;

use crate::consts::PSF_NORMALIZATION_TOLERANCE;
use crate::error::{ModelError, Result};

/// A point-spread-function kernel: real weights, area-normalized to 1,
/// dimensions `(rows, cols)` in `(pRows, pCols)` order to match
/// `ImageBuffer`'s own `(nrows, ncols)` convention.
#[derive(Clone, Debug)]
pub struct PsfKernel {
    weights: Array2<f64>,
}

impl PsfKernel {
    /// Validate and wrap a raw weight array as a `PsfKernel`.
    ///
    /// Rejects non-finite weights and weight sums further than
    /// [`PSF_NORMALIZATION_TOLERANCE`] from 1.0.
    pub fn from_array(weights: Array2<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(ModelError::BadPSF("empty kernel".into()));
        }
        if weights.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::BadPSF("non-finite weight".into()));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > PSF_NORMALIZATION_TOLERANCE {
            return Err(ModelError::BadPSF(format!(
                "kernel not area-normalized: sum = {sum}"
            )));
        }
        Ok(Self { weights })
    }

    pub fn rows(&self) -> usize {
        self.weights.nrows()
    }

    pub fn cols(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// `true` when both axes are odd, i.e. the kernel has a well-defined
    /// center pixel.
    pub fn is_centered(&self) -> bool {
        self.rows() % 2 == 1 && self.cols() % 2 == 1
    }
}

/// Synthesize a normalized, centered analytic Gaussian PSF of the given
/// odd size and sigma (pixels). Used by demos/tests and by the CLI's
/// `render` command when no PSF file is supplied. Produces a centered
/// kernel, not a wrap-shifted one — the `Convolver` does its own wrap
/// shifting at `Configure` time, see [`crate::convolve`].
pub fn gaussian_psf(size: usize, sigma: f64) -> PsfKernel {
    let size = if size % 2 == 0 { size + 1 } else { size };
    let center = (size / 2) as f64;
    let two_sigma2 = 2.0 * sigma * sigma;

    let mut weights = Array2::<f64>::zeros((size, size));
    let mut sum = 0.0;
    for row in 0..size {
        let y = row as f64 - center;
        for col in 0..size {
            let x = col as f64 - center;
            let val = (-(x * x + y * y) / two_sigma2).exp();
            weights[[row, col]] = val;
            sum += val;
        }
    }
    weights.mapv_inplace(|v| v / sum);

    PsfKernel::from_array(weights).expect("freshly normalized Gaussian PSF is always valid")
}
