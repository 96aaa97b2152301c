//! Convolver: zero-padded FFT convolution of a real image with a real,
//! area-normalized PSF kernel.
//!
//! FFT planning happens once, at construction (`ModelBuilder::Configure`
//! time), not per `Convolve` call: the padded geometry and the PSF's
//! transform are cached and reused for every subsequent call. The
//! Convolver exclusively owns its FFT plans and scratch; invalidation on
//! geometry change is simply rebuilding a `Convolver` via [`Convolver::new`].

mod padding;

use ndarray::Array2;
use num_complex::Complex;

use crate::compute::cpu::{fft2d_forward, ifft2d_inverse};
use crate::error::{ModelError, Result};
use crate::psf::PsfKernel;

pub use padding::next_smooth_size;

/// Caches a PSF's Fourier transform against a padded FFT-friendly
/// geometry, for reuse across many `Convolve` calls on images of a fixed
/// size.
#[derive(Clone, Debug)]
pub struct Convolver {
    image_rows: usize,
    image_cols: usize,
    padded_rows: usize,
    padded_cols: usize,
    psf_transform: Array2<Complex<f64>>,
}

impl Convolver {
    /// Build a convolver for images of `(image_rows, image_cols)` and the
    /// given PSF. Rejects a PSF whose any axis exceeds the image's
    /// corresponding axis.
    pub fn new(image_rows: usize, image_cols: usize, psf: &PsfKernel) -> Result<Self> {
        if psf.rows() > image_rows || psf.cols() > image_cols {
            return Err(ModelError::BadPSF(format!(
                "PSF {}x{} exceeds image {}x{}",
                psf.rows(),
                psf.cols(),
                image_rows,
                image_cols
            )));
        }

        let padded_rows = next_smooth_size(image_rows + psf.rows() - 1);
        let padded_cols = next_smooth_size(image_cols + psf.cols() - 1);

        let wrapped = wrap_shift_centered_kernel(psf.weights(), padded_rows, padded_cols);
        let psf_transform = fft2d_forward(&wrapped);

        Ok(Self {
            image_rows,
            image_cols,
            padded_rows,
            padded_cols,
            psf_transform,
        })
    }

    /// Convolve `input` (must be `(image_rows, image_cols)`) with the
    /// cached PSF, returning a same-sized output buffer.
    pub fn convolve(&self, input: &Array2<f64>) -> Result<Array2<f64>> {
        let (rows, cols) = input.dim();
        if rows != self.image_rows || cols != self.image_cols {
            return Err(ModelError::ConvolutionFailed(format!(
                "input {}x{} does not match configured {}x{}",
                rows, cols, self.image_rows, self.image_cols
            )));
        }

        let mut padded = Array2::<f64>::zeros((self.padded_rows, self.padded_cols));
        padded.slice_mut(ndarray::s![0..rows, 0..cols]).assign(input);

        let spectrum = fft2d_forward(&padded);
        if spectrum.dim() != self.psf_transform.dim() {
            return Err(ModelError::ConvolutionFailed(
                "PSF transform geometry mismatch".into(),
            ));
        }
        let mut product = spectrum;
        for (p, k) in product.iter_mut().zip(self.psf_transform.iter()) {
            *p *= k;
        }

        let full = ifft2d_inverse(&product);
        if full.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::ConvolutionFailed(
                "inverse transform produced non-finite values".into(),
            ));
        }

        // The PSF was wrap-shifted so its center sits at index (0, 0); the
        // aligned, cropped result (preserving pixel (0,0) of the model)
        // is therefore the padded buffer's top-left block.
        Ok(full.slice(ndarray::s![0..rows, 0..cols]).to_owned())
    }

    pub fn image_dims(&self) -> (usize, usize) {
        (self.image_rows, self.image_cols)
    }
}

/// Place the PSF so its center pixel lands at `(0, 0)` of a
/// `(padded_rows, padded_cols)` zero buffer, wrapping each axis — the
/// standard "kernel centering" trick that makes a zero-padded FFT
/// convolution align with the input rather than shifting it by the
/// kernel's half-width.
fn wrap_shift_centered_kernel(
    kernel: &Array2<f64>,
    padded_rows: usize,
    padded_cols: usize,
) -> Array2<f64> {
    let (krows, kcols) = kernel.dim();
    let center_row = krows / 2;
    let center_col = kcols / 2;

    let mut out = Array2::<f64>::zeros((padded_rows, padded_cols));
    for kr in 0..krows {
        let dest_row = (kr + padded_rows - center_row) % padded_rows;
        for kc in 0..kcols {
            let dest_col = (kc + padded_cols - center_col) % padded_cols;
            out[[dest_row, dest_col]] = kernel[[kr, kc]];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psf::gaussian_psf;
    use approx::assert_relative_eq;

    #[test]
    fn delta_spike_recovers_psf() {
        // A delta spike at the center of a 64x64 zero image, convolved
        // with a 9x9 Gaussian PSF, recovers the PSF centered at the spike.
        let psf = gaussian_psf(9, 2.0);
        let conv = Convolver::new(64, 64, &psf).unwrap();

        let mut input = Array2::<f64>::zeros((64, 64));
        input[[32, 32]] = 1.0;

        let output = conv.convolve(&input).unwrap();
        for kr in 0..9 {
            for kc in 0..9 {
                let row = 32 + kr - 4;
                let col = 32 + kc - 4;
                assert_relative_eq!(
                    output[[row, col]],
                    psf.weights()[[kr, kc]],
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn flux_is_conserved() {
        // sum(Convolve(x, psf)) == sum(x) to 1e-10 relative.
        let psf = gaussian_psf(7, 1.5);
        let conv = Convolver::new(32, 32, &psf).unwrap();

        let mut input = Array2::<f64>::zeros((32, 32));
        input[[10, 15]] = 3.0;
        input[[20, 5]] = 7.0;

        let output = conv.convolve(&input).unwrap();
        let in_sum: f64 = input.iter().sum();
        let out_sum: f64 = output.iter().sum();
        assert_relative_eq!(out_sum, in_sum, max_relative = 1e-10);
    }

    #[test]
    fn rejects_psf_larger_than_image() {
        let psf = gaussian_psf(65, 2.0);
        assert!(Convolver::new(32, 32, &psf).is_err());
    }
}
