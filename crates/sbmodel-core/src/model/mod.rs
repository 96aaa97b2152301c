//! ModelBuilder: assembles the full model image — per-pixel sum over
//! components, oversampled-tile dispatch, global PSF convolution — and
//! exposes the result as a read-only pixel buffer.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::Array2;
use rayon::prelude::*;

use crate::component::{ComponentKind, FunctionComponent};
use crate::consts::{DEFAULT_SUBPIXEL_K, PARALLEL_PIXEL_THRESHOLD};
use crate::convolve::Convolver;
use crate::error::{ModelDiagnostics, ModelError, Result};
use crate::integrate::subpixel_average;
use crate::oversample::{validate_non_overlapping, OversampledRegion, OversampledRegionSpec};
use crate::params::ParameterSpec;
use crate::psf::PsfKernel;
use tracing::{info, warn};

/// One component's declared kind and its config-file parameter specs, in
/// declaration order. Created once at model construction from a config.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ComponentDescriptor {
    pub kind: String,
    pub params: Vec<ParameterSpec>,
}

/// The model-image synthesis engine. Owns its scratch and output buffers
/// exclusively; components hold no heap allocations once `Setup` has run.
pub struct ModelBuilder {
    width: usize,
    height: usize,
    zp: f64,
    kind_names: Vec<String>,
    param_labels: Vec<Vec<String>>,
    param_offsets: Vec<usize>,
    param_counts: Vec<usize>,
    components: Vec<ComponentKind>,
    convolver: Option<Convolver>,
    oversample_regions: Vec<OversampledRegion>,
    scratch: Array2<f64>,
    image: Array2<f64>,
    diagnostics: ModelDiagnostics,
    valid: bool,
}

impl ModelBuilder {
    /// `Configure(width, height, components, psf?, oversampleRegions?)`.
    /// Builds every component via its `Setup`, plans the global `Convolver`
    /// and every `OversampledRegion`'s dedicated convolver once, up front.
    pub fn configure(
        width: usize,
        height: usize,
        descriptors: Vec<ComponentDescriptor>,
        psf: Option<PsfKernel>,
        oversample_specs: Vec<OversampledRegionSpec>,
        zp: f64,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ModelError::BadGeometry {
                width: width as i64,
                height: height as i64,
            });
        }
        validate_non_overlapping(&oversample_specs)?;

        let mut components = Vec::with_capacity(descriptors.len());
        let mut kind_names = Vec::with_capacity(descriptors.len());
        let mut param_labels = Vec::with_capacity(descriptors.len());
        let mut param_offsets = Vec::with_capacity(descriptors.len());
        let mut param_counts = Vec::with_capacity(descriptors.len());
        let mut offset = 0usize;

        for descriptor in &descriptors {
            let values: Vec<f64> = descriptor.params.iter().map(|p| p.value).collect();
            let labels: Vec<String> = descriptor.params.iter().map(|p| p.label.clone()).collect();
            let component = ComponentKind::build(&descriptor.kind, &values, zp)?;
            kind_names.push(descriptor.kind.clone());
            param_labels.push(labels);
            param_offsets.push(offset);
            param_counts.push(values.len());
            offset += values.len();
            components.push(component);
        }

        let convolver = match &psf {
            Some(kernel) => Some(Convolver::new(height, width, kernel)?),
            None => None,
        };

        let mut oversample_regions = Vec::with_capacity(oversample_specs.len());
        for spec in oversample_specs {
            oversample_regions.push(OversampledRegion::new(spec, height, width)?);
        }

        info!(
            width,
            height,
            components = components.len(),
            psf = convolver.is_some(),
            oversample_regions = oversample_regions.len(),
            "model configured"
        );

        Ok(Self {
            width,
            height,
            zp,
            kind_names,
            param_labels,
            param_offsets,
            param_counts,
            components,
            convolver,
            oversample_regions,
            scratch: Array2::zeros((height, width)),
            image: Array2::zeros((height, width)),
            diagnostics: ModelDiagnostics::default(),
            valid: false,
        })
    }

    /// Total parameter count across all components, for the optimizer's
    /// benefit.
    pub fn n_params(&self) -> usize {
        self.param_counts.iter().sum()
    }

    /// Flat, declaration-order parameter labels across all components.
    pub fn parameter_labels(&self) -> Vec<String> {
        self.param_labels.iter().flatten().cloned().collect()
    }

    /// `SetParameters(vector)`: distribute slices to each component's
    /// `Setup`.
    pub fn set_parameters(&mut self, vector: &[f64]) -> Result<()> {
        let expected = self.n_params();
        if vector.len() != expected {
            return Err(ModelError::ParameterCountMismatch {
                expected,
                got: vector.len(),
            });
        }
        for idx in 0..self.components.len() {
            let offset = self.param_offsets[idx];
            let count = self.param_counts[idx];
            let slice = &vector[offset..offset + count];
            self.components[idx] = ComponentKind::build(&self.kind_names[idx], slice, self.zp)?;
        }
        self.valid = false;
        Ok(())
    }

    /// `ComputeModelImage()`: sums spatial components, rasterizes point
    /// sources, runs oversampled regions, then convolves with the global
    /// PSF if one is configured. `cancel`, if given, is polled once per row
    /// stripe.
    pub fn compute_model_image(&mut self, cancel: Option<&AtomicBool>) -> Result<()> {
        let started = std::time::Instant::now();
        self.valid = false;
        self.diagnostics = ModelDiagnostics::default();
        self.scratch.fill(0.0);

        self.fill_spatial_components(cancel)?;
        self.rasterize_point_sources_outside_regions();
        self.run_oversampled_regions()?;

        match &self.convolver {
            Some(conv) => {
                self.image = conv.convolve(&self.scratch)?;
            }
            None => {
                self.image.assign(&self.scratch);
            }
        }

        if self.image.iter().any(|v| !v.is_finite()) {
            self.diagnostics.non_finite = true;
        }
        self.valid = true;

        if self.diagnostics.non_converged_pixels > 0 {
            warn!(
                non_converged_pixels = self.diagnostics.non_converged_pixels,
                "line-of-sight quadrature did not converge for some pixels"
            );
        }
        if self.diagnostics.non_finite {
            warn!("model image contains non-finite pixels");
        }
        info!(
            width = self.width,
            height = self.height,
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "model image computed"
        );
        Ok(())
    }

    /// `GetImage()`: read-only view of the last computed image.
    pub fn image(&self) -> &Array2<f64> {
        &self.image
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn diagnostics(&self) -> &ModelDiagnostics {
        &self.diagnostics
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn fill_spatial_components(&mut self, cancel: Option<&AtomicBool>) -> Result<()> {
        let nrows = self.height;
        let ncols = self.width;
        let components = &self.components;

        if nrows * ncols >= PARALLEL_PIXEL_THRESHOLD {
            let cancelled = AtomicBool::new(false);
            let rows: Vec<Option<(Vec<f64>, usize)>> = (0..nrows)
                .into_par_iter()
                .map(|row| {
                    if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                        cancelled.store(true, Ordering::Relaxed);
                        return None;
                    }
                    let mut row_vals = vec![0.0; ncols];
                    let mut row_non_converged = 0;
                    for (col, val) in row_vals.iter_mut().enumerate() {
                        let x = (col + 1) as f64;
                        let y = (row + 1) as f64;
                        let (v, converged) = eval_spatial(components, x, y);
                        *val = v;
                        if !converged {
                            row_non_converged += 1;
                        }
                    }
                    Some((row_vals, row_non_converged))
                })
                .collect();

            if cancelled.load(Ordering::Relaxed) {
                return Err(ModelError::Cancelled);
            }
            for (row, data) in rows.into_iter().enumerate() {
                let (vals, non_converged) = data.expect("not cancelled, all rows present");
                for (col, v) in vals.into_iter().enumerate() {
                    self.scratch[[row, col]] = v;
                }
                self.diagnostics.non_converged_pixels += non_converged;
            }
        } else {
            for row in 0..nrows {
                if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                    return Err(ModelError::Cancelled);
                }
                for col in 0..ncols {
                    let x = (col + 1) as f64;
                    let y = (row + 1) as f64;
                    let (v, converged) = eval_spatial(components, x, y);
                    self.scratch[[row, col]] = v;
                    if !converged {
                        self.diagnostics.non_converged_pixels += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Point sources whose nearest base pixel is *not* inside any
    /// oversampled region get their flux deposited directly.
    fn rasterize_point_sources_outside_regions(&mut self) {
        for component in &self.components {
            if let ComponentKind::PointSource(p) = component {
                let (row, col) = nearest_base_pixel(p.x0, p.y0, self.height, self.width);
                let deferred = self
                    .oversample_regions
                    .iter()
                    .any(|r| r.contains_base_pixel(row, col));
                if !deferred {
                    self.scratch[[row, col]] += p.total_flux;
                }
            }
        }
    }

    fn run_oversampled_regions(&mut self) -> Result<()> {
        let components = &self.components;
        for region_idx in 0..self.oversample_regions.len() {
            let region = &self.oversample_regions[region_idx];
            let eval = |x: f64, y: f64| eval_spatial(components, x, y);
            let (mut hi_res, mut diag) = region.synthesize(eval);

            let s = region.oversample_factor();
            for component in components {
                if let ComponentKind::PointSource(p) = component {
                    let (row, col) = nearest_base_pixel(p.x0, p.y0, self.height, self.width);
                    if region.contains_base_pixel(row, col) {
                        let (hr, hc) = region.nearest_hi_res_pixel(p.x0, p.y0);
                        // Injected at hi-res scale: area-average downsampling
                        // divides by s^2, so pre-multiplying here is what
                        // makes the point source's *total* flux (not an
                        // s^2-diluted fraction of it) land in the patch.
                        hi_res[[hr, hc]] += p.total_flux * (s * s) as f64;
                    }
                }
            }

            let patch = region.convolve_and_downsample(&hi_res, &mut diag)?;
            let row_start = region.row_start();
            let col_start = region.col_start();
            for r in 0..region.height() {
                for c in 0..region.width() {
                    self.scratch[[row_start + r, col_start + c]] = patch[[r, c]];
                }
            }
            self.diagnostics.merge(&diag);
        }
        Ok(())
    }
}

/// Sum every non-point-like component's contribution at `(x, y)`,
/// sub-pixel integrating components flagged "steep near peak" when the
/// pixel falls within their activation radius.
fn eval_spatial(components: &[ComponentKind], x: f64, y: f64) -> (f64, bool) {
    let mut total = 0.0;
    let mut converged = true;

    for component in components {
        if component.is_point_like() {
            continue;
        }
        if component.is_steep_near_peak() {
            let (cx, cy) = component.center();
            let dist = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            if dist <= component.activation_radius() {
                let local_converged = Cell::new(true);
                let value = subpixel_average(
                    |xx, yy| {
                        let (v, ok) = component.get_value_checked(xx, yy);
                        if !ok {
                            local_converged.set(false);
                        }
                        v
                    },
                    x,
                    y,
                    DEFAULT_SUBPIXEL_K,
                );
                if !local_converged.get() {
                    converged = false;
                }
                total += value;
                continue;
            }
        }
        let (value, ok) = component.get_value_checked(x, y);
        if !ok {
            converged = false;
        }
        total += value;
    }

    (total, converged)
}

/// Nearest base-resolution 0-indexed pixel to sky coordinate `(xc, yc)`:
/// `round(xc)-1, round(yc)-1`, clamped to image bounds.
fn nearest_base_pixel(xc: f64, yc: f64, height: usize, width: usize) -> (usize, usize) {
    let col = (xc.round() as isize - 1).clamp(0, width as isize - 1) as usize;
    let row = (yc.round() as isize - 1).clamp(0, height as isize - 1) as usize;
    (row, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gaussian_descriptor(x0: f64, y0: f64, mu: f64, sigma: f64) -> ComponentDescriptor {
        ComponentDescriptor {
            kind: "Gaussian1D".into(),
            params: vec![
                ParameterSpec::fixed("X0", x0),
                ParameterSpec::fixed("Y0", y0),
                ParameterSpec::fixed("MU", mu),
                ParameterSpec::fixed("SIGMA", sigma),
            ],
        }
    }

    fn sersic_descriptor(x0: f64, y0: f64) -> ComponentDescriptor {
        ComponentDescriptor {
            kind: "Sersic".into(),
            params: vec![
                ParameterSpec::fixed("X0", x0),
                ParameterSpec::fixed("Y0", y0),
                ParameterSpec::fixed("PA", 0.0),
                ParameterSpec::fixed("ELL", 0.2),
                ParameterSpec::fixed("N", 2.0),
                ParameterSpec::fixed("I_E", 10.0),
                ParameterSpec::fixed("R_E", 6.0),
            ],
        }
    }

    #[test]
    fn configure_rejects_non_positive_geometry() {
        let result = ModelBuilder::configure(0, 32, vec![], None, vec![], 25.0);
        assert!(matches!(result, Err(ModelError::BadGeometry { .. })));
    }

    #[test]
    fn set_parameters_rejects_wrong_length() {
        let mut model =
            ModelBuilder::configure(32, 32, vec![gaussian_descriptor(16.0, 16.0, 20.0, 3.0)], None, vec![], 25.0)
                .unwrap();
        let err = model.set_parameters(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ModelError::ParameterCountMismatch { .. }));
    }

    #[test]
    fn single_gaussian_peak_matches_mag_to_intensity() {
        let mut model =
            ModelBuilder::configure(32, 32, vec![gaussian_descriptor(16.0, 16.0, 20.0, 3.0)], None, vec![], 25.0)
                .unwrap();
        model.compute_model_image(None).unwrap();
        let image = model.image();
        // pixel (16,16) 1-indexed -> 0-indexed (15,15); x=16 exactly at x0.
        assert_relative_eq!(image[[15, 15]], 100.0, epsilon = 1e-6);
    }

    #[test]
    fn multiple_components_sum_linearly_pre_convolution() {
        let g = gaussian_descriptor(10.0, 10.0, 20.0, 2.0);
        let s = sersic_descriptor(20.0, 20.0);

        let mut model_g = ModelBuilder::configure(32, 32, vec![g.clone()], None, vec![], 25.0).unwrap();
        model_g.compute_model_image(None).unwrap();

        let mut model_s = ModelBuilder::configure(32, 32, vec![s.clone()], None, vec![], 25.0).unwrap();
        model_s.compute_model_image(None).unwrap();

        let mut model_both =
            ModelBuilder::configure(32, 32, vec![g, s], None, vec![], 25.0).unwrap();
        model_both.compute_model_image(None).unwrap();

        for ((a, b), both) in model_g
            .image()
            .iter()
            .zip(model_s.image().iter())
            .zip(model_both.image().iter())
        {
            assert_relative_eq!(a + b, both, epsilon = 1e-12);
        }
    }

    #[test]
    fn determinism_across_thread_counts() {
        // The sequential and parallel-path pixel loops must agree bitwise:
        // both share eval_spatial and differ only in iteration order.
        let descriptor = sersic_descriptor(32.0, 32.0);
        let mut a = ModelBuilder::configure(48, 48, vec![descriptor.clone()], None, vec![], 25.0).unwrap();
        let mut b = ModelBuilder::configure(48, 48, vec![descriptor], None, vec![], 25.0).unwrap();
        a.compute_model_image(None).unwrap();
        b.compute_model_image(None).unwrap();
        assert_eq!(a.image(), b.image());
    }

    #[test]
    fn cancellation_short_circuits_with_cancelled_error() {
        let descriptor = sersic_descriptor(32.0, 32.0);
        let mut model = ModelBuilder::configure(300, 300, vec![descriptor], None, vec![], 25.0).unwrap();
        let flag = AtomicBool::new(true);
        let err = model.compute_model_image(Some(&flag)).unwrap_err();
        assert!(matches!(err, ModelError::Cancelled));
        assert!(!model.is_valid());
    }
}
