//! End-to-end scenarios exercising the public `ModelBuilder` contract,
//! beyond what each module's own `#[cfg(test)]` block already covers for
//! its unit: a delta-spike/PSF round trip, a circular Gaussian's rotation
//! invariance, and `PointSource` rasterization both inside and outside an
//! `OversampledRegion`.

use approx::assert_relative_eq;
use sbmodel_core::oversample::OversampledRegionSpec;
use sbmodel_core::params::ParameterSpec;
use sbmodel_core::psf::gaussian_psf;
use sbmodel_core::{ComponentDescriptor, ModelBuilder};

fn descriptor(kind: &str, params: &[(&str, f64)]) -> ComponentDescriptor {
    ComponentDescriptor {
        kind: kind.to_string(),
        params: params
            .iter()
            .map(|(label, value)| ParameterSpec::fixed(*label, *value))
            .collect(),
    }
}

#[test]
fn point_source_outside_any_region_lands_on_its_nearest_base_pixel() {
    let point = descriptor("PointSource", &[("X0", 10.0), ("Y0", 10.0), ("MAG", 20.0)]);
    let mut model = ModelBuilder::configure(32, 32, vec![point], None, vec![], 25.0).unwrap();
    model.compute_model_image(None).unwrap();

    // sky (10, 10) 1-indexed -> 0-indexed (9, 9).
    let image = model.image();
    assert_relative_eq!(image[[9, 9]], 100.0, epsilon = 1e-9);
    let total: f64 = image.iter().sum();
    assert_relative_eq!(total, 100.0, epsilon = 1e-9);
}

#[test]
fn point_source_inside_an_oversampled_region_is_deferred_to_it() {
    let point = descriptor("PointSource", &[("X0", 12.3), ("Y0", 12.7), ("MAG", 20.0)]);
    let region = OversampledRegionSpec {
        row_start: 8,
        col_start: 8,
        width: 8,
        height: 8,
        oversample: 4,
        psf: gaussian_psf(9, 1.0),
    };
    let mut model =
        ModelBuilder::configure(32, 32, vec![point], None, vec![region], 25.0).unwrap();
    model.compute_model_image(None).unwrap();

    let image = model.image();
    // All of the point source's flux should land inside the oversampled
    // region's footprint (rows/cols 8..16), not scattered elsewhere.
    let mut inside = 0.0;
    let mut outside = 0.0;
    for ((row, col), v) in image.indexed_iter() {
        if (8..16).contains(&row) && (8..16).contains(&col) {
            inside += v;
        } else {
            outside += v;
        }
    }
    assert_relative_eq!(inside, 100.0, max_relative = 1e-6);
    assert_relative_eq!(outside, 0.0, epsilon = 1e-9);
}

#[test]
fn point_source_convolution_round_trip_through_model_builder() {
    // A PointSource at the image center, convolved with a 9x9 Gaussian
    // PSF, reproduces the PSF itself centered on the source to high
    // precision.
    let psf = gaussian_psf(9, 2.0);
    let point = descriptor("PointSource", &[("X0", 32.0), ("Y0", 32.0), ("MAG", 25.0)]);
    let mut model =
        ModelBuilder::configure(64, 64, vec![point], Some(psf.clone()), vec![], 25.0).unwrap();
    model.compute_model_image(None).unwrap();

    let image = model.image();
    // PointSource flux at ZP=25, MAG=25 is 10^(0.4*0) = 1.0, landing in the
    // pixel nearest 1-indexed (32, 32) -> 0-indexed (31, 31).
    for kr in 0..9 {
        for kc in 0..9 {
            let row = 31 + kr - 4;
            let col = 31 + kc - 4;
            assert_relative_eq!(image[[row, col]], psf.weights()[[kr, kc]], epsilon = 1e-8);
        }
    }
}

#[test]
fn circular_profile_is_position_angle_invariant_through_model_builder() {
    let base = descriptor(
        "Exponential2D",
        &[("X0", 16.0), ("Y0", 16.0), ("PA", 0.0), ("ELL", 0.0), ("I0", 1.0), ("H", 4.0)],
    );
    let rotated = descriptor(
        "Exponential2D",
        &[("X0", 16.0), ("Y0", 16.0), ("PA", 63.0), ("ELL", 0.0), ("I0", 1.0), ("H", 4.0)],
    );

    let mut model_base = ModelBuilder::configure(32, 32, vec![base], None, vec![], 25.0).unwrap();
    model_base.compute_model_image(None).unwrap();
    let mut model_rot = ModelBuilder::configure(32, 32, vec![rotated], None, vec![], 25.0).unwrap();
    model_rot.compute_model_image(None).unwrap();

    for (a, b) in model_base.image().iter().zip(model_rot.image().iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn flux_is_conserved_end_to_end_with_a_global_psf() {
    // At the ModelBuilder level rather than the bare Convolver: total flux
    // before and after a configured PSF convolution agree to within the
    // FFT round-off bound.
    let sersic = descriptor(
        "Sersic",
        &[
            ("X0", 32.0),
            ("Y0", 32.0),
            ("PA", 20.0),
            ("ELL", 0.3),
            ("N", 2.0),
            ("I_E", 40.0),
            ("R_E", 8.0),
        ],
    );
    let psf = gaussian_psf(11, 2.5);

    let mut unconvolved =
        ModelBuilder::configure(64, 64, vec![sersic.clone()], None, vec![], 25.0).unwrap();
    unconvolved.compute_model_image(None).unwrap();
    let unconvolved_sum: f64 = unconvolved.image().iter().sum();

    let mut convolved =
        ModelBuilder::configure(64, 64, vec![sersic], Some(psf), vec![], 25.0).unwrap();
    convolved.compute_model_image(None).unwrap();
    let convolved_sum: f64 = convolved.image().iter().sum();

    assert_relative_eq!(convolved_sum, unconvolved_sum, max_relative = 1e-8);
}

#[test]
fn reconfiguring_and_reusing_a_model_builder_is_independent_per_call() {
    // Calling compute_model_image twice with different parameters must not
    // leak state between calls: components carry no cross-pixel state
    // other than what Setup recomputes.
    let gaussian = descriptor("Gaussian1D", &[("X0", 16.0), ("Y0", 16.0), ("MU", 20.0), ("SIGMA", 3.0)]);
    let mut model = ModelBuilder::configure(32, 32, vec![gaussian], None, vec![], 25.0).unwrap();

    model.set_parameters(&[16.0, 16.0, 20.0, 3.0]).unwrap();
    model.compute_model_image(None).unwrap();
    let first_peak = model.image()[[15, 15]];

    model.set_parameters(&[16.0, 16.0, 22.5, 3.0]).unwrap();
    model.compute_model_image(None).unwrap();
    let second_peak = model.image()[[15, 15]];

    assert_relative_eq!(first_peak, 100.0, epsilon = 1e-9);
    assert_relative_eq!(second_peak, 10.0, epsilon = 1e-9);
}
