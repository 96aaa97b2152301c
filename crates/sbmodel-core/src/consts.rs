/// Default photometric zero-point (magnitudes), used when a model
/// configuration does not specify one. `I = 10^(0.4*(ZP - mu))`.
pub const DEFAULT_ZP: f64 = 25.0;

/// Minimum pixel count (width*height) to use row-level Rayon parallelism
/// in the model-image pixel loop and in the convolver's FFT passes.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Relative tolerance for the line-of-sight adaptive quadrature (§4.B).
pub const LOS_INTEGRATION_RTOL: f64 = 1e-6;

/// Absolute tolerance for the line-of-sight adaptive quadrature (§4.B).
pub const LOS_INTEGRATION_ATOL: f64 = 1e-8;

/// Maximum number of interval subdivisions before the line-of-sight
/// integrator gives up and returns its best estimate with a non-convergence
/// flag.
pub const LOS_INTEGRATION_MAX_SUBDIVISIONS: usize = 1000;

/// Half-width multiplier on `h_z/|cos i|` used to choose the line-of-sight
/// integration bound `L`.
pub const LOS_INTEGRATION_HZ_MULTIPLE: f64 = 8.0;

/// Half-width multiplier on `h` used to choose the line-of-sight
/// integration bound `L` (the `max` counterpart to the h_z bound).
pub const LOS_INTEGRATION_H_MULTIPLE: f64 = 8.0;

/// Default sub-pixel oversampling factor `k` for steep-profile 2D
/// sub-pixel integration (§4.B): a pixel is split into `k x k` sub-samples.
pub const DEFAULT_SUBPIXEL_K: usize = 5;

/// Sub-pixel integration is activated within this many effective
/// scale-lengths of a "steep near peak" component's center.
pub const SUBPIXEL_ACTIVATION_RADIUS_SCALE_LENGTHS: f64 = 2.0;

/// Required relative closeness of a PSF kernel's weight sum to 1.0 for it
/// to be accepted as "area-normalized" at `Configure` time.
pub const PSF_NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// Small epsilon guarding divisions in component evaluation (reciprocal
/// scale lengths, etc.).
pub const EPSILON: f64 = 1e-12;
