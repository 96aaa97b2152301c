use thiserror::Error;

/// Error kinds surfaced by the model-image synthesis core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid geometry: {width}x{height}")]
    BadGeometry { width: i64, height: i64 },

    #[error("invalid PSF: {0}")]
    BadPSF(String),

    #[error("parameter count mismatch: expected {expected}, got {got}")]
    ParameterCountMismatch { expected: usize, got: usize },

    #[error("parameter out of domain in component {component} ({label}): {reason}")]
    ParameterOutOfDomain {
        component: String,
        label: String,
        reason: String,
    },

    #[error("convolution failed: {0}")]
    ConvolutionFailed(String),

    #[error("model evaluation cancelled")]
    Cancelled,

    #[error("oversampled regions overlap")]
    OverlappingOversampleRegions,

    #[error("oversampled region out of image bounds")]
    OversampleRegionOutOfBounds,

    #[error("unknown component kind: {0}")]
    UnknownComponentKind(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Non-fatal diagnostics attached to a completed `ComputeModelImage` call.
///
/// Non-convergence is a warning, not an error: the pixel is still written
/// using the integrator's best estimate. This struct is how that warning
/// reaches the caller without aborting synthesis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelDiagnostics {
    /// Number of pixels where the line-of-sight quadrature failed to
    /// converge within the configured tolerances/subdivision budget.
    pub non_converged_pixels: usize,
    /// Whether any output pixel was found to be non-finite after synthesis.
    pub non_finite: bool,
}

impl ModelDiagnostics {
    pub fn merge(&mut self, other: &ModelDiagnostics) {
        self.non_converged_pixels += other.non_converged_pixels;
        self.non_finite |= other.non_finite;
    }
}
