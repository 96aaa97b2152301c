//! Parametric 2D surface-brightness model image synthesis engine.
//!
//! Given a list of additive function components, their parameter vector,
//! an optional point-spread function, and an output geometry, [`model`]
//! produces the pixel image a nonlinear optimizer would compare against
//! observed data. The optimizer, fit-statistic evaluator, FITS I/O, and
//! CLI configuration parsing are external collaborators; only their
//! interfaces to this engine are modeled here.

pub mod component;
pub mod compute;
pub mod consts;
pub mod convolve;
pub mod error;
pub mod integrate;
pub mod model;
pub mod oversample;
pub mod params;
pub mod psf;

pub use component::{ComponentKind, FunctionComponent};
pub use error::{ModelDiagnostics, ModelError, Result};
pub use model::{ComponentDescriptor, ModelBuilder};
pub use oversample::{OversampledRegion, OversampledRegionSpec};
pub use psf::PsfKernel;
