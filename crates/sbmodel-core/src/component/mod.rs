//! `FunctionComponent` kinds: Gaussian1D, Exponential2D, Sersic,
//! ExponentialDisk3D, PointSource, FlatSky.
//!
//! Dispatch is a tagged variant keyed by kind, not a virtual call graph: the
//! `ComponentKind` enum wraps one concrete struct per kind and `match`es to
//! its inherent `get_value`/`get_value_checked` rather than walking an
//! inheritance hierarchy or a vtable.

pub mod common;
mod exp_disk3d;
mod exponential;
mod flat_sky;
mod gaussian;
mod point_source;
mod sersic;

pub use exp_disk3d::ExponentialDisk3D;
pub use exponential::Exponential2D;
pub use flat_sky::FlatSky;
pub use gaussian::Gaussian1D;
pub use point_source::PointSource;
pub use sersic::Sersic;

use crate::error::{ModelError, Result};

/// Shared `Setup`/`GetValue` contract every component kind implements.
///
/// Each implementor caches its per-`Setup`-invariant scratch (rotation trig,
/// reciprocal scale lengths, linear intensity from a magnitude) and is
/// otherwise immutable: `get_value` never mutates, so a `ComponentKind`
/// can be shared read-only across the row-parallel pixel loop.
pub trait FunctionComponent: Sized {
    /// Kind name used in config files and error messages.
    const NAME: &'static str;

    /// Number of scalar parameters this kind consumes, declaration order.
    const N_PARAMS: usize;

    /// Validate `params` (exactly [`Self::N_PARAMS`] long) and precompute
    /// derived scratch. `zp` is the process-wide photometric zero-point,
    /// used by kinds whose intensity parameter is a magnitude.
    fn setup(params: &[f64], zp: f64) -> Result<Self>;

    /// Evaluate intensity at absolute sky coordinates `(x, y)`; 1-indexed
    /// pixel-center convention, already applied by the caller.
    fn get_value(&self, x: f64, y: f64) -> f64;

    /// Like [`Self::get_value`] but also reports whether an internal
    /// line-of-sight quadrature converged. Kinds that don't integrate
    /// always report `true`.
    fn get_value_checked(&self, x: f64, y: f64) -> (f64, bool) {
        (self.get_value(x, y), true)
    }

    /// `true` if this kind performs a line-of-sight integral per pixel and
    /// so can report a non-convergence warning.
    fn needs_integration(&self) -> bool {
        false
    }

    /// `true` if the profile is steep enough near its peak that the
    /// `ModelBuilder` should sub-pixel integrate nearby.
    fn is_steep_near_peak(&self) -> bool {
        false
    }

    /// Radius in pixels around the component center within which
    /// sub-pixel integration activates, when [`Self::is_steep_near_peak`].
    fn activation_radius(&self) -> f64 {
        0.0
    }

    /// `true` for a zero-spatial-extent component (`PointSource`), which
    /// the `ModelBuilder` rasterizes specially rather than evaluating on
    /// the per-pixel grid.
    fn is_point_like(&self) -> bool {
        false
    }
}

/// Tagged union over every component kind the registry knows how to build
/// from a config block. Owned by the `ModelBuilder`'s component list.
#[derive(Clone, Debug)]
pub enum ComponentKind {
    Gaussian1D(Gaussian1D),
    Exponential2D(Exponential2D),
    Sersic(Sersic),
    ExponentialDisk3D(ExponentialDisk3D),
    PointSource(PointSource),
    FlatSky(FlatSky),
}

macro_rules! dispatch {
    ($self:expr, $method:ident ($($arg:expr),*)) => {
        match $self {
            ComponentKind::Gaussian1D(c) => c.$method($($arg),*),
            ComponentKind::Exponential2D(c) => c.$method($($arg),*),
            ComponentKind::Sersic(c) => c.$method($($arg),*),
            ComponentKind::ExponentialDisk3D(c) => c.$method($($arg),*),
            ComponentKind::PointSource(c) => c.$method($($arg),*),
            ComponentKind::FlatSky(c) => c.$method($($arg),*),
        }
    };
}

impl ComponentKind {
    /// Build a component of the named kind from its flat parameter slice
    /// (a parsed `FUNCTION <name>` config block).
    pub fn build(name: &str, params: &[f64], zp: f64) -> Result<Self> {
        match name {
            Gaussian1D::NAME => Ok(Self::Gaussian1D(Gaussian1D::setup(params, zp)?)),
            Exponential2D::NAME => Ok(Self::Exponential2D(Exponential2D::setup(params, zp)?)),
            Sersic::NAME => Ok(Self::Sersic(Sersic::setup(params, zp)?)),
            ExponentialDisk3D::NAME => {
                Ok(Self::ExponentialDisk3D(ExponentialDisk3D::setup(params, zp)?))
            }
            PointSource::NAME => Ok(Self::PointSource(PointSource::setup(params, zp)?)),
            FlatSky::NAME => Ok(Self::FlatSky(FlatSky::setup(params, zp)?)),
            other => Err(ModelError::UnknownComponentKind(other.to_string())),
        }
    }

    /// Declared parameter count for a kind name, used by the config parser
    /// to validate a block before calling [`Self::build`].
    pub fn n_params_for(name: &str) -> Option<usize> {
        Some(match name {
            Gaussian1D::NAME => Gaussian1D::N_PARAMS,
            Exponential2D::NAME => Exponential2D::N_PARAMS,
            Sersic::NAME => Sersic::N_PARAMS,
            ExponentialDisk3D::NAME => ExponentialDisk3D::N_PARAMS,
            PointSource::NAME => PointSource::N_PARAMS,
            FlatSky::NAME => FlatSky::N_PARAMS,
            _ => return None,
        })
    }

    /// Declared parameter labels for a kind name, in declaration order,
    /// used by the config parser to reject typo'd labels.
    pub fn labels_for(name: &str) -> Option<&'static [&'static str]> {
        Some(match name {
            Gaussian1D::NAME => &["X0", "Y0", "MU", "SIGMA"],
            Exponential2D::NAME => &["X0", "Y0", "PA", "ELL", "I0", "H"],
            Sersic::NAME => &["X0", "Y0", "PA", "ELL", "N", "I_E", "R_E"],
            ExponentialDisk3D::NAME => &["X0", "Y0", "PA", "INC", "I0", "H", "HZ"],
            PointSource::NAME => &["X0", "Y0", "MAG"],
            FlatSky::NAME => &["I0"],
            _ => return None,
        })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ComponentKind::Gaussian1D(_) => Gaussian1D::NAME,
            ComponentKind::Exponential2D(_) => Exponential2D::NAME,
            ComponentKind::Sersic(_) => Sersic::NAME,
            ComponentKind::ExponentialDisk3D(_) => ExponentialDisk3D::NAME,
            ComponentKind::PointSource(_) => PointSource::NAME,
            ComponentKind::FlatSky(_) => FlatSky::NAME,
        }
    }

    pub fn get_value(&self, x: f64, y: f64) -> f64 {
        dispatch!(self, get_value(x, y))
    }

    pub fn get_value_checked(&self, x: f64, y: f64) -> (f64, bool) {
        dispatch!(self, get_value_checked(x, y))
    }

    pub fn needs_integration(&self) -> bool {
        dispatch!(self, needs_integration())
    }

    pub fn is_steep_near_peak(&self) -> bool {
        dispatch!(self, is_steep_near_peak())
    }

    pub fn activation_radius(&self) -> f64 {
        dispatch!(self, activation_radius())
    }

    pub fn is_point_like(&self) -> bool {
        dispatch!(self, is_point_like())
    }

    /// Center `(x0, y0)` in sky coordinates, used by the `ModelBuilder` to
    /// rasterize `PointSource` and to place sub-pixel-integration cutoffs.
    pub fn center(&self) -> (f64, f64) {
        match self {
            ComponentKind::Gaussian1D(c) => (c.x0, c.y0),
            ComponentKind::Exponential2D(c) => (c.x0, c.y0),
            ComponentKind::Sersic(c) => (c.x0, c.y0),
            ComponentKind::ExponentialDisk3D(c) => (c.x0, c.y0),
            ComponentKind::PointSource(c) => (c.x0, c.y0),
            ComponentKind::FlatSky(_) => (0.0, 0.0),
        }
    }
}
