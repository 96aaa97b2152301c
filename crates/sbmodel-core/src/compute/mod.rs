//! Shared row/column-parallel numeric kernels used by [`crate::convolve`].
//!
//! A single CPU/Rayon implementation is all this engine needs; there is no
//! pluggable GPU backend here — `ComputeModelImage`'s hot loop is the
//! per-pixel component sum in [`crate::model`], not the FFT, and a
//! dispatchable compute backend would add indirection without benefit at
//! this scale. See DESIGN.md for the reasoning.
pub mod cpu;
