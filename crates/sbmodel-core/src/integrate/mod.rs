pub mod quadrature;
pub mod subpixel;

pub use quadrature::{adaptive_simpson, adaptive_simpson_with_tolerances, QuadratureResult};
pub use subpixel::subpixel_average;
