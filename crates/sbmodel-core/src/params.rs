//! Parameter vectors and component descriptors, matching the flat
//! configuration file grammar the CLI parses.

/// A single named, bounded scalar parameter as it comes out of a
/// configuration file. The core only ever reads `.value`; `.lower`/
/// `.upper` are carried through for the optimizer's benefit.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParameterSpec {
    pub label: String,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ParameterSpec {
    pub fn fixed(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    pub fn bounded(label: impl Into<String>, value: f64, lower: f64, upper: f64) -> Self {
        Self {
            label: label.into(),
            value,
            lower,
            upper,
        }
    }
}

/// A flat, ordered parameter vector. The `ModelBuilder` knows
/// the offset and width of each component's slice; components never see
/// the whole vector, only `params[offset..offset+n_params]`.
pub type ParameterVector = [f64];

/// Flatten a list of per-component parameter specs into the plain `Vec<f64>`
/// that `ModelBuilder::SetParameters` expects, in declaration order.
pub fn flatten(component_params: &[Vec<ParameterSpec>]) -> Vec<f64> {
    component_params
        .iter()
        .flat_map(|specs| specs.iter().map(|s| s.value))
        .collect()
}
