//! Flat-text model configuration parser.
//!
//! Consumed only by the CLI, never by [`sbmodel_core`]: the core accepts
//! already-parsed [`sbmodel_core::ComponentDescriptor`]s and never touches
//! a file. Grammar:
//!
//! ```text
//! ZP 25.0
//! GEOMETRY 128 128
//!
//! FUNCTION Sersic
//! X0   64.0
//! Y0   64.0
//! PA   30.0   0.0   180.0
//! ELL  0.3    0.0   0.9
//! N    2.0    0.3   8.0
//! I_E  50.0
//! R_E  12.0
//! ```
//!
//! `ZP`/`GEOMETRY` are optional and default to 25.0 / absent; each
//! `FUNCTION <name>` header starts a block of `<label> <value> [<lower>
//! <upper>]` lines, validated against that kind's declared parameter
//! labels so a typo is a parse error, not a silent `BadGeometry` later.

use anyhow::{bail, Context, Result};
use sbmodel_core::{params::ParameterSpec, ComponentDescriptor, ComponentKind};
use serde::Serialize;

#[derive(Serialize)]
pub struct ParsedConfig {
    pub zp: f64,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub components: Vec<ComponentDescriptor>,
}

/// Render a parsed configuration as TOML, for `sbmodel info --dump-toml`:
/// a debugging aid to see what the flat-text grammar was understood as,
/// not an alternate load format (the core only ever reads `ZP`/`GEOMETRY`/
/// `FUNCTION` text).
pub fn to_toml(parsed: &ParsedConfig) -> Result<String> {
    toml::to_string_pretty(parsed).context("failed to render configuration as TOML")
}

pub fn parse(text: &str) -> Result<ParsedConfig> {
    let mut zp = sbmodel_core::consts::DEFAULT_ZP;
    let mut width = None;
    let mut height = None;
    let mut components = Vec::new();

    let mut current_kind: Option<String> = None;
    let mut current_params: Vec<ParameterSpec> = Vec::new();

    let flush = |kind: &mut Option<String>, params: &mut Vec<ParameterSpec>, out: &mut Vec<ComponentDescriptor>| -> Result<()> {
        if let Some(kind) = kind.take() {
            let expected = ComponentKind::n_params_for(&kind)
                .with_context(|| format!("unknown component kind '{kind}'"))?;
            if params.len() != expected {
                bail!(
                    "component '{kind}' expects {expected} parameters, got {}",
                    params.len()
                );
            }
            out.push(ComponentDescriptor {
                kind,
                params: std::mem::take(params),
            });
        }
        Ok(())
    };

    for (lineno, raw_line) in text.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let head = tokens.next().unwrap();

        if head.eq_ignore_ascii_case("ZP") {
            zp = parse_f64(&mut tokens, lineno)?;
        } else if head.eq_ignore_ascii_case("GEOMETRY") {
            width = Some(parse_usize(&mut tokens, lineno)?);
            height = Some(parse_usize(&mut tokens, lineno)?);
        } else if head.eq_ignore_ascii_case("FUNCTION") {
            flush(&mut current_kind, &mut current_params, &mut components)?;
            let name = tokens
                .next()
                .with_context(|| format!("line {}: FUNCTION requires a component name", lineno + 1))?;
            current_kind = Some(name.to_string());
        } else {
            let kind = current_kind
                .as_deref()
                .with_context(|| format!("line {}: parameter line outside any FUNCTION block", lineno + 1))?;
            let labels = ComponentKind::labels_for(kind)
                .with_context(|| format!("unknown component kind '{kind}'"))?;
            if !labels.iter().any(|l| l.eq_ignore_ascii_case(head)) {
                bail!(
                    "line {}: '{head}' is not a valid parameter for {kind} (expected one of {labels:?})",
                    lineno + 1
                );
            }
            let value = parse_f64(&mut tokens, lineno)?;
            let spec = match (tokens.next(), tokens.next()) {
                (Some(lo), Some(hi)) => ParameterSpec::bounded(
                    head.to_string(),
                    value,
                    lo.parse().with_context(|| format!("line {}: invalid lower bound", lineno + 1))?,
                    hi.parse().with_context(|| format!("line {}: invalid upper bound", lineno + 1))?,
                ),
                _ => ParameterSpec::fixed(head.to_string(), value),
            };
            current_params.push(spec);
        }
    }
    flush(&mut current_kind, &mut current_params, &mut components)?;

    if components.is_empty() {
        bail!("configuration declares no FUNCTION blocks");
    }

    Ok(ParsedConfig {
        zp,
        width,
        height,
        components,
    })
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_f64(tokens: &mut std::str::SplitWhitespace<'_>, lineno: usize) -> Result<f64> {
    tokens
        .next()
        .with_context(|| format!("line {}: missing value", lineno + 1))?
        .parse()
        .with_context(|| format!("line {}: invalid numeric value", lineno + 1))
}

fn parse_usize(tokens: &mut std::str::SplitWhitespace<'_>, lineno: usize) -> Result<usize> {
    tokens
        .next()
        .with_context(|| format!("line {}: missing value", lineno + 1))?
        .parse()
        .with_context(|| format!("line {}: invalid integer value", lineno + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
ZP 25.0
GEOMETRY 128 128

FUNCTION Sersic
X0   64.0
Y0   64.0
PA   30.0   0.0   180.0
ELL  0.3    0.0   0.9
N    2.0    0.3   8.0
I_E  50.0
R_E  12.0

FUNCTION FlatSky
I0   5.0
";

    #[test]
    fn parses_sample_config() {
        let parsed = parse(SAMPLE).unwrap();
        assert_eq!(parsed.zp, 25.0);
        assert_eq!(parsed.width, Some(128));
        assert_eq!(parsed.height, Some(128));
        assert_eq!(parsed.components.len(), 2);
        assert_eq!(parsed.components[0].kind, "Sersic");
        assert_eq!(parsed.components[0].params.len(), 7);
        assert_eq!(parsed.components[1].kind, "FlatSky");
    }

    #[test]
    fn rejects_unknown_parameter_label() {
        let text = "FUNCTION FlatSky\nBOGUS 1.0\n";
        assert!(parse(text).is_err());
    }

    #[test]
    fn rejects_wrong_parameter_count() {
        let text = "FUNCTION FlatSky\nI0 1.0\nI0 2.0\n";
        assert!(parse(text).is_err());
    }

    #[test]
    fn rejects_parameter_line_before_any_function_block() {
        assert!(parse("X0 1.0\n").is_err());
    }

    #[test]
    fn defaults_zp_when_absent() {
        let text = "FUNCTION FlatSky\nI0 1.0\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.zp, sbmodel_core::consts::DEFAULT_ZP);
        assert!(parsed.width.is_none());
    }
}
