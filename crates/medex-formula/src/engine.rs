//! Derivation of missing parameter values from template formulas.
//!
//! Two passes over a template's parameters. The forward pass evaluates
//! each unresolved parameter's own formula against the initially resolved
//! values. The reverse pass inverts formulas of the narrow shape
//! `"<OPERAND> / <constant>"` to recover the operand from an
//! already-known result.

use std::collections::BTreeMap;

use medex_match::{Gender, classify, critical_flags, resolve};
use medex_model::{
    MappedParameter, ParamValue, ParameterDef, ReferenceSource, Template,
};

use crate::expr;

/// Rounding applied to forward-derived values when the parameter does not
/// specify `decimalPlaces`.
pub const DEFAULT_FORWARD_DECIMALS: u32 = 2;
/// Rounding applied to reverse-derived values when the parameter does not
/// specify `decimalPlaces`.
pub const DEFAULT_REVERSE_DECIMALS: u32 = 0;

/// A parameter filled in by formula derivation rather than extraction.
#[derive(Debug, Clone)]
pub struct DerivedParameter {
    pub section_id: String,
    pub parameter: MappedParameter,
}

/// Derives values for template parameters absent from `resolved`.
///
/// `resolved` maps parameter id to its extracted numeric value. Derivation
/// is best-effort: a formula whose operands are not all resolved, or whose
/// evaluation fails, is skipped without failing the document. Forward
/// derivations never feed each other; reverse derivations do feed later
/// reverse derivations.
pub fn fill_missing(
    resolved: &BTreeMap<String, f64>,
    template: &Template,
    gender: Option<Gender>,
    age: Option<u32>,
) -> Vec<DerivedParameter> {
    let mut derived = Vec::new();
    let mut known = resolved.clone();

    // Forward pass: evaluate each missing parameter's own formula against
    // the extracted values only.
    for (section_id, param) in template.parameters() {
        if known.contains_key(&param.parameter_id) {
            continue;
        }
        let Some(formula) = param.formula.as_deref() else {
            continue;
        };
        let operands = match expr::identifiers(formula) {
            Ok(operands) => operands,
            Err(error) => {
                tracing::debug!(
                    parameter_id = %param.parameter_id,
                    formula,
                    %error,
                    "unparseable formula, skipping"
                );
                continue;
            }
        };
        if let Some(missing) = operands.iter().find(|id| !resolved.contains_key(id.as_str())) {
            tracing::debug!(
                parameter_id = %param.parameter_id,
                formula,
                missing = %missing,
                "formula operand unresolved, skipping"
            );
            continue;
        }
        match expr::evaluate(formula, resolved) {
            Ok(value) => {
                let value = round_to(
                    value,
                    param.decimal_places.unwrap_or(DEFAULT_FORWARD_DECIMALS),
                );
                tracing::debug!(
                    parameter_id = %param.parameter_id,
                    formula,
                    value,
                    "derived parameter from formula"
                );
                known.insert(param.parameter_id.clone(), value);
                derived.push(mapped(section_id, param, value, gender, age));
            }
            Err(error) => {
                tracing::debug!(
                    parameter_id = %param.parameter_id,
                    formula,
                    %error,
                    "formula not derivable, skipping"
                );
            }
        }
    }

    // Reverse pass: `Q = P / k` with Q known and P missing gives
    // `P = Q * k`. Reverse-derived values may seed further reversals.
    for (section_id, param) in template.parameters() {
        let Some((operand_id, divisor)) = invertible_division(param) else {
            continue;
        };
        if known.contains_key(&operand_id) {
            continue;
        }
        let Some(quotient) = known.get(&param.parameter_id) else {
            continue;
        };
        let Some((operand_section, operand_def)) = template
            .parameters()
            .find(|(_, candidate)| candidate.parameter_id == operand_id)
        else {
            continue;
        };
        let value = round_to(
            quotient * divisor,
            operand_def
                .decimal_places
                .unwrap_or(DEFAULT_REVERSE_DECIMALS),
        );
        tracing::debug!(
            parameter_id = %operand_id,
            from = %param.parameter_id,
            value,
            "reverse-derived parameter"
        );
        known.insert(operand_id, value);
        derived.push(mapped(operand_section, operand_def, value, gender, age));
    }

    derived
}

/// Recognizes the only formula shape the reverse pass can invert:
/// exactly `"<OPERAND> / <constant>"`.
fn invertible_division(param: &ParameterDef) -> Option<(String, f64)> {
    let formula = param.formula.as_deref()?;
    let mut parts = formula.split(" / ");
    let operand = parts.next()?.trim();
    let divisor: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || operand.is_empty() || divisor == 0.0 {
        return None;
    }
    Some((operand.to_string(), divisor))
}

fn mapped(
    section_id: &str,
    param: &ParameterDef,
    value: f64,
    gender: Option<Gender>,
    age: Option<u32>,
) -> DerivedParameter {
    let range = resolve(param, gender, age);
    let status = classify(value, &range);
    let flags = critical_flags(value, param);
    DerivedParameter {
        section_id: section_id.to_string(),
        parameter: MappedParameter {
            parameter_id: param.parameter_id.clone(),
            value: Some(ParamValue::Num(value)),
            unit: param.unit.clone(),
            reference_range: range,
            reference_source: ReferenceSource::Template,
            status,
            flags,
        },
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
