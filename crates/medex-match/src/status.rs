//! Status classification: places a numeric value against a resolved
//! reference range, plus critical-value flags.

use medex_model::{Flag, ParameterDef, RangeSpec, Status};

/// Classifies `value` against `range`.
///
/// For a plain interval: below min is LOW, above max is HIGH, boundary
/// values are NORMAL; with neither bound present the result is UNKNOWN.
/// For banded ranges the first band (lexical key order) containing the
/// value decides, by band name: `high`/`elevated` means HIGH, `low` means
/// LOW, anything else NORMAL; no containing band means UNKNOWN.
pub fn classify(value: f64, range: &RangeSpec) -> Status {
    match range {
        RangeSpec::Bounds(bounds) => {
            if bounds.min.is_none() && bounds.max.is_none() {
                return Status::Unknown;
            }
            if let Some(min) = bounds.min
                && value < min
            {
                return Status::Low;
            }
            if let Some(max) = bounds.max
                && value > max
            {
                return Status::High;
            }
            Status::Normal
        }
        RangeSpec::Bands(bands) => {
            for (name, bounds) in bands {
                if bounds.contains(value) {
                    let name = name.to_lowercase();
                    return if name.contains("high") || name.contains("elevated") {
                        Status::High
                    } else if name.contains("low") {
                        Status::Low
                    } else {
                        Status::Normal
                    };
                }
            }
            Status::Unknown
        }
    }
}

/// Critical-value flags, independent of [`classify`]: a value can be HIGH
/// and also CRITICAL_HIGH.
pub fn critical_flags(value: f64, param: &ParameterDef) -> Vec<Flag> {
    let mut flags = Vec::new();
    if let Some(low) = param.critical_values.low
        && value < low
    {
        flags.push(Flag::CriticalLow);
    }
    if let Some(high) = param.critical_values.high
        && value > high
    {
        flags.push(Flag::CriticalHigh);
    }
    flags
}
