//! Reference range resolution: picks the single applicable range variant
//! for a parameter given optional patient gender and age.

use medex_model::{ParameterDef, RangeSpec};

/// Patient gender as used by range variant keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parses `"M"`/`"F"` or the full words, case-insensitively.
    /// Anything else is treated as unspecified.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "M" | "MALE" => Some(Self::Male),
            "F" | "FEMALE" => Some(Self::Female),
            _ => None,
        }
    }

    fn range_key(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Resolves the applicable range. Priority: gender-specific entry, then an
/// age bracket `child_<min>_<max>` containing `age` (inclusive, lexical
/// key order), then `default`, then the empty range. Exactly one variant
/// is returned; variants are never merged.
pub fn resolve(param: &ParameterDef, gender: Option<Gender>, age: Option<u32>) -> RangeSpec {
    let ranges = &param.reference_ranges;

    if let Some(gender) = gender
        && let Some(range) = ranges.get(gender.range_key())
    {
        return range.clone();
    }

    if let Some(age) = age {
        for (key, range) in ranges {
            if let Some((min_age, max_age)) = parse_child_bracket(key)
                && min_age <= age
                && age <= max_age
            {
                return range.clone();
            }
        }
    }

    ranges
        .get("default")
        .cloned()
        .unwrap_or_else(RangeSpec::empty)
}

/// `"child_1_5"` -> `(1, 5)`.
fn parse_child_bracket(key: &str) -> Option<(u32, u32)> {
    if !key.to_lowercase().contains("child") {
        return None;
    }
    let mut parts = key.split('_');
    parts.next()?;
    let min_age = parts.next()?.parse().ok()?;
    let max_age = parts.next()?.parse().ok()?;
    Some((min_age, max_age))
}
