//! Parameter matching: scores a free-form extracted field name against
//! canonical parameter definitions.
//!
//! Scores are integers in `[0, 1000]`: an exact match against the
//! parameter id, display name or any alias scores 1000; otherwise token
//! overlap scores `500 + round(ratio * 100) + 10 * |overlap|` where
//! `ratio = |overlap| / max(|extracted|, |candidate|)`. Anything below 500
//! is no match.

use std::collections::BTreeSet;

use medex_model::{ParameterDef, Template};

/// Score for an exact id/display-name/alias match.
pub const EXACT_MATCH_SCORE: u32 = 1000;
/// Minimum score for a match to count at all.
pub const MATCH_FLOOR: u32 = 500;

/// Best-scoring parameter for one extracted name, with its section.
#[derive(Debug, Clone)]
pub struct ParameterMatch<'a> {
    pub param: &'a ParameterDef,
    pub section_id: &'a str,
    pub score: u32,
}

/// Splits a name into its word set: separators are whitespace,
/// underscores, hyphens and parentheses; tokens are upper-cased.
pub fn token_set(raw: &str) -> BTreeSet<String> {
    raw.to_uppercase()
        .split(|ch: char| ch.is_whitespace() || matches!(ch, '_' | '-' | '(' | ')'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Scores one extracted name against one parameter definition.
///
/// Pure: identical inputs always yield the identical result.
pub fn score(extracted_name: &str, param: &ParameterDef) -> u32 {
    let extracted = extracted_name.trim().to_uppercase();
    if extracted.is_empty() {
        return 0;
    }

    if extracted == param.parameter_id.trim().to_uppercase()
        || extracted == param.display_name.trim().to_uppercase()
        || param
            .aliases
            .iter()
            .any(|alias| extracted == alias.trim().to_uppercase())
    {
        return EXACT_MATCH_SCORE;
    }

    let extracted_tokens = token_set(&extracted);
    let mut best = 0;
    best = best.max(overlap_score(&extracted_tokens, &token_set(&param.parameter_id)));
    best = best.max(overlap_score(&extracted_tokens, &token_set(&param.display_name)));
    for alias in &param.aliases {
        best = best.max(overlap_score(&extracted_tokens, &token_set(alias)));
    }
    best
}

fn overlap_score(extracted: &BTreeSet<String>, candidate: &BTreeSet<String>) -> u32 {
    let common = extracted.intersection(candidate).count();
    if common == 0 {
        return 0;
    }
    let ratio = common as f64 / extracted.len().max(candidate.len()) as f64;
    MATCH_FLOOR + (ratio * 100.0).round() as u32 + 10 * common as u32
}

/// Global best match across every section of the template.
///
/// Cross-section matches are permitted by design: a name may legitimately
/// score highest against a parameter in an unrelated section. Score ties
/// keep the lexically smallest `parameterId`.
pub fn match_best<'a>(extracted_name: &str, template: &'a Template) -> Option<ParameterMatch<'a>> {
    let mut best: Option<ParameterMatch<'a>> = None;
    for (section_id, param) in template.parameters() {
        let candidate_score = score(extracted_name, param);
        let better = match &best {
            None => true,
            Some(current) => {
                candidate_score > current.score
                    || (candidate_score == current.score
                        && param.parameter_id < current.param.parameter_id)
            }
        };
        if better {
            best = Some(ParameterMatch {
                param,
                section_id,
                score: candidate_score,
            });
        }
    }
    best.filter(|found| found.score >= MATCH_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(id: &str, display: &str, aliases: &[&str]) -> ParameterDef {
        serde_json::from_value(serde_json::json!({
            "parameterId": id,
            "displayName": display,
            "aliases": aliases,
        }))
        .expect("parameter fixture")
    }

    #[test]
    fn token_set_splits_on_all_separators() {
        let tokens = token_set("Total_Leucocyte-Count (TLC)");
        let expected: BTreeSet<String> = ["TOTAL", "LEUCOCYTE", "COUNT", "TLC"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn exact_matches_score_1000() {
        let hb = param("HEMOGLOBIN", "Hemoglobin", &["HB", "HGB"]);
        assert_eq!(score("hemoglobin", &hb), EXACT_MATCH_SCORE);
        assert_eq!(score("  HB ", &hb), EXACT_MATCH_SCORE);
        assert_eq!(score("Hemoglobin", &hb), EXACT_MATCH_SCORE);
    }

    #[test]
    fn overlap_score_matches_formula() {
        let wbc = param("WBC_COUNT", "Total Leucocyte Count", &["TLC"]);
        // "WBC" vs "WBC_COUNT": overlap 1 of max(1, 2) -> 500 + 50 + 10.
        assert_eq!(score("WBC", &wbc), 560);
        // Full token agreement with the display name: 500 + 100 + 30.
        assert_eq!(score("COUNT LEUCOCYTE TOTAL", &wbc), 630);
    }

    #[test]
    fn zero_overlap_scores_zero() {
        let wbc = param("WBC_COUNT", "Total Leucocyte Count", &["TLC"]);
        assert_eq!(score("FERRITIN", &wbc), 0);
    }
}
