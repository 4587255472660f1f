//! Output shapes: mapped parameters, structured documents and completeness
//! summaries. These are the engine's final, immutable products.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extraction::DocumentMetadata;
use crate::template::RangeSpec;

/// A measured value: numeric where possible, free text otherwise
/// (e.g. `"POSITIVE"` for a serology result).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Num(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value; text values that parse as numbers count.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(value) => Some(*value),
            Self::Text(raw) => raw.trim().parse().ok(),
        }
    }
}

/// Clinical status of a value relative to its reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Normal,
    High,
    Low,
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::Low => "LOW",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Urgency flags, independent of [`Status`]: a value can be HIGH and also
/// CRITICAL_HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Flag {
    CriticalLow,
    CriticalHigh,
}

/// Where a mapped parameter's reference range came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSource {
    /// Printed on the document itself.
    Document,
    /// Resolved from the template's reference ranges.
    Template,
}

/// One extracted value mapped onto a canonical parameter definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedParameter {
    pub parameter_id: String,
    pub value: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub reference_range: RangeSpec,
    pub reference_source: ReferenceSource,
    pub status: Status,
    pub flags: Vec<Flag>,
}

/// A section of mapped parameters in template order of discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedSection {
    pub section_id: String,
    pub parameters: Vec<MappedParameter>,
}

/// Parameter-based mapping result body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub template_id: String,
    pub sections: Vec<MappedSection>,
}

/// Percentage of expected template fields/parameters successfully
/// populated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completeness {
    /// 0.0 to 100.0, rounded to one decimal place.
    pub completeness_score: f64,
    pub extracted: usize,
    pub total: usize,
}

impl Completeness {
    pub fn new(extracted: usize, total: usize) -> Self {
        let score = if total == 0 {
            0.0
        } else {
            extracted as f64 / total as f64 * 100.0
        };
        Self {
            completeness_score: (score * 10.0).round() / 10.0,
            extracted,
            total,
        }
    }
}

/// Final structured output for a PARAMETER_BASED template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredDocument {
    pub document_metadata: DocumentMetadata,
    pub test_results: TestResults,
    pub completeness: Completeness,
    /// Extracted field names that failed to reach the match floor against
    /// any parameter. Non-fatal; surfaced so data loss is visible.
    pub unmatched_fields: Vec<String>,
}

/// Final structured output for a DOCUMENT_BASED template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentData {
    pub document_type: String,
    pub template_id: String,
    /// Section id to extracted value: an array of records for list
    /// sections, a field map for scalar sections.
    pub extracted_data: BTreeMap<String, serde_json::Value>,
    pub completeness: Completeness,
}
