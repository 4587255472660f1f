//! Canonical template schema: document templates, sections and parameter
//! definitions loaded from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a template's content is extracted and shaped on output.
///
/// Lab reports are a flat list of measured parameters; clinical and
/// financial documents (prescriptions, bills, certificates) are arbitrary
/// structured sections and lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionType {
    /// Flat list of measured parameters (lab reports).
    ParameterBased,
    /// Structured sections and list-of-record sections.
    DocumentBased,
}

impl Default for ExtractionType {
    fn default() -> Self {
        Self::ParameterBased
    }
}

/// Template-level metadata carrying synonyms used for classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    /// Known synonym strings for the whole document type (e.g. "HEMOGRAM"
    /// for a CBC template). Distinct from per-parameter aliases.
    #[serde(default)]
    pub common_aliases: Vec<String>,
}

/// Canonical schema describing one document/test type's expected sections
/// and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Globally unique template identifier.
    pub template_id: String,
    /// Classification key for lab-test templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,
    /// Classification key for clinical/financial/diagnostic templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub extraction_type: ExtractionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub metadata: TemplateMetadata,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Template {
    /// The key this template is indexed under: `testType` for lab reports,
    /// `documentType` for everything else.
    pub fn classification_key(&self) -> Option<&str> {
        self.test_type
            .as_deref()
            .or(self.document_type.as_deref())
            .filter(|key| !key.is_empty())
    }

    /// Category string used as a weak classification signal
    /// (`category` for document templates, `department` for lab reports).
    pub fn category_label(&self) -> Option<&str> {
        self.category
            .as_deref()
            .or(self.department.as_deref())
            .filter(|label| !label.is_empty())
    }

    /// Iterates every parameter definition across all sections, paired with
    /// its section id.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &ParameterDef)> {
        self.sections.iter().flat_map(|section| {
            section
                .parameters
                .iter()
                .map(move |param| (section.section_id.as_str(), param))
        })
    }

    /// Total number of parameter definitions across all sections.
    pub fn parameter_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.parameters.len())
            .sum()
    }
}

/// Named group of parameters (or list items) within a template.
///
/// Parameter-based templates fill `parameters`; document-based templates use
/// either `fields` (scalar section) or `is_list` + `item_schema`
/// (list-of-records section such as medications or bill charges).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub section_id: String,
    #[serde(default)]
    pub section_name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_schema: Option<ItemSchema>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub required: bool,
}

/// Record shape for one item of a list section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSchema {
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// A scalar field of a document-based section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// A single measurable field with canonical id, synonyms, unit, reference
/// ranges and an optional derivation formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDef {
    /// Canonical key, unique within its template.
    pub parameter_id: String,
    #[serde(default)]
    pub display_name: String,
    /// Known synonym strings, in priority order.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Variant key (`default`, `male`, `female`, `child_<min>_<max>`) to
    /// the applicable range.
    #[serde(default)]
    pub reference_ranges: BTreeMap<String, RangeSpec>,
    #[serde(default)]
    pub critical_values: CriticalValues,
    /// Arithmetic expression over other `parameterId`s deriving this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
}

/// Thresholds beyond which a value is flagged urgently, independent of
/// normal/high/low status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
}

/// A reference range: either a plain min/max interval or a map of named
/// bands (e.g. desirable/borderline/high), each an independent interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeSpec {
    Bounds(RangeBounds),
    Bands(BTreeMap<String, RangeBounds>),
}

impl RangeSpec {
    /// Range signalling "unknown" downstream.
    pub fn empty() -> Self {
        Self::Bounds(RangeBounds::default())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bounds(bounds) => bounds.min.is_none() && bounds.max.is_none(),
            Self::Bands(bands) => bands.is_empty(),
        }
    }
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self::empty()
    }
}

/// A numeric interval; either bound may be open.
// deny_unknown_fields keeps the untagged RangeSpec decode unambiguous: a
// bands map must not parse as an all-defaulted Bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RangeBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// True when `value` falls inside the interval, treating an open bound
    /// as unbounded on that side. Boundaries are inclusive.
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}
