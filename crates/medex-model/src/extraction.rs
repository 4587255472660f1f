//! Free-form extraction payload: unconstrained name/value pairs produced by
//! the external LLM collaborator, prior to template mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mapped::ParamValue;

/// The payload the LLM collaborator returns for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeformExtraction {
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub parameters: Vec<ExtractedField>,
}

/// Patient and report metadata carried through to the structured output.
///
/// Only gender and age participate in mapping (reference range selection);
/// everything else passes through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    /// Age as reported, e.g. `"34"`, `"34 Y"` or a bare number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<ParamValue>,
    /// `"M"`/`"F"` or the full words.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    /// Patient age in whole years, parsed from the leading digits of the
    /// reported value.
    pub fn age_years(&self) -> Option<u32> {
        match self.age.as_ref()? {
            ParamValue::Num(value) if *value >= 0.0 => Some(*value as u32),
            ParamValue::Num(_) => None,
            ParamValue::Text(raw) => {
                let digits: String = raw
                    .trim()
                    .chars()
                    .take_while(|ch| ch.is_ascii_digit())
                    .collect();
                digits.parse().ok()
            }
        }
    }
}

/// One raw name/value pair from the free-form extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Lower reference bound as printed on the document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_max: Option<f64>,
    /// Free-text range such as `"13.0-17.0"`, used when the split bounds
    /// are absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_years_parses_text_and_numbers() {
        let mut metadata = DocumentMetadata::default();
        assert_eq!(metadata.age_years(), None);

        metadata.age = Some(ParamValue::Text("34 Y".to_string()));
        assert_eq!(metadata.age_years(), Some(34));

        metadata.age = Some(ParamValue::Num(7.0));
        assert_eq!(metadata.age_years(), Some(7));

        metadata.age = Some(ParamValue::Text("unknown".to_string()));
        assert_eq!(metadata.age_years(), None);
    }

    #[test]
    fn payload_decodes_llm_shape() {
        let payload: FreeformExtraction = serde_json::from_value(serde_json::json!({
            "metadata": { "patientName": "A B", "age": "34", "gender": "M", "uhid": "X1" },
            "parameters": [
                { "name": "HEMOGLOBIN", "value": 13.5, "unit": "g/dL",
                  "refMin": 13.0, "refMax": 17.0 }
            ]
        }))
        .expect("payload decode");
        assert_eq!(payload.parameters.len(), 1);
        assert_eq!(payload.metadata.age_years(), Some(34));
        assert!(payload.metadata.extra.contains_key("uhid"));
    }
}
