//! Parameter-based mapping: free-form name/value pairs onto a template's
//! canonical parameters, with range resolution, status classification and
//! formula derivation.

use std::collections::BTreeMap;

use serde::Serialize;

use medex_formula::fill_missing;
use medex_match::{Gender, classify, critical_flags, match_best, resolve};
use medex_model::{
    Completeness, DocumentData, ExtractedField, ExtractionType, FreeformExtraction,
    MappedParameter, MappedSection, ParamValue, ParameterDef, RangeBounds, RangeSpec,
    ReferenceSource, Status, StructuredDocument, Template, TestResults,
};
use medex_templates::TemplateRepository;

use crate::document::map_document;
use crate::error::ExtractError;
use crate::payload::PayloadError;

/// Mapping result, shaped by the template's extraction type.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MappedDocument {
    Parameters(Box<StructuredDocument>),
    Document(DocumentData),
}

/// Maps parsed payloads onto templates from a shared catalog.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionMapper<'a> {
    repository: &'a TemplateRepository,
}

impl<'a> ExtractionMapper<'a> {
    pub fn new(repository: &'a TemplateRepository) -> Self {
        Self { repository }
    }

    /// Maps `payload` with the template indexed under `key`, dispatching on
    /// the template's extraction type.
    pub fn map_by_key(
        &self,
        key: &str,
        payload: &serde_json::Value,
    ) -> Result<MappedDocument, ExtractError> {
        let template = self.repository.by_classification_key(key).ok_or_else(|| {
            ExtractError::UnrecognizedDocument {
                key: key.to_string(),
            }
        })?;
        match template.extraction_type {
            ExtractionType::ParameterBased => {
                let extraction: FreeformExtraction = serde_json::from_value(payload.clone())
                    .map_err(PayloadError::InvalidJson)?;
                Ok(MappedDocument::Parameters(Box::new(map_parameters(
                    &extraction,
                    template,
                ))))
            }
            ExtractionType::DocumentBased => {
                Ok(MappedDocument::Document(map_document(payload, template)))
            }
        }
    }
}

/// Maps a free-form extraction onto a PARAMETER_BASED template.
///
/// Mapping is lossless about failure: fields that reach no parameter are
/// surfaced in `unmatched_fields`, never silently dropped. Duplicate
/// matches keep the first non-null value; entries still null after dedup
/// are discarded so the parameter stays derivable. After mapping, template
/// formulas derive whatever parameters the extraction left missing.
pub fn map_parameters(extraction: &FreeformExtraction, template: &Template) -> StructuredDocument {
    let gender = extraction
        .metadata
        .gender
        .as_deref()
        .and_then(Gender::parse);
    let age = extraction.metadata.age_years();

    let mut sections: BTreeMap<&str, Vec<MappedParameter>> = template
        .sections
        .iter()
        .map(|section| (section.section_id.as_str(), Vec::new()))
        .collect();
    // parameterId -> sectionId of its existing entry.
    let mut placed: BTreeMap<String, String> = BTreeMap::new();
    let mut unmatched = Vec::new();

    for field in &extraction.parameters {
        let Some(found) = match_best(&field.name, template) else {
            tracing::debug!(field = %field.name, "no parameter reached the match floor");
            unmatched.push(field.name.clone());
            continue;
        };
        tracing::trace!(
            field = %field.name,
            parameter_id = %found.param.parameter_id,
            score = found.score,
            "matched field"
        );

        if let Some(section_id) = placed.get(&found.param.parameter_id) {
            // First non-null value wins; a null placeholder may be upgraded.
            if field.value.is_some()
                && let Some(entries) = sections.get_mut(section_id.as_str())
                && let Some(entry) = entries
                    .iter_mut()
                    .find(|entry| entry.parameter_id == found.param.parameter_id)
                && entry.value.is_none()
            {
                *entry = build_entry(field, found.param, gender, age);
            }
            continue;
        }

        let entry = build_entry(field, found.param, gender, age);
        if let Some(entries) = sections.get_mut(found.section_id) {
            entries.push(entry);
            placed.insert(
                found.param.parameter_id.clone(),
                found.section_id.to_string(),
            );
        }
    }

    // A placeholder that never received a value carries no information;
    // it must not occupy the slot a formula could fill.
    for entries in sections.values_mut() {
        entries.retain(|entry| entry.value.is_some());
    }
    placed.retain(|parameter_id, section_id| {
        sections.get(section_id.as_str()).is_some_and(|entries| {
            entries
                .iter()
                .any(|entry| &entry.parameter_id == parameter_id)
        })
    });

    let resolved: BTreeMap<String, f64> = sections
        .values()
        .flatten()
        .filter_map(|entry| {
            let value = entry.value.as_ref()?.as_f64()?;
            Some((entry.parameter_id.clone(), value))
        })
        .collect();
    for derived in fill_missing(&resolved, template, gender, age) {
        if placed.contains_key(&derived.parameter.parameter_id) {
            continue;
        }
        if let Some(entries) = sections.get_mut(derived.section_id.as_str()) {
            placed.insert(
                derived.parameter.parameter_id.clone(),
                derived.section_id.clone(),
            );
            entries.push(derived.parameter);
        }
    }

    let mut out_sections = Vec::new();
    for section in &template.sections {
        let entries = sections
            .remove(section.section_id.as_str())
            .unwrap_or_default();
        if !entries.is_empty() {
            out_sections.push(MappedSection {
                section_id: section.section_id.clone(),
                parameters: entries,
            });
        }
    }

    let extracted = out_sections
        .iter()
        .flat_map(|section| &section.parameters)
        .filter(|entry| entry.value.is_some())
        .count();
    let completeness = Completeness::new(extracted, template.parameter_count());
    tracing::debug!(
        template_id = %template.template_id,
        extracted,
        total = completeness.total,
        unmatched = unmatched.len(),
        "mapped parameter-based document"
    );

    StructuredDocument {
        document_metadata: extraction.metadata.clone(),
        test_results: TestResults {
            template_id: template.template_id.clone(),
            sections: out_sections,
        },
        completeness,
        unmatched_fields: unmatched,
    }
}

fn build_entry(
    field: &ExtractedField,
    param: &ParameterDef,
    gender: Option<Gender>,
    age: Option<u32>,
) -> MappedParameter {
    let (range, source) = match document_range(field) {
        Some(range) => (range, ReferenceSource::Document),
        None => (resolve(param, gender, age), ReferenceSource::Template),
    };
    let (status, flags) = match field.value.as_ref().and_then(ParamValue::as_f64) {
        Some(value) => (classify(value, &range), critical_flags(value, param)),
        None => (Status::Unknown, Vec::new()),
    };
    MappedParameter {
        parameter_id: param.parameter_id.clone(),
        value: field.value.clone(),
        unit: field.unit.clone().or_else(|| param.unit.clone()),
        reference_range: range,
        reference_source: source,
        status,
        flags,
    }
}

/// The range printed on the document itself, if any: split bounds first,
/// then a `"min-max"` text range.
fn document_range(field: &ExtractedField) -> Option<RangeSpec> {
    if field.ref_min.is_some() && field.ref_max.is_some() {
        return Some(RangeSpec::Bounds(RangeBounds {
            min: field.ref_min,
            max: field.ref_max,
        }));
    }
    let text = field.reference_range.as_deref()?;
    let (low, high) = text.trim().split_once('-')?;
    let min: f64 = low.trim().parse().ok()?;
    let max: f64 = high.trim().parse().ok()?;
    Some(RangeSpec::Bounds(RangeBounds::new(min, max)))
}
