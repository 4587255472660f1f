//! Document-based mapping: structured payload sections copied through the
//! template's section schema, with required-field completeness.

use serde_json::Value;

use medex_model::{Completeness, DocumentData, Template};

/// Maps a structured payload onto a DOCUMENT_BASED template.
///
/// Sections pass through 1:1 by `sectionId`: list sections keep their
/// record arrays verbatim, scalar sections keep the fields the schema
/// declares. Completeness counts required items only; a required list
/// section counts as one item, present when non-empty.
pub fn map_document(payload: &Value, template: &Template) -> DocumentData {
    let body = payload.as_object();
    let mut extracted = std::collections::BTreeMap::new();
    let mut present = 0;
    let mut total = 0;

    for section in &template.sections {
        let value = body.and_then(|map| map.get(&section.section_id));
        if section.is_list {
            let items = value
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if section.required {
                total += 1;
                if !items.is_empty() {
                    present += 1;
                }
            }
            if !items.is_empty() {
                extracted.insert(section.section_id.clone(), Value::Array(items));
            }
        } else {
            let fields_in = value.and_then(Value::as_object);
            let mut out = serde_json::Map::new();
            for field in &section.fields {
                let field_value = fields_in
                    .and_then(|map| map.get(&field.field_id))
                    .filter(|v| !v.is_null());
                if field.required {
                    total += 1;
                    if field_value.is_some() {
                        present += 1;
                    }
                }
                if let Some(v) = field_value {
                    out.insert(field.field_id.clone(), v.clone());
                }
            }
            if !out.is_empty() {
                extracted.insert(section.section_id.clone(), Value::Object(out));
            }
        }
    }

    let completeness = Completeness::new(present, total);
    tracing::debug!(
        template_id = %template.template_id,
        sections = extracted.len(),
        present,
        total,
        "mapped document-based payload"
    );

    DocumentData {
        document_type: template
            .classification_key()
            .unwrap_or_default()
            .to_string(),
        template_id: template.template_id.clone(),
        extracted_data: extracted,
        completeness,
    }
}
