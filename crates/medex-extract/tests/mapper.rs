use serde_json::json;

use medex_extract::{ExtractError, ExtractionMapper, MappedDocument, map_parameters};
use medex_model::{
    FreeformExtraction, ParamValue, RangeBounds, RangeSpec, ReferenceSource, Status, Template,
};
use medex_templates::{TemplateRepository, TemplateSource};

fn cbc_template() -> serde_json::Value {
    json!({
        "templateId": "cbc_v1",
        "testType": "COMPLETE_BLOOD_COUNT",
        "displayName": "Complete Blood Count (CBC)",
        "sections": [{
            "sectionId": "hematology",
            "parameters": [
                {
                    "parameterId": "HEMOGLOBIN",
                    "displayName": "Hemoglobin",
                    "aliases": ["HB", "HGB", "HAEMOGLOBIN"],
                    "unit": "g/dL",
                    "referenceRanges": {
                        "male": { "min": 13.0, "max": 17.0 },
                        "female": { "min": 12.0, "max": 15.5 },
                        "default": { "min": 12.0, "max": 17.0 }
                    }
                },
                {
                    "parameterId": "WBC_COUNT",
                    "displayName": "Total Leucocyte Count",
                    "aliases": ["TLC", "WBC"],
                    "unit": "10^3/uL",
                    "referenceRanges": { "default": { "min": 4.0, "max": 11.0 } },
                    "criticalValues": { "low": 1.0, "high": 30.0 }
                },
                {
                    "parameterId": "PLATELET_COUNT",
                    "displayName": "Platelet Count",
                    "aliases": ["PLT"],
                    "unit": "10^3/uL",
                    "referenceRanges": { "default": { "min": 150.0, "max": 450.0 } }
                }
            ]
        }]
    })
}

fn lipid_template() -> serde_json::Value {
    json!({
        "templateId": "lipid_v1",
        "testType": "LIPID_PROFILE",
        "displayName": "Lipid Profile",
        "sections": [{
            "sectionId": "lipids",
            "parameters": [
                { "parameterId": "TRIGLYCERIDES", "displayName": "Triglycerides",
                  "unit": "mg/dL",
                  "referenceRanges": { "default": { "min": 0.0, "max": 150.0 } } },
                { "parameterId": "HDL", "displayName": "HDL Cholesterol", "unit": "mg/dL" },
                { "parameterId": "LDL", "displayName": "LDL Cholesterol", "unit": "mg/dL" },
                { "parameterId": "VLDL", "displayName": "VLDL Cholesterol",
                  "unit": "mg/dL",
                  "referenceRanges": { "default": { "min": 5.0, "max": 40.0 } },
                  "formula": "TRIGLYCERIDES / 5" }
            ]
        }]
    })
}

fn catalog() -> TemplateRepository {
    TemplateRepository::load(vec![
        TemplateSource::new("cbc.json", cbc_template()),
        TemplateSource::new("lipid.json", lipid_template()),
    ])
    .expect("catalog")
}

fn template(repo: &TemplateRepository, id: &str) -> Template {
    repo.by_id(id).expect("template").clone()
}

fn extraction(value: serde_json::Value) -> FreeformExtraction {
    serde_json::from_value(value).expect("extraction fixture")
}

#[test]
fn maps_cbc_report_end_to_end() {
    let repo = catalog();
    let cbc = template(&repo, "cbc_v1");
    let payload = extraction(json!({
        "metadata": { "patientName": "R. Sharma", "age": "34 Y", "gender": "M" },
        "parameters": [
            { "name": "HAEMOGLOBIN", "value": 13.5, "unit": "g/dL",
              "refMin": 13.0, "refMax": 17.0 },
            { "name": "TLC", "value": 11.2 },
            { "name": "LOREM IPSUM", "value": 1.0 }
        ]
    }));

    let doc = map_parameters(&payload, &cbc);
    assert_eq!(doc.test_results.template_id, "cbc_v1");
    assert_eq!(doc.unmatched_fields, vec!["LOREM IPSUM".to_string()]);
    assert_eq!(doc.test_results.sections.len(), 1);
    let section = &doc.test_results.sections[0];
    assert_eq!(section.section_id, "hematology");

    let hb = &section.parameters[0];
    assert_eq!(hb.parameter_id, "HEMOGLOBIN");
    assert_eq!(hb.value, Some(ParamValue::Num(13.5)));
    // Range printed on the document wins over the template's.
    assert_eq!(hb.reference_source, ReferenceSource::Document);
    assert_eq!(
        hb.reference_range,
        RangeSpec::Bounds(RangeBounds::new(13.0, 17.0))
    );
    assert_eq!(hb.status, Status::Normal);

    let wbc = &section.parameters[1];
    assert_eq!(wbc.parameter_id, "WBC_COUNT");
    assert_eq!(wbc.reference_source, ReferenceSource::Template);
    assert_eq!(wbc.status, Status::High);
    assert!(wbc.flags.is_empty());
    // Unit falls back to the template when the field carries none.
    assert_eq!(wbc.unit.as_deref(), Some("10^3/uL"));

    // 2 of 3 parameters extracted.
    assert_eq!(doc.completeness.extracted, 2);
    assert_eq!(doc.completeness.total, 3);
    assert_eq!(doc.completeness.completeness_score, 66.7);
}

#[test]
fn gender_selects_the_reference_range_variant() {
    let repo = catalog();
    let cbc = template(&repo, "cbc_v1");
    let payload = extraction(json!({
        "metadata": { "gender": "FEMALE" },
        "parameters": [{ "name": "HB", "value": 12.5 }]
    }));

    let doc = map_parameters(&payload, &cbc);
    let hb = &doc.test_results.sections[0].parameters[0];
    assert_eq!(
        hb.reference_range,
        RangeSpec::Bounds(RangeBounds::new(12.0, 15.5))
    );
    assert_eq!(hb.status, Status::Normal);
}

#[test]
fn non_numeric_values_carry_unknown_status() {
    let repo = catalog();
    let cbc = template(&repo, "cbc_v1");
    let payload = extraction(json!({
        "parameters": [{ "name": "PLT", "value": "CLUMPED" }]
    }));

    let doc = map_parameters(&payload, &cbc);
    let plt = &doc.test_results.sections[0].parameters[0];
    assert_eq!(plt.value, Some(ParamValue::Text("CLUMPED".to_string())));
    assert_eq!(plt.status, Status::Unknown);
    assert!(plt.flags.is_empty());
}

#[test]
fn formula_fills_missing_vldl() {
    let repo = catalog();
    let lipid = template(&repo, "lipid_v1");
    let payload = extraction(json!({
        "parameters": [
            { "name": "TRIGLYCERIDES", "value": 150.0 },
            { "name": "HDL CHOLESTEROL", "value": 40.0 },
            { "name": "LDL CHOLESTEROL", "value": 100.0 }
        ]
    }));

    let doc = map_parameters(&payload, &lipid);
    let section = &doc.test_results.sections[0];
    let vldl = section
        .parameters
        .iter()
        .find(|p| p.parameter_id == "VLDL")
        .expect("VLDL derived");
    assert_eq!(vldl.value, Some(ParamValue::Num(30.0)));
    assert_eq!(vldl.reference_source, ReferenceSource::Template);
    assert_eq!(vldl.status, Status::Normal);

    // Derived parameters count toward completeness.
    assert_eq!(doc.completeness.extracted, 4);
    assert_eq!(doc.completeness.total, 4);
    assert_eq!(doc.completeness.completeness_score, 100.0);
}

#[test]
fn duplicate_matches_keep_the_first_non_null_value() {
    let repo = catalog();
    let cbc = template(&repo, "cbc_v1");

    // First non-null wins over a later value.
    let payload = extraction(json!({
        "parameters": [
            { "name": "HB", "value": 13.0 },
            { "name": "HGB", "value": 14.0 }
        ]
    }));
    let doc = map_parameters(&payload, &cbc);
    let section = &doc.test_results.sections[0];
    assert_eq!(section.parameters.len(), 1);
    assert_eq!(section.parameters[0].value, Some(ParamValue::Num(13.0)));

    // A null placeholder is upgraded by a later value.
    let payload = extraction(json!({
        "parameters": [
            { "name": "HB" },
            { "name": "HGB", "value": 14.0 }
        ]
    }));
    let doc = map_parameters(&payload, &cbc);
    let section = &doc.test_results.sections[0];
    assert_eq!(section.parameters.len(), 1);
    assert_eq!(section.parameters[0].value, Some(ParamValue::Num(14.0)));
}

#[test]
fn null_matched_field_does_not_block_formula_derivation() {
    let repo = catalog();
    let lipid = template(&repo, "lipid_v1");
    let payload = extraction(json!({
        "parameters": [
            { "name": "VLDL" },
            { "name": "TRIGLYCERIDES", "value": 150.0 }
        ]
    }));

    let doc = map_parameters(&payload, &lipid);
    let section = &doc.test_results.sections[0];
    let vldl: Vec<_> = section
        .parameters
        .iter()
        .filter(|p| p.parameter_id == "VLDL")
        .collect();
    assert_eq!(vldl.len(), 1);
    assert_eq!(vldl[0].value, Some(ParamValue::Num(30.0)));
    assert_eq!(vldl[0].reference_source, ReferenceSource::Template);
}

#[test]
fn null_only_matches_leave_no_entry_behind() {
    let repo = catalog();
    let cbc = template(&repo, "cbc_v1");
    let payload = extraction(json!({
        "parameters": [{ "name": "PLT" }]
    }));

    let doc = map_parameters(&payload, &cbc);
    assert!(doc.test_results.sections.is_empty());
    assert!(doc.unmatched_fields.is_empty());
    assert_eq!(doc.completeness.extracted, 0);
}

#[test]
fn critical_values_flag_independently_of_status() {
    let repo = catalog();
    let cbc = template(&repo, "cbc_v1");
    let payload = extraction(json!({
        "parameters": [{ "name": "WBC", "value": 35.0 }]
    }));

    let doc = map_parameters(&payload, &cbc);
    let wbc = &doc.test_results.sections[0].parameters[0];
    assert_eq!(wbc.status, Status::High);
    assert_eq!(
        wbc.flags,
        vec![medex_model::Flag::CriticalHigh]
    );
}

#[test]
fn mapping_is_deterministic() {
    let repo = catalog();
    let lipid = template(&repo, "lipid_v1");
    let payload = extraction(json!({
        "metadata": { "patientName": "A", "age": 40, "gender": "F" },
        "parameters": [
            { "name": "TRIGLYCERIDES", "value": 120.0 },
            { "name": "HDL", "value": 50.0 },
            { "name": "SOMETHING ODD", "value": 1.0 }
        ]
    }));

    let first = serde_json::to_string(&map_parameters(&payload, &lipid)).expect("serialize");
    let second = serde_json::to_string(&map_parameters(&payload, &lipid)).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn mapper_dispatches_by_classification_key() {
    let repo = catalog();
    let mapper = ExtractionMapper::new(&repo);

    let payload = json!({
        "parameters": [{ "name": "HB", "value": 13.5 }]
    });
    let mapped = mapper
        .map_by_key("COMPLETE_BLOOD_COUNT", &payload)
        .expect("mapped");
    match mapped {
        MappedDocument::Parameters(doc) => {
            assert_eq!(doc.test_results.template_id, "cbc_v1");
        }
        MappedDocument::Document(_) => panic!("expected parameter-based output"),
    }

    let err = mapper
        .map_by_key("BONE_DENSITY", &payload)
        .expect_err("unknown key");
    assert!(matches!(
        err,
        ExtractError::UnrecognizedDocument { key } if key == "BONE_DENSITY"
    ));
}
