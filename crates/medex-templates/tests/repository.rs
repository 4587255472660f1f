use serde_json::json;

use medex_templates::{TemplateLoadError, TemplateRepository, TemplateSource};

fn cbc_source() -> TemplateSource {
    TemplateSource::new(
        "cbc.json",
        json!({
            "templateId": "cbc_v1",
            "testType": "COMPLETE_BLOOD_COUNT",
            "displayName": "Complete Blood Count (CBC)",
            "department": "HEMATOLOGY",
            "metadata": { "commonAliases": ["CBC", "HEMOGRAM"] },
            "sections": [
                {
                    "sectionId": "hematology",
                    "sectionName": "Hematology",
                    "parameters": [
                        {
                            "parameterId": "HEMOGLOBIN",
                            "displayName": "Hemoglobin",
                            "aliases": ["HB", "HGB"],
                            "unit": "g/dL",
                            "referenceRanges": {
                                "male": { "min": 13.0, "max": 17.0 },
                                "female": { "min": 12.0, "max": 15.5 },
                                "default": { "min": 12.0, "max": 17.0 }
                            }
                        }
                    ]
                }
            ]
        }),
    )
}

fn lipid_source() -> TemplateSource {
    TemplateSource::new(
        "lipid.json",
        json!({
            "templateId": "lipid_v1",
            "testType": "LIPID_PROFILE",
            "displayName": "Lipid Profile",
            "department": "BIOCHEMISTRY"
        }),
    )
}

#[test]
fn loads_and_indexes_by_id_and_key() {
    let repo = TemplateRepository::load(vec![cbc_source(), lipid_source()]).expect("load");

    assert_eq!(repo.len(), 2);
    assert!(repo.by_id("cbc_v1").is_some());
    let cbc = repo
        .by_classification_key("COMPLETE_BLOOD_COUNT")
        .expect("cbc by key");
    assert_eq!(cbc.template_id, "cbc_v1");
    assert_eq!(cbc.parameter_count(), 1);

    let ids: Vec<&str> = repo.all().map(|t| t.template_id.as_str()).collect();
    assert_eq!(ids, vec!["cbc_v1", "lipid_v1"]);
}

#[test]
fn malformed_sources_are_skipped_and_reported() {
    let sources = vec![
        cbc_source(),
        TemplateSource::new("no_id.json", json!({ "displayName": "Nameless" })),
        TemplateSource::new(
            "no_key.json",
            json!({ "templateId": "orphan_v1", "displayName": "Orphan" }),
        ),
        TemplateSource::new("not_a_template.json", json!("just a string")),
    ];

    let repo = TemplateRepository::load(sources).expect("load");
    assert_eq!(repo.len(), 1);

    let report = repo.load_report();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped.len(), 3);
    assert!(
        report
            .skipped
            .iter()
            .any(|s| s.name == "no_key.json" && s.reason.contains("testType"))
    );
}

#[test]
fn duplicate_classification_key_rejects_load() {
    let mut duplicate = lipid_source();
    duplicate.name = "lipid_copy.json".to_string();
    duplicate.value["templateId"] = json!("lipid_v2");

    let err = TemplateRepository::load(vec![lipid_source(), duplicate])
        .expect_err("duplicate key must fail");
    match err {
        TemplateLoadError::DuplicateClassificationKey { key, first, second } => {
            assert_eq!(key, "LIPID_PROFILE");
            assert_eq!(first, "lipid_v1");
            assert_eq!(second, "lipid_v2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_template_id_rejects_load() {
    let mut duplicate = cbc_source();
    duplicate.name = "cbc_copy.json".to_string();
    duplicate.value["testType"] = json!("CBC_ALTERNATE");

    let err = TemplateRepository::load(vec![cbc_source(), duplicate])
        .expect_err("duplicate id must fail");
    assert!(matches!(err, TemplateLoadError::DuplicateTemplateId { .. }));
}

#[test]
fn from_dir_reads_json_files_in_lexical_order() {
    let mut dir = std::env::temp_dir();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("medex_templates_{stamp}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");

    std::fs::write(
        dir.join("a_cbc.json"),
        serde_json::to_string(&cbc_source().value).expect("serialize"),
    )
    .expect("write cbc");
    std::fs::write(
        dir.join("b_lipid.json"),
        serde_json::to_string(&lipid_source().value).expect("serialize"),
    )
    .expect("write lipid");
    std::fs::write(dir.join("notes.txt"), "ignored").expect("write txt");
    std::fs::write(dir.join("broken.json"), "{ not json").expect("write broken");

    let repo = TemplateRepository::from_dir(&dir).expect("from_dir");
    assert_eq!(repo.len(), 2);
    assert_eq!(repo.load_report().skipped.len(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}
