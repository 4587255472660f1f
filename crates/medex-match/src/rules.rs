//! Declarative keyword rules for document type classification.
//!
//! Each classification key maps to a list of (pattern, weight) rules; the
//! classifier folds a template's score over this table. Adding a document
//! type is a data change, not a code change.

use std::collections::BTreeMap;

use regex::Regex;

/// Weight for a lab test's primary keyword pattern.
pub const LAB_PRIMARY_WEIGHT: u32 = 15;
/// Weight for a non-lab document's defining keyword pattern.
pub const DOCUMENT_PRIMARY_WEIGHT: u32 = 20;
/// Weight for secondary cue keywords of either kind.
pub const SECONDARY_WEIGHT: u32 = 5;

/// A single weighted keyword signal.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pattern: Regex,
    pub weight: u32,
}

impl KeywordRule {
    /// Compiles a rule from an alternation of keywords. The pattern is
    /// matched against upper-cased text, wrapped in word boundaries.
    pub fn new(keywords: &str, weight: u32) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"\b({keywords})\b"))?;
        Ok(Self { pattern, weight })
    }

    pub fn matches(&self, upper_text: &str) -> bool {
        self.pattern.is_match(upper_text)
    }
}

/// Table of per-classification-key keyword rules.
#[derive(Debug, Clone, Default)]
pub struct ClassificationRules {
    rules: BTreeMap<String, Vec<KeywordRule>>,
}

impl ClassificationRules {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends a rule for `key`, builder style.
    pub fn with_rule(
        mut self,
        key: &str,
        keywords: &str,
        weight: u32,
    ) -> Result<Self, regex::Error> {
        self.rules
            .entry(key.to_string())
            .or_default()
            .push(KeywordRule::new(keywords, weight)?);
        Ok(self)
    }

    /// Sum of weights of every rule for `key` that matches the text.
    pub fn score(&self, key: &str, upper_text: &str) -> u32 {
        let Some(rules) = self.rules.get(key) else {
            return 0;
        };
        rules
            .iter()
            .filter(|rule| rule.matches(upper_text))
            .map(|rule| rule.weight)
            .sum()
    }

    /// The shipped rule catalog covering the supported document types.
    pub fn default_rules() -> Self {
        let lab: &[(&str, &str)] = &[
            ("COMPLETE_BLOOD_COUNT", "CBC|COMPLETE BLOOD COUNT|HEMOGRAM"),
            ("DENGUE_PROFILE", "DENGUE|NS1|IGG|IGM"),
            ("LIPID_PROFILE", "LIPID|CHOLESTEROL|HDL|LDL|TRIGLYCERIDE"),
            (
                "LIVER_FUNCTION_TEST",
                "LFT|LIVER FUNCTION|SGOT|SGPT|ALT|AST|BILIRUBIN|ALKALINE PHOSPHATASE",
            ),
            (
                "KIDNEY_FUNCTION_TEST",
                "KFT|RFT|KIDNEY FUNCTION|RENAL FUNCTION|CREATININE|UREA|BUN",
            ),
            ("THYROID_FUNCTION_TEST", "TFT|THYROID|TSH|T3|T4|FT3|FT4"),
            (
                "GLUCOSE_PANEL",
                "GLUCOSE|SUGAR|HBA1C|FASTING|POSTPRANDIAL|DIABETES",
            ),
            ("CRP_TEST", "CRP|C.REACTIVE PROTEIN|C REACTIVE|CREACTIVE"),
            (
                "ESR_TEST",
                "ESR|ERYTHROCYTE SEDIMENTATION|SEDIMENTATION RATE",
            ),
            ("COVID19_TEST", "COVID|SARS.COV.2|CORONAVIRUS|RT.PCR|ANTIGEN"),
            ("MALARIA_TEST", "MALARIA|PLASMODIUM|FALCIPARUM|VIVAX"),
            ("TYPHOID_TEST", "TYPHOID|WIDAL|TYPHI|PARATYPHI"),
            (
                "VITAMIN_D_TEST",
                "VITAMIN D|25.OH|25 HYDROXY|CHOLECALCIFEROL",
            ),
            (
                "VITAMIN_B12_TEST",
                "VITAMIN B12|B12|COBALAMIN|CYANOCOBALAMIN",
            ),
            ("IRON_STUDIES", "IRON|FERRITIN|TIBC|TRANSFERRIN|IRON BINDING"),
            (
                "ELECTROLYTES_PANEL",
                r"ELECTROLYTE|SODIUM|POTASSIUM|CHLORIDE|NA\+|K\+",
            ),
            (
                "CARDIAC_ENZYMES",
                "TROPONIN|CPK|CK.MB|CARDIAC|BNP|NT.PROBNP",
            ),
            ("URINE_ROUTINE", "URINE|URINALYSIS|MICROSCOPY|PUS CELLS"),
            (
                "COAGULATION_PANEL",
                "COAGULATION|PT|INR|APTT|PROTHROMBIN|BLEEDING TIME",
            ),
            ("HEPATITIS_PANEL", "HEPATITIS|HBSAG|ANTI.HCV|HBV|HCV|HAV"),
        ];
        let documents: &[(&str, u32, &str)] = &[
            (
                "PRESCRIPTION",
                DOCUMENT_PRIMARY_WEIGHT,
                "PRESCRIPTION|RX|MEDICATION|DOSAGE|TABLET|CAPSULE|MEDICINE",
            ),
            (
                "PRESCRIPTION",
                SECONDARY_WEIGHT,
                r"DOCTOR|DR\.|PHYSICIAN|CONSULTANT|MBBS|MD",
            ),
            (
                "PRESCRIPTION",
                SECONDARY_WEIGHT,
                "FREQUENCY|DURATION|DAYS|TIMES DAILY|BD|TDS|OD",
            ),
            (
                "DISCHARGE_SUMMARY",
                DOCUMENT_PRIMARY_WEIGHT,
                "DISCHARGE|ADMISSION|HOSPITALIZATION|INPATIENT|IPD",
            ),
            (
                "DISCHARGE_SUMMARY",
                SECONDARY_WEIGHT,
                "ADMITTED|DISCHARGED|LENGTH OF STAY|FINAL DIAGNOSIS",
            ),
            (
                "MEDICAL_CERTIFICATE",
                DOCUMENT_PRIMARY_WEIGHT,
                "MEDICAL CERTIFICATE|SICK LEAVE|FITNESS CERTIFICATE|UNFIT|REST",
            ),
            (
                "MEDICAL_CERTIFICATE",
                SECONDARY_WEIGHT,
                "LEAVE FROM|LEAVE TO|DAYS OF LEAVE",
            ),
            (
                "HOSPITAL_BILL",
                LAB_PRIMARY_WEIGHT,
                "BILL|INVOICE|RECEIPT|CHARGES|CONSULTATION FEE|PAYABLE",
            ),
            (
                "HOSPITAL_BILL",
                SECONDARY_WEIGHT,
                "HOSPITAL|CLINIC|MEDICAL CENTER|HEALTH",
            ),
            (
                "HOSPITAL_BILL",
                SECONDARY_WEIGHT,
                "SUBTOTAL|TAX|GST|TOTAL AMOUNT|NET AMOUNT",
            ),
            (
                "HOSPITAL_BILL",
                SECONDARY_WEIGHT,
                "ROOM CHARGES|CONSULTATION|PROCEDURE|SURGERY|IPD|OPD",
            ),
            (
                "PHARMACY_BILL",
                DOCUMENT_PRIMARY_WEIGHT,
                "PHARMACY|CHEMIST|MEDICAL STORE|DRUGSTORE",
            ),
            (
                "PHARMACY_BILL",
                SECONDARY_WEIGHT,
                "MEDICINE|DRUG|TABLET|CAPSULE|SYRUP|MRP|BATCH",
            ),
            (
                "PHARMACY_BILL",
                SECONDARY_WEIGHT,
                "EXPIRY|BATCH NO|DL NO|DRUG LICENSE",
            ),
            (
                "ECG_REPORT",
                DOCUMENT_PRIMARY_WEIGHT,
                "ECG|EKG|ELECTROCARDIOGRAM|CARDIOGRAM",
            ),
            (
                "ECG_REPORT",
                SECONDARY_WEIGHT,
                "HEART RATE|RHYTHM|PR INTERVAL|QRS|QT INTERVAL",
            ),
            (
                "XRAY_REPORT",
                DOCUMENT_PRIMARY_WEIGHT,
                "X.RAY|XRAY|RADIOGRAPH|CHEST PA|CHEST X.RAY",
            ),
            (
                "XRAY_REPORT",
                SECONDARY_WEIGHT,
                "FINDINGS|IMPRESSION|RADIOLOGIST|VIEW",
            ),
            (
                "ULTRASOUND_REPORT",
                DOCUMENT_PRIMARY_WEIGHT,
                "ULTRASOUND|USG|SONOGRAPHY|DOPPLER",
            ),
            (
                "ULTRASOUND_REPORT",
                SECONDARY_WEIGHT,
                "ABDOMEN|PELVIS|KUB|OBSTETRIC|FINDINGS|IMPRESSION",
            ),
            (
                "VACCINATION_CERTIFICATE",
                DOCUMENT_PRIMARY_WEIGHT,
                "VACCINATION|VACCINE|IMMUNIZATION|DOSE|COVAXIN|COVISHIELD",
            ),
            (
                "VACCINATION_CERTIFICATE",
                SECONDARY_WEIGHT,
                "1ST DOSE|2ND DOSE|BOOSTER|BATCH NUMBER",
            ),
        ];

        let mut table = Self::empty();
        for (key, keywords) in lab {
            table = table
                .with_rule(key, keywords, LAB_PRIMARY_WEIGHT)
                .expect("static keyword pattern compiles");
        }
        table = table
            .with_rule(
                "COMPLETE_BLOOD_COUNT",
                "HAEMOGLOBIN|HEMOGLOBIN|WBC|RBC|PLATELET",
                SECONDARY_WEIGHT,
            )
            .expect("static keyword pattern compiles");
        for (key, weight, keywords) in documents {
            table = table
                .with_rule(key, keywords, *weight)
                .expect("static keyword pattern compiles");
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_sums_matching_rule_weights() {
        let rules = ClassificationRules::default_rules();
        let text = "COMPLETE BLOOD COUNT REPORT\nHEMOGLOBIN 13.5\nPLATELET COUNT";
        assert_eq!(
            rules.score("COMPLETE_BLOOD_COUNT", text),
            LAB_PRIMARY_WEIGHT + SECONDARY_WEIGHT
        );
        assert_eq!(rules.score("DENGUE_PROFILE", text), 0);
        assert_eq!(rules.score("NO_SUCH_KEY", text), 0);
    }

    #[test]
    fn word_boundaries_prevent_substring_hits() {
        let rules = ClassificationRules::empty()
            .with_rule("T", "ALT", LAB_PRIMARY_WEIGHT)
            .expect("compile");
        assert_eq!(rules.score("T", "SALTED SAMPLE"), 0);
        assert_eq!(rules.score("T", "ALT 34 U/L"), LAB_PRIMARY_WEIGHT);
    }
}
