//! Document type classification: scores raw OCR text against every
//! template in the catalog.

use medex_model::Template;
use medex_templates::TemplateRepository;

use crate::rules::ClassificationRules;

/// Minimum score for a template to count as identified.
pub const DEFAULT_THRESHOLD: u32 = 10;

const DISPLAY_NAME_WEIGHT: u32 = 10;
const ALIAS_WEIGHT: u32 = 8;
const CATEGORY_WEIGHT: u32 = 2;

/// One classification candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMatch {
    pub classification_key: String,
    pub template_id: String,
    pub display_name: String,
    pub score: u32,
}

/// Scores raw text against every template to find candidate document
/// type(s).
///
/// Scoring per template, over the upper-cased text: display name verbatim
/// substring, each template-level common alias, the department/category
/// string, plus the weighted keyword signals from the
/// [`ClassificationRules`] table.
pub struct DocumentTypeClassifier<'a> {
    repository: &'a TemplateRepository,
    rules: ClassificationRules,
}

impl<'a> DocumentTypeClassifier<'a> {
    /// Classifier with the shipped keyword rule catalog.
    pub fn new(repository: &'a TemplateRepository) -> Self {
        Self::with_rules(repository, ClassificationRules::default_rules())
    }

    pub fn with_rules(repository: &'a TemplateRepository, rules: ClassificationRules) -> Self {
        Self { repository, rules }
    }

    /// Every template scoring at or above `threshold`, best first.
    ///
    /// Supports multi-report pages: this does not stop at the best match.
    /// Ties are ordered by `templateId` so results are reproducible.
    pub fn identify(&self, text: &str, threshold: u32) -> Vec<TypeMatch> {
        let upper = text.to_uppercase();
        let mut matches: Vec<TypeMatch> = self
            .repository
            .all()
            .filter_map(|template| {
                let key = template.classification_key()?;
                let score = self.score_template(template, key, &upper);
                if score < threshold {
                    return None;
                }
                tracing::debug!(
                    template_id = %template.template_id,
                    key = %key,
                    score,
                    "classification candidate"
                );
                Some(TypeMatch {
                    classification_key: key.to_string(),
                    template_id: template.template_id.clone(),
                    display_name: template.display_name.clone(),
                    score,
                })
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.template_id.cmp(&b.template_id))
        });
        matches
    }

    /// The single top match at the default threshold, if any.
    pub fn identify_best(&self, text: &str) -> Option<TypeMatch> {
        self.identify(text, DEFAULT_THRESHOLD).into_iter().next()
    }

    fn score_template(&self, template: &Template, key: &str, upper_text: &str) -> u32 {
        let mut score = 0;

        let display_name = template.display_name.to_uppercase();
        if !display_name.is_empty() && upper_text.contains(&display_name) {
            score += DISPLAY_NAME_WEIGHT;
        }
        for alias in &template.metadata.common_aliases {
            let alias = alias.trim().to_uppercase();
            if !alias.is_empty() && upper_text.contains(&alias) {
                score += ALIAS_WEIGHT;
            }
        }
        if let Some(category) = template.category_label() {
            let category = category.to_uppercase();
            if upper_text.contains(&category) {
                score += CATEGORY_WEIGHT;
            }
        }
        score + self.rules.score(key, upper_text)
    }
}
