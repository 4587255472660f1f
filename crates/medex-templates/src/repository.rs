//! Template repository: validated load of JSON template sources into an
//! immutable, index-backed catalog.
//!
//! Individual malformed sources (bad JSON, missing `templateId` or
//! classification key) are skipped with a warning and reported in the
//! [`LoadReport`]; inconsistencies across otherwise-valid sources
//! (duplicate ids or classification keys) fail the whole load.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use medex_model::{ExtractionType, Template};

use crate::error::TemplateLoadError;

/// One named JSON source, typically a template file's contents.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// Where the value came from, used in warnings and errors
    /// (file name, URL, fixture label).
    pub name: String,
    pub value: Value,
}

impl TemplateSource {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Outcome of a load: how many sources were accepted, and why the rest
/// were skipped.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedSource>,
}

/// A source dropped during load, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedSource {
    pub name: String,
    pub reason: String,
}

/// Basic info about one loaded template.
#[derive(Debug, Clone)]
pub struct TemplateSummary {
    pub template_id: String,
    pub classification_key: String,
    pub display_name: String,
    pub category: Option<String>,
    pub extraction_type: ExtractionType,
    pub version: Option<String>,
}

/// Immutable, in-memory catalog of templates, loaded once at startup.
///
/// Thread-safe for concurrent reads by construction: there are no mutation
/// methods after [`TemplateRepository::load`].
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    templates: BTreeMap<String, Template>,
    classification_index: BTreeMap<String, String>,
    report: LoadReport,
}

impl TemplateRepository {
    /// Builds a repository from named JSON sources.
    pub fn load(
        sources: impl IntoIterator<Item = TemplateSource>,
    ) -> Result<Self, TemplateLoadError> {
        let mut templates: BTreeMap<String, Template> = BTreeMap::new();
        let mut origins: BTreeMap<String, String> = BTreeMap::new();
        let mut classification_index: BTreeMap<String, String> = BTreeMap::new();
        let mut report = LoadReport::default();

        for source in sources {
            let template: Template = match serde_json::from_value(source.value) {
                Ok(template) => template,
                Err(err) => {
                    tracing::warn!(source = %source.name, error = %err, "skipping malformed template source");
                    report.skipped.push(SkippedSource {
                        name: source.name,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            if template.template_id.trim().is_empty() {
                tracing::warn!(source = %source.name, "skipping template source without templateId");
                report.skipped.push(SkippedSource {
                    name: source.name,
                    reason: "missing templateId".to_string(),
                });
                continue;
            }
            let Some(key) = template.classification_key().map(str::to_string) else {
                tracing::warn!(
                    source = %source.name,
                    template_id = %template.template_id,
                    "skipping template source without testType/documentType"
                );
                report.skipped.push(SkippedSource {
                    name: source.name,
                    reason: "missing testType/documentType".to_string(),
                });
                continue;
            };

            if let Some(first) = origins.get(&template.template_id) {
                return Err(TemplateLoadError::DuplicateTemplateId {
                    template_id: template.template_id,
                    first: first.clone(),
                    second: source.name,
                });
            }
            if let Some(first_id) = classification_index.get(&key) {
                return Err(TemplateLoadError::DuplicateClassificationKey {
                    key,
                    first: first_id.clone(),
                    second: template.template_id,
                });
            }

            tracing::debug!(
                template_id = %template.template_id,
                key = %key,
                display_name = %template.display_name,
                "loaded template"
            );
            origins.insert(template.template_id.clone(), source.name);
            classification_index.insert(key, template.template_id.clone());
            templates.insert(template.template_id.clone(), template);
            report.loaded += 1;
        }

        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "template catalog built"
        );
        Ok(Self {
            templates,
            classification_index,
            report,
        })
    }

    /// Reads every `*.json` file in `dir` (lexical order) and loads it.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, TemplateLoadError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        let entries =
            std::fs::read_dir(dir).map_err(|err| TemplateLoadError::io(dir, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| TemplateLoadError::io(dir, err))?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let contents = std::fs::read_to_string(&path)
                .map_err(|err| TemplateLoadError::io(&path, err))?;
            let name = path.display().to_string();
            match serde_json::from_str::<Value>(&contents) {
                Ok(value) => sources.push(TemplateSource::new(name, value)),
                // Route unparseable files through the same skip path as any
                // other malformed source.
                Err(_) => sources.push(TemplateSource::new(name, Value::String(contents))),
            }
        }
        Self::load(sources)
    }

    pub fn by_id(&self, template_id: &str) -> Option<&Template> {
        self.templates.get(template_id)
    }

    pub fn by_classification_key(&self, key: &str) -> Option<&Template> {
        let template_id = self.classification_index.get(key)?;
        self.templates.get(template_id)
    }

    /// All templates, ordered by `templateId`.
    pub fn all(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// What was loaded and what was skipped, for startup diagnostics.
    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Summaries of every loaded template, ordered by `templateId`.
    pub fn list(&self) -> Vec<TemplateSummary> {
        self.templates
            .values()
            .map(|template| TemplateSummary {
                template_id: template.template_id.clone(),
                classification_key: template
                    .classification_key()
                    .unwrap_or_default()
                    .to_string(),
                display_name: template.display_name.clone(),
                category: template.category_label().map(str::to_string),
                extraction_type: template.extraction_type,
                version: template.version.clone(),
            })
            .collect()
    }
}
