use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TemplateLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate template id {template_id:?} in sources {first:?} and {second:?}")]
    DuplicateTemplateId {
        template_id: String,
        first: String,
        second: String,
    },

    #[error(
        "classification key {key:?} claimed by both template {first:?} and template {second:?}"
    )]
    DuplicateClassificationKey {
        key: String,
        first: String,
        second: String,
    },
}

impl TemplateLoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
