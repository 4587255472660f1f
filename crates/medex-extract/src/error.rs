use crate::payload::PayloadError;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No template is indexed under the requested classification key.
    #[error("document type {key:?} does not match any loaded template")]
    UnrecognizedDocument { key: String },

    #[error(transparent)]
    Payload(#[from] PayloadError),
}
