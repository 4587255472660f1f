#![deny(unsafe_code)]

//! Final mapping stage: turns parsed free-form payloads into structured
//! documents shaped by the matched template.

pub mod document;
pub mod error;
pub mod mapper;
pub mod payload;

pub use document::map_document;
pub use error::ExtractError;
pub use mapper::{ExtractionMapper, MappedDocument, map_parameters};
pub use payload::{PayloadError, parse_extraction, parse_payload};
