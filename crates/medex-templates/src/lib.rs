#![deny(unsafe_code)]

//! Immutable template catalog for the extraction engine.
//!
//! Templates are JSON documents describing one document/test type's
//! sections and parameters. The repository loads them once, validates the
//! schema, indexes them by id and classification key, and is then shared
//! read-only across the engine.

pub mod error;
pub mod repository;

pub use error::TemplateLoadError;
pub use repository::{
    LoadReport, SkippedSource, TemplateRepository, TemplateSource, TemplateSummary,
};
