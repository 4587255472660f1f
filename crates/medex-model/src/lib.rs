#![deny(unsafe_code)]

//! Data model for the template matching and parameter mapping engine.
//!
//! Defines the template schema (documents, sections, parameter definitions,
//! reference ranges), the free-form extraction payload produced by the LLM
//! collaborator, and the mapped output shapes. All types are plain serde
//! records; loading and matching live in their own crates.

pub mod extraction;
pub mod mapped;
pub mod template;

pub use extraction::{DocumentMetadata, ExtractedField, FreeformExtraction};
pub use mapped::{
    Completeness, DocumentData, Flag, MappedParameter, MappedSection, ParamValue,
    ReferenceSource, Status, StructuredDocument, TestResults,
};
pub use template::{
    CriticalValues, ExtractionType, FieldDef, ItemSchema, ParameterDef, RangeBounds, RangeSpec,
    Section, Template, TemplateMetadata,
};
