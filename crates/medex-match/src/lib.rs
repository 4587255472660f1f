#![deny(unsafe_code)]

//! Matching layer of the extraction engine: document type classification,
//! parameter name matching, reference range resolution and clinical
//! status.
//!
//! Everything here is pure computation over the immutable template
//! catalog; no I/O, no internal state.

pub mod classifier;
pub mod matcher;
pub mod ranges;
pub mod rules;
pub mod status;

pub use classifier::{DEFAULT_THRESHOLD, DocumentTypeClassifier, TypeMatch};
pub use matcher::{EXACT_MATCH_SCORE, MATCH_FLOOR, ParameterMatch, match_best, score};
pub use ranges::{Gender, resolve};
pub use rules::{ClassificationRules, KeywordRule};
pub use status::{classify, critical_flags};
