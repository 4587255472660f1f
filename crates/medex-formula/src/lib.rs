#![deny(unsafe_code)]

//! Safe formula evaluation and best-effort derivation of parameters the
//! extraction step could not supply.

pub mod engine;
pub mod expr;

pub use engine::{
    DEFAULT_FORWARD_DECIMALS, DEFAULT_REVERSE_DECIMALS, DerivedParameter, fill_missing,
};
pub use expr::{ExprError, evaluate, identifiers};
