//! Utility types and functions for formal.
//!
//! This module provides:
//! - [`MultiValueDict`]: An insertion-ordered dictionary holding multiple values per key.
//! - [`text`]: Name helpers (identifier checks, label derivation).

mod multi_value_dict;
pub mod text;

pub use multi_value_dict::MultiValueDict;
