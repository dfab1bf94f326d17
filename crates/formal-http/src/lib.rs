//! # formal-http
//!
//! The submission side of formal: what a browser POSTs, before any form
//! logic touches it.
//!
//! - [`Submission`] - multi-valued raw key/value pairs (text, bytes, files)
//! - [`Charset`] - decoding of byte keys and values with the declared charset
//! - [`UploadedFile`] - a file received in a submission

pub mod charset;
pub mod submission;
pub mod upload;

pub use charset::Charset;
pub use submission::{FieldInput, RawValue, Submission};
pub use upload::UploadedFile;
