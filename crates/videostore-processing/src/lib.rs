//! Videostore Processing Library
//!
//! Upload inspection that must run before anything is written: size and
//! filename checks and content type detection from the leading bytes.

pub mod validator;

pub use validator::{content_type_for_extension, ContentValidator, DetectionSource, ValidationError};
