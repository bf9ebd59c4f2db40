//! Security module - keeps credentials out of logs

mod sanitizer;

pub use sanitizer::{Sanitizer, SanitizerError, REDACTED};
