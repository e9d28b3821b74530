//! Key validation.
//!
//! Keys are non-empty UTF-8 strings. An empty key is rejected up front.
//! Validation is centralized here so every entry point (engine mutators,
//! the CLI server) rejects the same way.

use crate::error::Error;

/// Validate a key for use as a map key.
///
/// # Examples
///
/// ```
/// use lattice_core::key::validate_key;
///
/// assert!(validate_key("user:123").is_ok());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::BadArgument("key must not be empty".into()));
    }
    Ok(())
}
