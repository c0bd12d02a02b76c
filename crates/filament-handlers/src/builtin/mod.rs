pub mod input;
pub mod language;
pub mod llm;
pub mod output;
pub mod process;
pub mod tool;

use filament_core::error::{FilamentError, Result};
use filament_core::types::Record;

/// Read a required string-valued key from a record of collected inputs.
pub(crate) fn require_str_input<'a>(inputs: &'a Record, key: &str) -> Result<&'a str> {
    inputs
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| FilamentError::MissingInput(key.to_string()))
}

/// Read a required string-valued parameter.
pub(crate) fn require_str_param<'a>(parameters: &'a Record, key: &str) -> Result<&'a str> {
    parameters
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| FilamentError::MissingParameter(key.to_string()))
}

/// Read an optional string parameter.
pub(crate) fn str_param<'a>(parameters: &'a Record, key: &str) -> Option<&'a str> {
    parameters.get(key).and_then(|v| v.as_str())
}
