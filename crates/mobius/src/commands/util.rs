//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so the action is refused.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Parse a JSON object given inline.
pub fn parse_json_object(
    raw: &str,
    field: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, CliError> {
    match serde_json::from_str(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(CliError::Validation {
            field: field.into(),
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

/// Read and parse a JSON object from a file for `--from-file` flags.
pub fn read_json_object(
    path: &Path,
) -> Result<serde_json::Map<String, serde_json::Value>, CliError> {
    let contents = std::fs::read_to_string(path)?;
    parse_json_object(&contents, "from-file")
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn inline_json_must_be_an_object() {
        let map = parse_json_object(r#"{"firewall": true}"#, "config").unwrap();
        assert_eq!(map["firewall"], serde_json::Value::Bool(true));

        let err = parse_json_object("[1, 2]", "config").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for config: expected a JSON object, got an array"
        );

        assert!(matches!(
            parse_json_object("{not json", "config"),
            Err(CliError::Json(_))
        ));
    }

    #[test]
    fn json_object_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{"password_min_length": 12}"#).unwrap();

        let map = read_json_object(&path).unwrap();
        assert_eq!(map["password_min_length"], 12);
    }

    #[test]
    fn yes_flag_skips_prompt() {
        assert!(confirm("Wipe?", "wipe", true).unwrap());
    }
}
