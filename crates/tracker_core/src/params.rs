use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pattern submitted when the caller leaves the regex field empty.
pub const DEFAULT_REGEX: &str = "[A-Z]+";

/// Raw form input as the caller typed it. `min_chars` is still unparsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SolveForm {
    pub input: String,
    pub regex: String,
    pub min_chars: String,
    pub parallel_mode: bool,
    pub credential_digest: Option<String>,
}

/// Validated job parameters. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveParams {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub regex: String,
    #[serde(default)]
    pub min_chars: u32,
    #[serde(default)]
    pub parallel_mode: bool,
    #[serde(
        rename = "passwordHash",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub credential_digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("must provide input")]
    EmptyInput,
    #[error("minimum characters must be a non-negative integer, got {0:?}")]
    MalformedMinChars(String),
}

impl SolveForm {
    /// Validates the form and normalizes it into submit-ready parameters.
    pub fn validate(&self, require_input: bool) -> Result<SolveParams, ValidationError> {
        if require_input && self.input.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let min_chars = parse_min_chars(&self.min_chars)?;
        let regex = if self.regex.trim().is_empty() {
            DEFAULT_REGEX.to_string()
        } else {
            self.regex.clone()
        };

        Ok(SolveParams {
            input: self.input.clone(),
            regex,
            min_chars,
            parallel_mode: self.parallel_mode,
            credential_digest: self
                .credential_digest
                .clone()
                .filter(|digest| !digest.is_empty()),
        })
    }
}

fn parse_min_chars(raw: &str) -> Result<u32, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| ValidationError::MalformedMinChars(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(input: &str, regex: &str, min_chars: &str) -> SolveForm {
        SolveForm {
            input: input.to_string(),
            regex: regex.to_string(),
            min_chars: min_chars.to_string(),
            ..SolveForm::default()
        }
    }

    #[test]
    fn empty_regex_becomes_default() {
        let params = form("ABC", "", "3").validate(true).unwrap();
        assert_eq!(params.regex, DEFAULT_REGEX);
        assert_eq!(params.min_chars, 3);

        let params = form("ABC", "   ", "3").validate(true).unwrap();
        assert_eq!(params.regex, DEFAULT_REGEX);
    }

    #[test]
    fn explicit_regex_is_kept() {
        let params = form("ABC", "^A.*", "").validate(true).unwrap();
        assert_eq!(params.regex, "^A.*");
        assert_eq!(params.min_chars, 0);
    }

    #[test]
    fn empty_input_depends_on_policy() {
        assert_eq!(
            form("", "", "1").validate(true),
            Err(ValidationError::EmptyInput)
        );
        assert!(form("", "", "1").validate(false).is_ok());
    }

    #[test]
    fn min_chars_must_be_non_negative_integer() {
        for bad in ["-1", "three", "2.5"] {
            assert_eq!(
                form("ABC", "", bad).validate(true),
                Err(ValidationError::MalformedMinChars(bad.to_string()))
            );
        }
        assert_eq!(form("ABC", "", " 4 ").validate(true).unwrap().min_chars, 4);
    }

    #[test]
    fn wire_names_match_server_contract() {
        let params = SolveParams {
            input: "ABC".into(),
            regex: DEFAULT_REGEX.into(),
            min_chars: 2,
            parallel_mode: true,
            credential_digest: None,
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "input": "ABC",
                "regex": "[A-Z]+",
                "minChars": 2,
                "parallelMode": true
            })
        );
    }
}
