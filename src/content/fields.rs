use std::collections::BTreeMap;
use thiserror::Error;

use super::kinds::QrKind;

/// Raw form values keyed by field name.
pub type Fields = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} requires field '{field}'")]
    MissingField { kind: QrKind, field: &'static str },

    #[error("field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Typed view over a field map for one kind.
pub(crate) struct FieldReader<'a> {
    kind: QrKind,
    fields: &'a Fields,
}

impl<'a> FieldReader<'a> {
    pub fn new(kind: QrKind, fields: &'a Fields) -> Self {
        Self { kind, fields }
    }

    /// Trimmed value, empty when absent.
    pub fn optional(&self, field: &'static str) -> &'a str {
        self.fields.get(field).map(|v| v.trim()).unwrap_or("")
    }

    /// Untrimmed value for secrets and free text, empty when absent.
    pub fn verbatim(&self, field: &'static str) -> &'a str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn required(&self, field: &'static str) -> Result<&'a str, ValidationError> {
        let value = self.optional(field);
        if value.is_empty() {
            return Err(self.missing(field));
        }
        Ok(value)
    }

    /// Like [`Self::required`] but keeps surrounding whitespace.
    pub fn required_verbatim(&self, field: &'static str) -> Result<&'a str, ValidationError> {
        let value = self.verbatim(field);
        if value.trim().is_empty() {
            return Err(self.missing(field));
        }
        Ok(value)
    }

    fn missing(&self, field: &'static str) -> ValidationError {
        ValidationError::MissingField {
            kind: self.kind,
            field,
        }
    }

    /// Checks every field flagged required in the kind's schema.
    pub fn check_schema(&self) -> Result<(), ValidationError> {
        for spec in self.kind.schema() {
            if spec.required {
                self.required(spec.name)?;
            }
        }
        Ok(())
    }
}

/// Strips separators and keeps a leading `+`.
pub fn normalize_phone(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();
    let mut out = String::with_capacity(raw.len());

    for (i, c) in raw.chars().enumerate() {
        match c {
            '0'..='9' => out.push(c),
            '+' if i == 0 => out.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            other => {
                return Err(ValidationError::invalid(
                    field,
                    format!("unexpected character '{other}' in phone number"),
                ));
            }
        }
    }

    let digits = out.chars().filter(char::is_ascii_digit).count();
    if !(3..=15).contains(&digits) {
        return Err(ValidationError::invalid(
            field,
            "phone number must contain between 3 and 15 digits",
        ));
    }

    Ok(out)
}

pub fn validate_email(field: &'static str, raw: &str) -> Result<(), ValidationError> {
    let bad = |reason: &str| -> Result<(), ValidationError> {
        Err(ValidationError::invalid(field, reason.to_string()))
    };

    if raw.chars().any(char::is_whitespace) {
        return bad("email address must not contain whitespace");
    }

    let Some((local, domain)) = raw.split_once('@') else {
        return bad("email address must contain '@'");
    };

    if local.is_empty() || domain.contains('@') {
        return bad("malformed email address");
    }

    if !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || domain.contains("..")
    {
        return bad("email domain is malformed");
    }

    Ok(())
}

/// Profile handle: letters, digits, `.`, `_`, `-`; a leading `@` is dropped.
pub fn normalize_username(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim().trim_start_matches('@');
    if name.is_empty() {
        return Err(ValidationError::invalid(field, "username is empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::invalid(
            field,
            "username may only contain letters, digits, '.', '_' and '-'",
        ));
    }
    Ok(name.to_string())
}

/// Positive decimal amount, returned as entered.
pub fn validate_amount(field: &'static str, raw: &str) -> Result<(), ValidationError> {
    let valid = !raw.starts_with('+')
        && raw.chars().all(|c| c.is_ascii_digit() || c == '.')
        && raw
            .parse::<f64>()
            .map(|v| v.is_finite() && v > 0.0)
            .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(ValidationError::invalid(field, "amount must be a positive number"))
    }
}
