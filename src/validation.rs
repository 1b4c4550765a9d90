//! Input validation shared by every handler.
//!
//! Each request body is checked in a single pass that collects every problem
//! into `FieldErrors`, then turned into one `ApiError::ValidationError`.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first error reported for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Trimmed non-empty value, or an error for `field`.
    pub fn required(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.add(field, "This field is required");
                None
            }
        }
    }

    /// Trimmed value when present and non-blank.
    pub fn optional(&mut self, value: Option<&str>) -> Option<String> {
        value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.add(field, format!("Must be at most {} characters", max));
            }
        }
    }

    pub fn parse<T>(&mut self, field: &str, value: Option<&str>) -> Option<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = value.map(str::trim).filter(|v| !v.is_empty())?;
        match raw.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let mut fields: Vec<&str> = self.errors.keys().map(String::as_str).collect();
        fields.sort_unstable();
        let message = format!("Invalid input: {}", fields.join(", "));
        Err(ApiError::validation_error(message, Some(self.errors)))
    }
}

/// `^[^\s@]+@[^\s@]+\.[^\s@]+$`
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("Invalid email format".to_string());
    }

    let domain = parts[1];
    let has_inner_dot = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !has_inner_dot {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn validate_url(value: &str) -> Result<(), String> {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => Ok(()),
        _ => Err("Must be a valid http(s) URL".to_string()),
    }
}

pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request("Invalid ID"))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Assignment update: absent keeps, `null` / `""` / `"null"` clears, an id sets.
pub fn parse_assignment(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<Option<&str>>,
) -> Option<Option<Uuid>> {
    match raw {
        None => None,
        Some(None) => Some(None),
        Some(Some(value)) => {
            let value = value.trim();
            if value.is_empty() || value == "null" {
                return Some(None);
            }
            match Uuid::parse_str(value) {
                Ok(id) => Some(Some(id)),
                Err(_) => {
                    errors.add(field, "Invalid ID");
                    None
                }
            }
        }
    }
}

/// Required account reference.
pub fn parse_reference(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<Uuid> {
    let value = errors.required(field, raw)?;
    match Uuid::parse_str(&value) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "Invalid ID");
            None
        }
    }
}
