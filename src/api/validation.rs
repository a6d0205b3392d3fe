use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::ApiError;

const MAX_STRING_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 6;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"))
}

/// Per-field validation messages, reported together as one 400.
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::FieldValidation(self.0))
        }
    }

    /// Trimmed value of a required string field, recording why it is unusable.
    fn required<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.add(field, format!("The {field} field is required."));
                None
            }
        }
    }

    fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(
                field,
                format!("The {field} field must not be greater than {max} characters."),
            );
        }
    }

    fn min_len(&mut self, field: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(
                field,
                format!("The {field} field must be at least {min} characters."),
            );
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if !email_regex().is_match(value) {
            self.add(field, format!("The {field} field must be a valid email address."));
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

pub fn validate_drug_name(drug_name: Option<&str>) -> Result<&str, ApiError> {
    let mut errors = FieldErrors::default();
    let name = errors.required("drug_name", drug_name);
    if let Some(name) = name {
        errors.max_len("drug_name", name, MAX_STRING_LEN);
    }
    errors.into_result()?;

    name.ok_or_else(|| ApiError::validation("The drug_name field is required."))
}

pub fn validate_registration<'a>(
    name: Option<&'a str>,
    email: Option<&'a str>,
    password: Option<&'a str>,
) -> Result<Registration<'a>, ApiError> {
    let mut errors = FieldErrors::default();

    let name = errors.required("name", name);
    if let Some(name) = name {
        errors.max_len("name", name, MAX_STRING_LEN);
    }

    let email = errors.required("email", email);
    if let Some(email) = email {
        errors.email("email", email);
        errors.max_len("email", email, MAX_STRING_LEN);
    }

    // Passwords are taken verbatim
    let password = password.filter(|p| !p.is_empty());
    match password {
        Some(p) => errors.min_len("password", p, MIN_PASSWORD_LEN),
        None => errors.add("password", "The password field is required."),
    }

    errors.into_result()?;

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) => Ok(Registration {
            name,
            email,
            password,
        }),
        _ => Err(ApiError::validation("Validation Errors")),
    }
}

pub fn validate_credentials<'a>(
    email: Option<&'a str>,
    password: Option<&'a str>,
) -> Result<Credentials<'a>, ApiError> {
    let mut errors = FieldErrors::default();

    let email = errors.required("email", email);
    if let Some(email) = email {
        errors.email("email", email);
    }

    let password = password.filter(|p| !p.is_empty());
    match password {
        Some(p) => errors.min_len("password", p, MIN_PASSWORD_LEN),
        None => errors.add("password", "The password field is required."),
    }

    errors.into_result()?;

    match (email, password) {
        (Some(email), Some(password)) => Ok(Credentials { email, password }),
        _ => Err(ApiError::validation("Validation Errors")),
    }
}

pub fn validate_rxcui(rxcui: Option<&str>) -> Result<&str, ApiError> {
    let mut errors = FieldErrors::default();
    let rxcui = errors.required("rxcui", rxcui);
    errors.into_result()?;

    rxcui.ok_or_else(|| ApiError::validation("The rxcui field is required."))
}
