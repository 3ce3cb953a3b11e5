//! Input validation for user-submitted form fields.
//!
//! ## Summary
//! Every validator takes the raw, possibly missing field value and returns
//! `Ok(())` or a [`FieldError`] carrying a human-readable message. Character
//! checks are allow-lists. The description validator also rejects markup that
//! could script a page; this is in addition to output encoding, not instead of it.
//!
//! Lengths are counted in characters after trimming surrounding whitespace.

use std::sync::LazyLock;

use regex_lite::Regex;
use thiserror::Error;

use crate::constants::DESCRIPTION_MAX_LEN;

/// A field value that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    field: &'static str,
    message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// Name of the offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type FieldResult = std::result::Result<(), FieldError>;

#[expect(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("validation patterns are static and valid")
}

static RESIDENCE_NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| compile(r"^[a-zA-Z0-9\s\-']+$"));
static CLUB_NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| compile(r"^[a-zA-Z0-9\s\-'&]+$"));
static EVENT_TITLE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[a-zA-Z0-9\s\-'&().,!?]+$"));
static MARKUP_INJECTION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)<script|<iframe|javascript:|on\w+="));
static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| compile(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));
static PHONE_CHARS: LazyLock<Regex> = LazyLock::new(|| compile(r"^[\d\s\-().+]+$"));

/// Trims the value and rejects missing or blank input.
fn required<'a>(
    value: Option<&'a str>,
    field: &'static str,
    label: &str,
) -> Result<&'a str, FieldError> {
    let Some(value) = value else {
        return Err(FieldError::new(field, format!("{label} is required")));
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, format!("{label} cannot be empty")));
    }
    Ok(trimmed)
}

/// Shared shape of the name and title validators.
fn bounded_name(
    value: Option<&str>,
    field: &'static str,
    label: &str,
    max_len: usize,
    allowed: &Regex,
) -> FieldResult {
    let trimmed = required(value, field, label)?;

    if trimmed.chars().count() > max_len {
        return Err(FieldError::new(
            field,
            format!("{label} must be {max_len} characters or less"),
        ));
    }

    if !allowed.is_match(trimmed) {
        return Err(FieldError::new(
            field,
            format!("{label} contains invalid characters"),
        ));
    }

    Ok(())
}

/// ## Summary
/// Validates a residence name, surname or street address: letters, digits,
/// whitespace, hyphens and apostrophes, at most 100 characters.
///
/// ## Errors
/// Returns a [`FieldError`] if the value is missing, blank, too long or
/// contains a character outside the allowed set.
pub fn validate_residence_name(name: Option<&str>) -> FieldResult {
    bounded_name(name, "name", "Residence name", 100, &RESIDENCE_NAME_CHARS)
}

/// ## Summary
/// Validates a club name: the residence name set plus `&`, at most 100
/// characters.
///
/// ## Errors
/// Returns a [`FieldError`] if the value is missing, blank, too long or
/// contains a character outside the allowed set.
pub fn validate_club_name(name: Option<&str>) -> FieldResult {
    bounded_name(name, "name", "Club name", 100, &CLUB_NAME_CHARS)
}

/// ## Summary
/// Validates a title for events, posts and community items: letters, digits,
/// whitespace and `-'&().,!?`, at most 200 characters.
///
/// ## Errors
/// Returns a [`FieldError`] if the value is missing, blank, too long or
/// contains a character outside the allowed set.
pub fn validate_event_title(title: Option<&str>) -> FieldResult {
    bounded_name(title, "title", "Event title", 200, &EVENT_TITLE_CHARS)
}

/// ## Summary
/// Validates free text with the default 5000 character limit.
///
/// ## Errors
/// See [`validate_description_with_limit`].
pub fn validate_description(description: Option<&str>) -> FieldResult {
    validate_description_with_limit(description, DESCRIPTION_MAX_LEN)
}

/// ## Summary
/// Validates free text (descriptions, comments, notes) against `max_len` and
/// rejects script tags, iframes, `javascript:` URLs and inline `on*=` event
/// handler attributes, ignoring case.
///
/// ## Errors
/// Returns a [`FieldError`] if the value is missing, blank, too long or
/// contains markup injection patterns.
pub fn validate_description_with_limit(description: Option<&str>, max_len: usize) -> FieldResult {
    free_text(description, "description", "Description", max_len)
}

/// Length and markup checks shared by every free-text field.
fn free_text(value: Option<&str>, field: &'static str, label: &str, max_len: usize) -> FieldResult {
    let trimmed = required(value, field, label)?;

    if trimmed.chars().count() > max_len {
        return Err(FieldError::new(
            field,
            format!("{label} must be {max_len} characters or less"),
        ));
    }

    if MARKUP_INJECTION.is_match(trimmed) {
        return Err(FieldError::new(
            field,
            format!("{label} contains invalid content"),
        ));
    }

    Ok(())
}

/// ## Summary
/// Validates optional free text such as notes or an event location: absent
/// or blank input is accepted, anything else gets the description checks
/// with errors reported against `field` and worded with `label`.
///
/// ## Errors
/// Returns a [`FieldError`] if a non-blank value is too long or contains
/// markup injection patterns.
pub fn validate_optional_text(
    value: Option<&str>,
    field: &'static str,
    label: &str,
    max_len: usize,
) -> FieldResult {
    match value {
        Some(text) if !text.trim().is_empty() => free_text(Some(text), field, label, max_len),
        _ => Ok(()),
    }
}

/// ## Summary
/// Validates an email address after trimming and lowercasing it. At most 254
/// characters.
///
/// ## Errors
/// Returns a [`FieldError`] if the value is missing, malformed or too long.
pub fn validate_email(email: Option<&str>) -> FieldResult {
    let Some(email) = email else {
        return Err(FieldError::new("email", "Email is required"));
    };
    let normalized = crate::util::email::normalize(email);
    if normalized.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }

    if !EMAIL_SHAPE.is_match(&normalized) {
        return Err(FieldError::new("email", "Invalid email format"));
    }

    if normalized.chars().count() > 254 {
        return Err(FieldError::new("email", "Email address is too long"));
    }

    Ok(())
}

/// ## Summary
/// Validates an optional phone number. Missing or blank input is valid.
/// Otherwise digits, whitespace and `-().+`, at most 20 characters.
///
/// ## Errors
/// Returns a [`FieldError`] if a non-blank value has the wrong shape.
pub fn validate_phone(phone: Option<&str>) -> FieldResult {
    let Some(phone) = phone else {
        return Ok(());
    };
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    if !PHONE_CHARS.is_match(trimmed) || trimmed.chars().count() > 20 {
        return Err(FieldError::new("phone_number", "Invalid phone number format"));
    }

    Ok(())
}
