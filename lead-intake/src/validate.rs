//! Field and attachment validation
//!
//! [`validate`] is a pure function of the schema, the current field values and
//! how many files each slot holds. A form may only be submitted when it
//! returns an empty map.

use std::sync::OnceLock;

use regex::Regex;

use crate::attachments::Attachments;
use crate::countries;
use crate::forms::FormSchema;
use crate::types::{FormFieldSet, ValidationErrorMap};

/// How a phone number's digits are counted, after stripping everything else
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhonePolicy {
    ExactDigits(usize),
    MinDigits(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Letters and spaces only
    PersonName,
    Phone(PhonePolicy),
    Email,
    Text { min_chars: usize },
    Choice(Vec<String>),
    /// A dial code from [`countries::COUNTRIES`]
    CountryCode,
    Rating { min: u8, max: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn person_name(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::PersonName)
    }

    pub fn email(name: &str) -> Self {
        Self::new(name, "Email", FieldKind::Email)
    }

    pub fn phone(name: &str, policy: PhonePolicy) -> Self {
        Self::new(name, "Phone number", FieldKind::Phone(policy))
    }

    pub fn text(name: &str, label: &str, min_chars: usize) -> Self {
        Self::new(name, label, FieldKind::Text { min_chars })
    }

    pub fn choice<I, S>(name: &str, label: &str, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, label, FieldKind::Choice(options.into_iter().map(Into::into).collect()))
    }

    /// Check one value; `None` when it passes
    pub fn check(&self, raw: &str) -> Option<String> {
        let value = raw.trim();
        if value.is_empty() {
            return self.required.then(|| format!("{} is required", self.label));
        }

        match &self.kind {
            FieldKind::PersonName => (!name_pattern().is_match(value))
                .then(|| format!("{} can only contain letters and spaces", self.label)),
            FieldKind::Phone(policy) => {
                let digits = value.chars().filter(char::is_ascii_digit).count();
                match *policy {
                    PhonePolicy::ExactDigits(n) if digits != n => {
                        Some(format!("{} must be exactly {n} digits", self.label))
                    }
                    PhonePolicy::MinDigits(n) if digits < n => {
                        Some(format!("{} must have at least {n} digits", self.label))
                    }
                    _ => None,
                }
            }
            FieldKind::Email => {
                (!email_pattern().is_match(value)).then(|| "Please enter a valid email address".to_string())
            }
            FieldKind::Text { min_chars } => (value.chars().count() < *min_chars)
                .then(|| format!("{} must be at least {min_chars} characters", self.label)),
            FieldKind::Choice(options) => (!options.iter().any(|o| o == value))
                .then(|| format!("Please select a valid {}", self.label.to_lowercase())),
            FieldKind::CountryCode => (!countries::is_known_dial_code(value))
                .then(|| "Please select a valid country code".to_string()),
            FieldKind::Rating { min, max } => match value.parse::<u8>() {
                Ok(r) if (*min..=*max).contains(&r) => None,
                _ => Some(format!("{} must be between {min} and {max}", self.label)),
            },
        }
    }
}

fn name_pattern() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[\p{L} ]+$").expect("name pattern compiles"))
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

/// Full validation pass over a form's fields and attachment slots
pub fn validate(schema: &FormSchema, fields: &FormFieldSet, attachments: &Attachments) -> ValidationErrorMap {
    let mut errors = ValidationErrorMap::new();

    for rule in schema.fields() {
        if let Some(message) = rule.check(fields.get(&rule.name)) {
            errors.insert(rule.name.clone(), message);
        }
    }

    for slot in schema.slots() {
        if let Some(message) = slot.required_message() {
            if attachments.count(slot.name()) == 0 {
                errors.insert(slot.name(), message);
            }
        }
    }

    errors
}
