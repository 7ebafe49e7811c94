pub mod validator;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub use validator::validate;

/// Fields of the contact form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Email,
    Phone,
    Company,
    Pronouns,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Company => "company",
            Self::Pronouns => "pronouns",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values as typed by the user, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFormFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    pub pronouns: Option<String>,
}

impl RawFormFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A contact that passed validation, as built by [`validator::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    TooShort,
    TooLong,
    InvalidFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
}

/// Per-field validation messages; empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: BTreeMap<FormField, FieldError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: FormField) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    pub fn message(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &FieldError)> {
        self.errors.iter().map(|(f, e)| (*f, e))
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn insert(&mut self, field: FormField, kind: FieldErrorKind, message: impl Into<String>) {
        self.errors.insert(
            field,
            FieldError {
                kind,
                message: message.into(),
            },
        );
    }

    /// One-line `field: message` list, used in error displays.
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(field, e)| format!("{}: {}", field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
