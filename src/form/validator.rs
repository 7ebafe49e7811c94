use once_cell::sync::Lazy;
use regex::Regex;

use super::{ContactInput, FieldErrorKind, FormField, RawFormFields, ValidationResult};

const NAME_MIN: usize = 3;
const COMPANY_MIN: usize = 2;
const PRONOUNS_MAX: usize = 30;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

fn is_email(value: &str) -> bool {
    let local = value.split('@').next().unwrap_or_default();
    !local.starts_with('.') && !local.contains("..") && EMAIL_RE.is_match(value)
}

/// Length in UTF-16 code units, the unit the web form's schema counts in.
fn len(value: &str) -> usize {
    value.encode_utf16().count()
}

/// Check every field of `raw` independently.
pub fn validate(raw: &RawFormFields) -> ValidationResult {
    let mut result = ValidationResult::default();

    if len(&raw.name) < NAME_MIN {
        result.insert(FormField::Name, FieldErrorKind::TooShort, "Name is required");
    }

    if !is_email(&raw.email) {
        result.insert(FormField::Email, FieldErrorKind::InvalidFormat, "Invalid email");
    }

    if len(&raw.company) < COMPANY_MIN {
        result.insert(FormField::Company, FieldErrorKind::TooShort, "Company is required");
    }

    if let Some(pronouns) = &raw.pronouns {
        if len(pronouns) > PRONOUNS_MAX {
            result.insert(
                FormField::Pronouns,
                FieldErrorKind::TooLong,
                format!("Pronouns must contain at most {} characters", PRONOUNS_MAX),
            );
        }
    }

    result
}

/// Validate and, when clean, build the contact that is sent to the gateway.
///
/// Empty optional fields are dropped rather than sent as empty strings.
pub fn parse(raw: &RawFormFields) -> Result<ContactInput, ValidationResult> {
    let result = validate(raw);
    if !result.is_valid() {
        return Err(result);
    }

    let optional = |v: &Option<String>| v.as_ref().filter(|s| !s.is_empty()).cloned();

    Ok(ContactInput {
        name: raw.name.clone(),
        email: raw.email.clone(),
        phone: optional(&raw.phone),
        company: raw.company.clone(),
        pronouns: optional(&raw.pronouns),
    })
}
