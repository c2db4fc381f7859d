//! Registration input validation
//!
//! Each field carries a declarative list of rules evaluated before anything
//! touches the store. Violations are collected per field into a
//! [`ValidationErrors`] map that serializes straight into the error response
//! body.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::models::RegisterRequest;

/// Field-to-violations map returned when validation fails
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A single validation rule applied to one field value
enum Rule {
    Required,
    MaxLen(usize),
    MinLen(usize),
    Email,
}

impl Rule {
    fn check(&self, field: &'static str, value: &str) -> Option<String> {
        let label = field.replace('_', " ");
        match self {
            Rule::Required if value.is_empty() => Some(format!("The {label} field is required.")),
            Rule::MaxLen(max) if value.chars().count() > *max => Some(format!(
                "The {label} may not be greater than {max} characters."
            )),
            Rule::MinLen(min) if !value.is_empty() && value.chars().count() < *min => {
                Some(format!("The {label} must be at least {min} characters."))
            }
            Rule::Email if !value.is_empty() && !is_email(value) => {
                Some(format!("The {label} must be a valid email address."))
            }
            _ => None,
        }
    }
}

fn is_email(value: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });
    regex.is_match(value)
}

/// Validate a registration request
///
/// Covers every rule that can be checked without the store; uniqueness is
/// probed separately and appended to the same map.
pub fn validate_register(input: &RegisterRequest) -> ValidationErrors {
    let rules: &[(&'static str, &str, &[Rule])] = &[
        (
            "username",
            &input.username,
            &[Rule::Required, Rule::MaxLen(255)],
        ),
        (
            "email",
            &input.email,
            &[Rule::Required, Rule::Email, Rule::MaxLen(255)],
        ),
        (
            "password",
            &input.password,
            &[Rule::Required, Rule::MinLen(6)],
        ),
        ("first_name", &input.first_name, &[Rule::Required]),
        ("middle_name", &input.middle_name, &[Rule::Required]),
        ("last_name", &input.last_name, &[Rule::Required]),
    ];

    let mut errors = ValidationErrors::default();
    for &(field, value, field_rules) in rules {
        for rule in field_rules {
            if let Some(message) = rule.check(field, value) {
                errors.add(field, message);
            }
        }
    }

    if !input.password.is_empty() && input.password != input.password_confirmation {
        errors.add("password", "The password confirmation does not match.");
    }

    errors
}

/// Message for a uniqueness violation on a field
pub fn taken_message(field: &str) -> String {
    format!("The {} has already been taken.", field.replace('_', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
            password_confirmation: "secret1".to_string(),
            first_name: "Alice".to_string(),
            middle_name: "M".to_string(),
            last_name: "Doe".to_string(),
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(validate_register(&valid_input()).is_empty());
    }

    #[test]
    fn test_empty_input_flags_every_required_field() {
        let errors = validate_register(&RegisterRequest {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            password_confirmation: String::new(),
            first_name: String::new(),
            middle_name: String::new(),
            last_name: String::new(),
        });

        for field in [
            "username",
            "email",
            "password",
            "first_name",
            "middle_name",
            "last_name",
        ] {
            assert_eq!(
                errors.messages(field),
                &[format!(
                    "The {} field is required.",
                    field.replace('_', " ")
                )],
                "missing required error for {field}"
            );
        }
    }

    #[test]
    fn test_username_max_length() {
        let mut input = valid_input();
        input.username = "u".repeat(256);
        let errors = validate_register(&input);
        assert_eq!(
            errors.messages("username"),
            &["The username may not be greater than 255 characters."]
        );

        input.username = "u".repeat(255);
        assert!(validate_register(&input).is_empty());
    }

    #[test]
    fn test_email_syntax() {
        let mut input = valid_input();
        for bad in ["not-an-email", "a@b", "@x.com", "a @x.com"] {
            input.email = bad.to_string();
            let errors = validate_register(&input);
            assert_eq!(
                errors.messages("email"),
                &["The email must be a valid email address."],
                "expected rejection for {bad}"
            );
        }
    }

    #[test]
    fn test_password_min_length() {
        let mut input = valid_input();
        input.password = "five5".to_string();
        input.password_confirmation = "five5".to_string();
        let errors = validate_register(&input);
        assert_eq!(
            errors.messages("password"),
            &["The password must be at least 6 characters."]
        );
    }

    #[test]
    fn test_password_confirmation_mismatch() {
        let mut input = valid_input();
        input.password_confirmation = "different".to_string();
        let errors = validate_register(&input);
        assert_eq!(
            errors.messages("password"),
            &["The password confirmation does not match."]
        );
    }

    #[test]
    fn test_errors_serialize_as_field_map() {
        let mut input = valid_input();
        input.username = String::new();
        let errors = validate_register(&input);

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["username"][0], "The username field is required.");
    }

    #[test]
    fn test_taken_message_wording() {
        assert_eq!(taken_message("username"), "The username has already been taken.");
        assert_eq!(taken_message("email"), "The email has already been taken.");
    }
}
