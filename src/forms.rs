use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-a-zA-Z0-9_]+$").expect("hardcoded slug regex is invalid - fix source code")
});

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.@+-]+$").expect("hardcoded username regex is invalid - fix source code")
});

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_REGEX.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_slug").with_message(
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.".into(),
        ))
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::new("required").with_message("This field is required.".into()));
    }
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username").with_message(
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ))
    }
}

/// Per-field error messages; `__all__` holds errors not tied to one field.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

pub const NON_FIELD: &str = "__all__";

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(e: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, errs) in e.field_errors() {
            for err in errs.iter() {
                let msg = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.add(&field.to_string(), msg);
            }
        }
        out
    }
}

/// Runs the declarative rules of a form and hands back its errors, if any.
pub fn check<T: Validate>(form: &T) -> FormErrors {
    form.validate().map(|_| FormErrors::default()).unwrap_or_else(FormErrors::from)
}

/// The `form` entry of a template context.
pub fn form_context<T: Serialize>(fields: &T, errors: &FormErrors) -> serde_json::Value {
    serde_json::json!({
        "fields": fields,
        "errors": errors,
    })
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[serde(default)]
    #[validate(
        length(max = 150, message = "Ensure this value has at most 150 characters."),
        custom(function = "crate::forms::validate_username")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

impl SignupForm {
    pub fn cleaned(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.username = self.username.trim().to_string();
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }

    pub fn errors(&self) -> FormErrors {
        let mut errors = check(self);
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }
        errors
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordChangeForm {
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub old_password: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub new_password1: String,
    #[serde(default, skip_serializing)]
    pub new_password2: String,
}

impl PasswordChangeForm {
    pub fn errors(&self) -> FormErrors {
        let mut errors = check(self);
        if self.new_password1 != self.new_password2 {
            errors.add("new_password2", "The two password fields didn't match.");
        }
        errors
    }
}

/// Text and group of a post. The optional image travels beside it in the
/// multipart body and is checked by the media module.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    pub group: Option<i64>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn cleaned(mut self) -> Self {
        self.text = self.text.trim().to_string();
        self
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct GroupForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Ensure this value is between 1 and 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(
        length(min = 1, max = 50, message = "Ensure this value is between 1 and 50 characters."),
        custom(function = "crate::forms::validate_slug")
    )]
    pub slug: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub description: String,
}

impl GroupForm {
    pub fn cleaned(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.slug = self.slug.trim().to_string();
        self.description = self.description.trim().to_string();
        self
    }
}
