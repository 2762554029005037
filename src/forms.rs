use std::collections::BTreeMap;

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

pub const TITLE_MAX: u64 = 200;
pub const USERNAME_MAX: u64 = 150;
pub const PASSWORD_MIN: u64 = 8;

/// Error messages keyed by field, plus the ones that belong to no field.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    general: Vec<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_empty()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn general(&self) -> &[String] {
        &self.general
    }

    pub fn add_field(&mut self, name: &str, message: impl Into<String>) {
        self.fields
            .entry(name.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_general(&mut self, message: impl Into<String>) {
        self.general.push(message.into());
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", err.code));
                out.add_field(&field.to_string(), message);
            }
        }
        out
    }
}

fn validated<T: Validate>(form: &T) -> Result<(), FormErrors> {
    form.validate().map_err(FormErrors::from)
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, max = 200, message = "Title is required and may be at most 200 characters."))]
    pub title: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl PostForm {
    /// Trims the submitted values and validates them.
    pub fn clean(mut self) -> Result<Self, (Self, FormErrors)> {
        self.title = self.title.trim().to_string();
        self.text = self.text.trim().to_string();
        match validated(&self) {
            Ok(()) => Ok(self),
            Err(errors) => Err((self, errors)),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub content: String,
}

impl CommentForm {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }

    pub fn clean(mut self) -> Result<Self, (Self, FormErrors)> {
        self.content = self.content.trim().to_string();
        match validated(&self) {
            Ok(()) => Ok(self),
            Err(errors) => Err((self, errors)),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    pub next: Option<String>,
}

impl LoginForm {
    pub fn clean(mut self) -> Result<Self, (Self, FormErrors)> {
        self.username = self.username.trim().to_string();
        match validated(&self) {
            Ok(()) => Ok(self),
            Err(errors) => Err((self, errors)),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 150, message = "Username is required and may be at most 150 characters."))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "The two password fields didn't match."))]
    pub password_confirm: String,
}

impl RegisterForm {
    pub fn clean(mut self) -> Result<Self, (Self, FormErrors)> {
        self.username = self.username.trim().to_string();
        let mut errors = validated(&self).err().unwrap_or_default();
        if !self.username.chars().all(is_username_char) {
            errors.add_field(
                "username",
                "Usernames may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        match errors.into_result() {
            Ok(()) => Ok(self),
            Err(errors) => Err((self, errors)),
        }
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

/// Only same-site absolute paths are accepted as post-login targets. Browsers
/// drop tabs and newlines from URLs, so control characters are refused outright.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| {
        !n.chars().any(|c| c.is_ascii_control())
            && n.starts_with('/')
            && !n.starts_with("//")
            && !n.contains('\\')
    })
}
