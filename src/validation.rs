use crate::{
    error::AppError,
    models::{LoginForm, MessageForm, SignUpForm},
    repository::Repository,
};

/// Rule
///
/// A single constraint applied to one trimmed form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty after trimming.
    Required,
    /// Character count within `min..=max`.
    Length { min: usize, max: usize },
    MinLength(usize),
    /// ASCII letters only.
    Alphabetic,
    /// ASCII letters and digits only.
    Alphanumeric,
    /// No user with this username exists yet. Requires a store read.
    UsernameAvailable,
}

/// Check
///
/// One `(field, rule, message)` entry of a declarative check list.
#[derive(Debug, Clone, Copy)]
pub struct Check {
    pub field: &'static str,
    pub rule: Rule,
    pub message: &'static str,
}

const fn check(field: &'static str, rule: Rule, message: &'static str) -> Check {
    Check { field, rule, message }
}

/// Field
///
/// Describes how a form field is normalized. Secret fields are never escaped and never
/// echoed back into a re-rendered form.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub secret: bool,
}

const fn plain(name: &'static str) -> Field {
    Field { name, secret: false }
}

const fn secret(name: &'static str) -> Field {
    Field { name, secret: true }
}

/// FormInput
///
/// Implemented by every form payload that goes through the validator.
pub trait FormInput: Sized {
    /// Fields in submission order.
    const FIELDS: &'static [Field];

    fn field(&self, name: &str) -> Option<&str>;
    fn field_mut(&mut self, name: &str) -> Option<&mut String>;
}

pub const SIGN_UP_CHECKS: &[Check] = &[
    check("first_name", Rule::Length { min: 1, max: 30 }, "First name must be between 1 and 30 characters"),
    check("first_name", Rule::Alphabetic, "First name must only contain letters"),
    check("last_name", Rule::Length { min: 1, max: 30 }, "Last name must be between 1 and 30 characters"),
    check("last_name", Rule::Alphabetic, "Last name must only contain letters"),
    check("username", Rule::Length { min: 1, max: 30 }, "Username must be between 1 and 30 characters"),
    check("username", Rule::Alphanumeric, "Username must only contain letters and numbers"),
    check("username", Rule::UsernameAvailable, USERNAME_TAKEN),
    check("password", Rule::MinLength(10), "Password must be at least 10 characters"),
];

pub const LOGIN_CHECKS: &[Check] = &[
    check("username", Rule::Required, "Username must be specified"),
    check("password", Rule::Required, "Password must be specified"),
];

pub const MESSAGE_TEXT_MAX: usize = 300;

pub const MESSAGE_CHECKS: &[Check] = &[
    check("title", Rule::Length { min: 1, max: 30 }, "Title must be between 1 and 30 characters"),
    check("text", Rule::Length { min: 1, max: MESSAGE_TEXT_MAX }, "Message must be between 1 and 300 characters"),
];

pub const USERNAME_TAKEN: &str = "Username already exists";

/// FieldError
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// ValidationFailure
///
/// The submitted values (sanitized, secrets dropped) and the accumulated errors, in
/// submission order. Used to re-render the originating form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailure {
    pub values: Vec<(&'static str, String)>,
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    /// A failure carrying a single error, e.g. a login refusal or a late uniqueness
    /// violation from the store.
    pub fn single<F: FormInput>(form: &F, field: &'static str, message: &'static str) -> Self {
        Self {
            values: echo_values(form),
            errors: vec![FieldError { field, message }],
        }
    }

    /// The echoed value for `name`, or "" for secrets and unknown fields.
    pub fn value(&self, name: &str) -> &str {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.message).collect()
    }
}

/// Validated
///
/// Expected outcome of validation. Invalid input is not an error.
#[derive(Debug)]
pub enum Validated<F> {
    Valid(F),
    Invalid(ValidationFailure),
}

/// validate
///
/// Trims every field, evaluates `checks` in order (a field stops at its first failing
/// rule), then escapes the displayable fields. Only store failures during the username
/// lookup are returned as `Err`.
pub async fn validate<F: FormInput>(
    mut form: F,
    checks: &[Check],
    repo: &dyn Repository,
) -> Result<Validated<F>, AppError> {
    for field in F::FIELDS {
        if let Some(value) = form.field_mut(field.name) {
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                *value = trimmed.to_string();
            }
        }
    }

    let mut errors: Vec<FieldError> = Vec::new();
    for check in checks {
        if errors.iter().any(|e| e.field == check.field) {
            continue;
        }
        let value = form.field(check.field).unwrap_or("");
        if !passes(check.rule, value, repo).await? {
            errors.push(FieldError {
                field: check.field,
                message: check.message,
            });
        }
    }

    for field in F::FIELDS.iter().filter(|f| !f.secret) {
        if let Some(value) = form.field_mut(field.name) {
            *value = escape_html(value);
        }
    }

    if errors.is_empty() {
        return Ok(Validated::Valid(form));
    }

    // Keep the reported order aligned with the form rather than the check list.
    errors.sort_by_key(|e| {
        F::FIELDS
            .iter()
            .position(|f| f.name == e.field)
            .unwrap_or(usize::MAX)
    });

    tracing::debug!(errors = errors.len(), "form validation failed");

    Ok(Validated::Invalid(ValidationFailure {
        values: echo_values(&form),
        errors,
    }))
}

async fn passes(rule: Rule, value: &str, repo: &dyn Repository) -> Result<bool, AppError> {
    let length = value.chars().count();
    let ok = match rule {
        Rule::Required => !value.is_empty(),
        Rule::Length { min, max } => length >= min && length <= max,
        Rule::MinLength(min) => length >= min,
        Rule::Alphabetic => !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()),
        Rule::Alphanumeric => {
            !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
        }
        Rule::UsernameAvailable => repo.find_user_by_username(value).await?.is_none(),
    };
    Ok(ok)
}

fn echo_values<F: FormInput>(form: &F) -> Vec<(&'static str, String)> {
    F::FIELDS
        .iter()
        .filter(|f| !f.secret)
        .map(|f| (f.name, form.field(f.name).unwrap_or("").to_string()))
        .collect()
}

/// escape_html
///
/// Neutralizes HTML-special characters so submitted markup renders as text.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

// --- FormInput implementations ---

impl FormInput for SignUpForm {
    const FIELDS: &'static [Field] = &[
        plain("first_name"),
        plain("last_name"),
        plain("username"),
        secret("password"),
    ];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "first_name" => Some(&self.first_name),
            "last_name" => Some(&self.last_name),
            "username" => Some(&self.username),
            "password" => Some(&self.password),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "first_name" => Some(&mut self.first_name),
            "last_name" => Some(&mut self.last_name),
            "username" => Some(&mut self.username),
            "password" => Some(&mut self.password),
            _ => None,
        }
    }
}

impl FormInput for LoginForm {
    const FIELDS: &'static [Field] = &[plain("username"), secret("password")];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "username" => Some(&self.username),
            "password" => Some(&self.password),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "username" => Some(&mut self.username),
            "password" => Some(&mut self.password),
            _ => None,
        }
    }
}

impl FormInput for MessageForm {
    const FIELDS: &'static [Field] = &[plain("title"), plain("text")];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "text" => Some(&self.text),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "title" => Some(&mut self.title),
            "text" => Some(&mut self.text),
            _ => None,
        }
    }
}
