/// Request payload validation
///
/// Inbound bodies are deserialized into the `*Request` structs below, then
/// passed through [`check`], which
///
/// 1. normalizes the payload (trims `username`, `email` and `title`),
/// 2. runs every field rule and aggregates all violations,
/// 3. converts the payload into the typed input the services accept.
///
/// Violations become an [`AppError::Validation`] whose details hold one entry
/// per failing rule, sorted by field:
///
/// ```json
/// {
///   "validation_errors": [
///     {"loc": ["email"], "msg": "Invalid email format", "type": "email"},
///     {"loc": ["username"], "msg": "Username must be between 3 and 80 characters", "type": "length"}
///   ]
/// }
/// ```
///
/// # Example
///
/// ```
/// use tasklane_shared::validation::{check, RegisterRequest};
///
/// let req: RegisterRequest = serde_json::from_value(serde_json::json!({
///     "username": "  alice ",
///     "email": "alice@x.com",
///     "password": "pw123456"
/// }))
/// .unwrap();
///
/// let registration = check(req).unwrap();
/// assert_eq!(registration.username, "alice");
/// ```

use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, AppResult};
use crate::models::task::UpdateTask;

/// Message used for every validation failure
pub const VALIDATION_MESSAGE: &str = "Invalid request data";

/// A request body that can be checked and turned into service input
pub trait Payload: Validate {
    /// Service-level input produced on success
    type Output;

    /// Normalizes fields in place before validation
    fn normalize(&mut self) {}

    /// Converts a validated payload
    fn into_output(self) -> Self::Output;
}

/// Normalizes, validates and converts a payload
///
/// # Errors
///
/// Returns `AppError::Validation` listing every violation
pub fn check<P: Payload>(mut payload: P) -> AppResult<P::Output> {
    payload.normalize();
    payload.validate()?;
    Ok(payload.into_output())
}

/// Builds the error for a body that could not be parsed at all
pub fn body_error(msg: impl Into<String>) -> AppError {
    AppError::validation(VALIDATION_MESSAGE).with_detail(
        "validation_errors",
        json!([{ "loc": ["body"], "msg": msg.into(), "type": "json_invalid" }]),
    )
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut entries: Vec<(String, Value)> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |err| {
                    let msg = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string());
                    let entry = json!({ "loc": [field.clone()], "msg": msg, "type": err.code });
                    (field.clone(), entry)
                })
            })
            .collect();

        entries.sort_by(|a, b| a.0.cmp(&b.0));

        AppError::validation(VALIDATION_MESSAGE).with_detail(
            "validation_errors",
            Value::Array(entries.into_iter().map(|(_, entry)| entry).collect()),
        )
    }
}

fn trim_in_place(value: &mut Option<String>) {
    if let Some(s) = value {
        let trimmed = s.trim();
        if trimmed.len() != s.len() {
            *s = trimmed.to_string();
        }
    }
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Distinguishes an absent field from an explicit `null`
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "Username is required"),
        length(min = 3, max = 80, message = "Username must be between 3 and 80 characters")
    )]
    pub username: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: Option<String>,
}

/// Validated registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Payload for RegisterRequest {
    type Output = Registration;

    fn normalize(&mut self) {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.email);
    }

    fn into_output(self) -> Registration {
        Registration {
            username: self.username.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required(message = "Username is required"))]
    pub username: Option<String>,

    #[validate(required(message = "Password is required"))]
    pub password: Option<String>,
}

/// Validated login input
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Payload for LoginRequest {
    type Output = Credentials;

    fn normalize(&mut self) {
        trim_in_place(&mut self.username);
    }

    fn into_output(self) -> Credentials {
        Credentials {
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        required(message = "Title is required"),
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters")
    )]
    pub title: Option<String>,

    pub description: Option<String>,

    pub completed: Option<bool>,
}

/// Validated task creation input
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl Payload for CreateTaskRequest {
    type Output = NewTask;

    fn normalize(&mut self) {
        trim_in_place(&mut self.title);
    }

    fn into_output(self) -> NewTask {
        NewTask {
            title: self.title.unwrap_or_default(),
            description: self.description,
            completed: self.completed.unwrap_or(false),
        }
    }
}

/// Partial task update
///
/// `title: null` is rejected; `description: null` clears the description;
/// `completed: null` is the same as leaving it out.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub completed: Option<bool>,
}

impl Validate for UpdateTaskRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match &self.title {
            Some(None) => errors.add("title", field_error("null", "Title cannot be null")),
            Some(Some(title)) => {
                let len = title.chars().count();
                if !(1..=200).contains(&len) {
                    errors.add(
                        "title",
                        field_error("length", "Title must be between 1 and 200 characters"),
                    );
                }
            }
            None => {}
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Payload for UpdateTaskRequest {
    type Output = UpdateTask;

    fn normalize(&mut self) {
        if let Some(title) = &mut self.title {
            trim_in_place(title);
        }
    }

    fn into_output(self) -> UpdateTask {
        UpdateTask {
            title: self.title.flatten(),
            description: self.description,
            completed: self.completed,
        }
    }
}
