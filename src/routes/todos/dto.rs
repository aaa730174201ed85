use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ApiError, FieldErrors};
use crate::model::{NewTodo, Todo, TodoChanges, TITLE_MAX_CHARS};

// Fields stay raw JSON so a wrong type becomes a field error instead of a
// body-level rejection, and so `"descriptions": null` is told apart from a
// missing key. Strings are trimmed and an empty description is stored as
// null, the way the original API normalised its input.

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodo {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub descriptions: Option<Value>,
    /// Singular spelling, accepted when `descriptions` is absent.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodo {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub descriptions: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub is_done: Option<Value>,
}

/// Any value that is present, `null` included, becomes `Some`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct TodoList {
    pub todos: Vec<Todo>,
}

#[derive(Debug, Serialize)]
pub struct TodoMessage {
    pub message: &'static str,
    pub todo: Todo,
}

impl CreateTodo {
    pub fn validate(self) -> Result<NewTodo, ApiError> {
        let mut errors = FieldErrors::new();

        let title = match self.title {
            Some(value) => check_title(value, &mut errors),
            None => {
                push(&mut errors, "title", "The title field is required.");
                None
            }
        };
        let description = pick_description(self.descriptions, self.description, &mut errors)
            .and_then(|value| check_description(value, &mut errors))
            .flatten();

        match title {
            Some(title) if errors.is_empty() => Ok(NewTodo { title, description }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

impl UpdateTodo {
    pub fn validate(self) -> Result<TodoChanges, ApiError> {
        let mut errors = FieldErrors::new();

        let title = self.title.and_then(|value| check_title(value, &mut errors));
        let description = pick_description(self.descriptions, self.description, &mut errors)
            .and_then(|value| check_description(value, &mut errors));
        let is_done = self.is_done.and_then(|value| check_done(value, &mut errors));

        if errors.is_empty() {
            Ok(TodoChanges { title, description, is_done })
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Both spellings at once is ambiguous and rejected.
fn pick_description(
    plural: Option<Value>,
    singular: Option<Value>,
    errors: &mut FieldErrors,
) -> Option<Value> {
    match (plural, singular) {
        (Some(_), Some(_)) => {
            push(
                errors,
                "descriptions",
                "The descriptions field cannot be combined with description.",
            );
            None
        }
        (plural, singular) => plural.or(singular),
    }
}

fn check_title(value: Value, errors: &mut FieldErrors) -> Option<String> {
    let title = match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::String(_) | Value::Null => {
            push(errors, "title", "The title field is required.");
            return None;
        }
        _ => {
            push(errors, "title", "The title field must be a string.");
            return None;
        }
    };

    if title.chars().count() > TITLE_MAX_CHARS {
        push(
            errors,
            "title",
            format!("The title field must not be greater than {TITLE_MAX_CHARS} characters."),
        );
        return None;
    }

    Some(title)
}

/// `Some(None)` is an explicit null.
fn check_description(value: Value, errors: &mut FieldErrors) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => {
            let trimmed = s.trim();
            Some((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        _ => {
            push(errors, "descriptions", "The descriptions field must be a string.");
            None
        }
    }
}

/// JSON booleans plus the `1`/`0`/`"1"`/`"0"` forms older clients send.
fn check_done(value: Value, errors: &mut FieldErrors) -> Option<bool> {
    let done = match &value {
        Value::Bool(done) => Some(*done),
        Value::Number(n) => match n.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        },
        _ => None,
    };

    if done.is_none() {
        push(errors, "is_done", "The is_done field must be true or false.");
    }
    done
}
