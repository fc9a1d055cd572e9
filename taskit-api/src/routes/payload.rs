/// Request body helpers shared by the user and task handlers
///
/// PATCH bodies are checked key by key before they are deserialized: any key
/// outside the endpoint's allowed list fails the whole request with
/// `400 Invalid updates`, even if the remaining keys are fine. None of the
/// updatable fields is nullable, so an explicit `null` is a 400 as well.

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use axum::{extract::rejection::JsonRejection, Json};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::ValidationError;

/// Message returned when a PATCH body names a field that can't be updated
pub const INVALID_UPDATES: &str = "Invalid updates";

/// Unwraps a JSON body, turning extractor rejections into 400s
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value).map_err(ApiError::from)
}

/// Fails unless every key of `body` is in `allowed`
pub fn ensure_allowed_keys(body: &Map<String, Value>, allowed: &[&str]) -> ApiResult<()> {
    if body.keys().all(|key| allowed.contains(&key.as_str())) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(INVALID_UPDATES.to_string()))
    }
}

/// PATCH body whose keys passed the allow-list check
#[derive(Debug)]
pub struct UpdateBody(Map<String, Value>);

impl UpdateBody {
    /// Deserializes the body into `T`
    ///
    /// Explicit nulls fail with a validation error naming the field;
    /// wrongly typed values with the deserializer's message.
    pub fn parse<T>(self) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let mut nulls: Vec<ValidationErrorDetail> = self
            .0
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(key, _)| ValidationErrorDetail::new(key.as_str(), "must not be null"))
            .collect();

        if !nulls.is_empty() {
            nulls.sort_by(|a, b| a.field.cmp(&b.field));
            return Err(ApiError::ValidationError(nulls));
        }

        serde_json::from_value(Value::Object(self.0)).map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

/// Checks a PATCH body against `allowed` without deserializing it
///
/// Non-object bodies and disallowed keys are rejected with `Invalid updates`.
pub fn update_body(
    body: Result<Json<Value>, JsonRejection>,
    allowed: &[&str],
) -> ApiResult<UpdateBody> {
    let map = match json_body(body)? {
        Value::Object(map) => map,
        _ => return Err(ApiError::BadRequest(INVALID_UPDATES.to_string())),
    };

    ensure_allowed_keys(&map, allowed)?;

    Ok(UpdateBody(map))
}

/// Parses a PATCH body restricted to `allowed` keys into `T`
pub fn parse_update<T>(body: Result<Json<Value>, JsonRejection>, allowed: &[&str]) -> ApiResult<T>
where
    T: DeserializeOwned,
{
    update_body(body, allowed)?.parse()
}

/// Rejects strings that are empty after trimming
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be empty".into());
        return Err(error);
    }
    Ok(())
}
