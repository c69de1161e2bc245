// Request validation helpers.
//
// - `ValidatedJson<T>` extractor: serde + size enforcement with envelope errors.
// - `ValidatedQuery<T>` extractor: query-string decoding with envelope errors.
// - `require` / `require_present`: the "missing required field" 400s.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Maximum JSON request body in bytes (50 MiB).
pub const MAX_REQUEST_BODY_BYTES: usize = 50 * 1024 * 1024;

/// A JSON body extractor that answers with the error envelope on failure
/// instead of axum's plain-text rejections.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(classify_json_rejection(&rejection).into_response()),
        }
    }
}

fn classify_json_rejection(rejection: &JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large(format!(
            "request body exceeds {MAX_REQUEST_BODY_BYTES} bytes"
        ));
    }

    match rejection {
        JsonRejection::JsonDataError(e) => ApiError::bad_request(format!("invalid JSON payload: {e}")),
        JsonRejection::JsonSyntaxError(e) => ApiError::bad_request(format!("malformed JSON: {e}")),
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("expected Content-Type: application/json")
        }
        other => ApiError::bad_request(format!("request body error: {other}")),
    }
}

/// Query-string counterpart of [`ValidatedJson`].
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ValidatedQuery(value)),
            Err(rejection) => Err(classify_query_rejection(&rejection).into_response()),
        }
    }
}

fn classify_query_rejection(rejection: &QueryRejection) -> ApiError {
    ApiError::bad_request(format!("invalid query string: {}", rejection.body_text()))
}

/// A required string field: absent and empty are both rejected.
pub fn require(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value.filter(|value| !value.is_empty()).ok_or_else(|| ApiError::missing_field(field))
}

/// A required field where an empty value is meaningful (file content).
pub fn require_present<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::missing_field(field))
}
