use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};
use serde::Serialize;

use crate::error::PropertyError;

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<Body>, LambdaError> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(body)?.into())
        .map_err(Box::new)?)
}

/// `{"error": message}` with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Result<Response<Body>, LambdaError> {
    json_response(status, &serde_json::json!({ "error": message }))
}

/// The single mapping from domain failures to HTTP responses.
pub fn property_error_response(err: &PropertyError) -> Result<Response<Body>, LambdaError> {
    match err {
        PropertyError::Validation(message) => error_response(StatusCode::BAD_REQUEST, message),
        PropertyError::NotFound(_) => error_response(StatusCode::NOT_FOUND, &err.to_string()),
        PropertyError::Storage(_) | PropertyError::Persistence(_) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &serde_json::json!({ "error": "Server Error", "details": err.to_string() }),
        ),
    }
}

pub fn not_found() -> Result<Response<Body>, LambdaError> {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

pub fn method_not_allowed() -> Result<Response<Body>, LambdaError> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
