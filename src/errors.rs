// src/errors.rs
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestyleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cannot connect to the Bria API: {0}")]
    CannotConnect(String),

    #[error("Bria API error ({status}): {message}")]
    BriaApi {
        status: u16,
        message: String,
        payload: Option<serde_json::Value>,
    },

    #[error("Timed out waiting for {operation} after {attempts} status checks")]
    PollTimeout {
        operation: &'static str,
        attempts: u32,
    },
}

impl ResponseError for RestyleError {
    fn error_response(&self) -> HttpResponse {
        match self {
            RestyleError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": msg
            })),
            RestyleError::ImageProcessing(msg) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Invalid image",
                    "details": msg
                }))
            }
            RestyleError::Configuration(msg) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Service misconfigured",
                    "details": msg
                }))
            }
            RestyleError::CannotConnect(msg) => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "Cannot connect to the Bria API",
                    "details": msg
                }))
            }
            RestyleError::BriaApi {
                status,
                message,
                payload,
            } => {
                // Relay Bria's own status code to the caller.
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                let mut body = serde_json::json!({
                    "error": message
                });
                if let Some(payload) = payload {
                    body["briaApiError"] = payload.clone();
                }
                HttpResponse::build(status).json(body)
            }
            RestyleError::PollTimeout { operation, .. } => {
                HttpResponse::GatewayTimeout().json(serde_json::json!({
                    "error": format!("Timed out waiting for {} to complete", operation),
                    "details": self.to_string()
                }))
            }
        }
    }
}
