use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::auth::dto::ApiResponse;
use crate::auth::otp::OtpError;

/// Domain errors surfaced by the auth operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists")]
    Conflict,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    NotFound,
    #[error("Invalid OTP")]
    InvalidOtp,
    #[error("OTP expired")]
    ExpiredOtp,
    #[error("Account already verified")]
    AlreadyVerified,
    #[error("Not authorized. Please log in again")]
    Unauthorized,
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<OtpError> for AuthError {
    fn from(err: OtpError) -> Self {
        match err {
            // A missing challenge is indistinguishable from a wrong code at
            // the HTTP surface; the engine keeps the distinction for callers
            // that need it.
            OtpError::NotFound | OtpError::Mismatch => AuthError::InvalidOtp,
            OtpError::Expired => AuthError::ExpiredOtp,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(ref cause) = self {
            error!(error = %cause, "request failed");
        }
        // Failures ride the same 200 envelope as successes; clients branch
        // on the `success` flag, not the status line.
        (StatusCode::OK, Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}
