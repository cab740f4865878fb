use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    cookie,
    dto::{
        ApiResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
        UserData, UserDataResponse, VerifyEmailRequest,
    },
    extractors::{AppJson, AuthUser},
    otp::OtpPurpose,
    password,
};
use crate::{error::AuthError, mailer, state::AppState, store::NewUser};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/send-verify-otp", post(send_verify_otp))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/is-auth", get(is_authenticated))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user/data", get(user_data))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed, non-empty request field.
fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(CookieJar, Json<ApiResponse>), AuthError> {
    let (Some(name), Some(email), Some(password)) = (
        required(&payload.name),
        required(&payload.email),
        required(&payload.password),
    ) else {
        return Err(AuthError::Validation("Missing details".into()));
    };
    let email = email.to_lowercase();

    if !is_valid_email(&email) {
        return Err(AuthError::Validation("Invalid email".into()));
    }
    if password.len() < 8 {
        return Err(AuthError::Validation("Password too short".into()));
    }

    if state.store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "registration for existing email");
        return Err(AuthError::Conflict);
    }

    let hash = password::hash_password(password)?;
    let user = state
        .store
        .create(NewUser {
            name: name.to_owned(),
            email,
            password_hash: hash,
        })
        .await?;

    let token = state.keys.issue(user.id)?;
    let jar = jar.add(cookie::session_cookie(
        token.clone(),
        state.config.cookie_secure,
        state.keys.ttl(),
    ));

    mailer::send_best_effort(
        state.mailer.clone(),
        state.mail_timeout(),
        mailer::welcome_email(&user.email),
    );

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((jar, Json(ApiResponse::ok().with_token(token))))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse>), AuthError> {
    let (Some(email), Some(password)) = (required(&payload.email), required(&payload.password))
    else {
        return Err(AuthError::Validation(
            "Email and password are required".into(),
        ));
    };
    let email = email.to_lowercase();

    // One error shape for unknown email and wrong password, so responses do
    // not reveal which emails are registered.
    let user = state
        .store
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password::verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = state.keys.issue(user.id)?;
    let jar = jar.add(cookie::session_cookie(
        token.clone(),
        state.config.cookie_secure,
        state.keys.ttl(),
    ));

    info!(user_id = %user.id, "user logged in");
    Ok((jar, Json(ApiResponse::ok().with_token(token))))
}

/// Stateless logout: the token stays valid until it expires on its own, the
/// client just loses the cookie.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse>) {
    let jar = jar.remove(cookie::clear_session_cookie(state.config.cookie_secure));
    (jar, Json(ApiResponse::ok().with_message("Logged out")))
}

#[instrument(skip_all)]
pub async fn send_verify_otp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ApiResponse>, AuthError> {
    let mut user = state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    if user.is_verified {
        return Err(AuthError::AlreadyVerified);
    }

    let code = state.otp.issue(&mut user, OtpPurpose::AccountVerify);
    state.store.save(&user).await?;

    mailer::send_best_effort(
        state.mailer.clone(),
        state.mail_timeout(),
        mailer::verify_otp_email(&user.email, &code),
    );

    info!(user_id = %user.id, "verification OTP issued");
    Ok(Json(
        ApiResponse::ok().with_message("Verification OTP sent to email"),
    ))
}

#[instrument(skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<VerifyEmailRequest>,
) -> Result<Json<ApiResponse>, AuthError> {
    let Some(otp) = required(&payload.otp) else {
        return Err(AuthError::Validation("Missing details".into()));
    };

    let mut user = state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    match state.otp.verify(&mut user, OtpPurpose::AccountVerify, otp) {
        Ok(()) => {
            user.is_verified = true;
            state.store.save(&user).await?;
            info!(user_id = %user.id, "email verified");
            Ok(Json(
                ApiResponse::ok().with_message("Email verified successfully"),
            ))
        }
        Err(e) => {
            // Expiry consumes the challenge; persist that before reporting.
            state.store.save(&user).await?;
            Err(e.into())
        }
    }
}

#[instrument(skip_all)]
pub async fn is_authenticated(AuthUser(_user_id): AuthUser) -> Json<ApiResponse> {
    Json(ApiResponse::ok())
}

#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse>, AuthError> {
    let Some(email) = required(&payload.email) else {
        return Err(AuthError::Validation("Email is required".into()));
    };
    let email = email.to_lowercase();

    let mut user = state
        .store
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::NotFound)?;

    let code = state.otp.issue(&mut user, OtpPurpose::PasswordReset);
    state.store.save(&user).await?;

    mailer::send_best_effort(
        state.mailer.clone(),
        state.mail_timeout(),
        mailer::reset_otp_email(&user.email, &code),
    );

    info!(user_id = %user.id, "password reset OTP issued");
    Ok(Json(
        ApiResponse::ok().with_message("Password reset OTP sent to email"),
    ))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse>, AuthError> {
    let (Some(email), Some(otp), Some(new_password)) = (
        required(&payload.email),
        required(&payload.otp),
        required(&payload.new_password),
    ) else {
        return Err(AuthError::Validation(
            "Email, OTP and new password are required".into(),
        ));
    };
    let email = email.to_lowercase();

    let mut user = state
        .store
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::NotFound)?;

    match state.otp.verify(&mut user, OtpPurpose::PasswordReset, otp) {
        Ok(()) => {
            user.password_hash = password::hash_password(new_password)?;
            state.store.save(&user).await?;
            info!(user_id = %user.id, "password reset");
            Ok(Json(
                ApiResponse::ok().with_message("Password reset successfully"),
            ))
        }
        Err(e) => {
            state.store.save(&user).await?;
            Err(e.into())
        }
    }
}

#[instrument(skip_all)]
pub async fn user_data(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserDataResponse>, AuthError> {
    let user = state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    Ok(Json(UserDataResponse {
        success: true,
        user_data: UserData {
            name: user.name,
            email: user.email,
            is_account_verified: user.is_verified,
        },
    }))
}

pub async fn health() -> Json<ApiResponse> {
    Json(ApiResponse::ok().with_message("Backend server is running"))
}
