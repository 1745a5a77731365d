use crate::{
    config::Config,
    database::UserRepository,
    models::{User, UserSummary},
    utils::{generate_reset_code, now_millis, AppError},
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // email
    pub name: String,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub iss: String,           // issuer
}

// Request/Response structures
// Fields are optional so that a missing one becomes a 400 with our message
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub code: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VerifyEmailRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    pub email: String,
    pub exp: usize,
}

/// Non-blank value of an optional request field
fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Like `required`, but keeps surrounding whitespace (passwords)
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn incomplete() -> AppError {
    AppError::InvalidRequest("Incomplete information".to_string())
}

fn is_bcrypt_hash(stored: &str) -> bool {
    stored.len() == 60
        && (stored.starts_with("$2a$") || stored.starts_with("$2b$") || stored.starts_with("$2y$"))
}

/// Checks a password against the stored value. Returns `(valid, legacy)`
/// where `legacy` means the stored value was plaintext.
fn check_password(candidate: &str, stored: &str) -> Result<(bool, bool), AppError> {
    if is_bcrypt_hash(stored) {
        Ok((verify(candidate, stored)?, false))
    } else {
        Ok((candidate == stored, true))
    }
}

// Generate JWT token
pub fn generate_jwt(config: &Config, user: &User) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        name: format!("{} {}", user.first_name, user.last_name).trim().to_string(),
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
        iss: config.jwt_issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(config: &Config, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);

    let mut issuers = HashSet::new();
    issuers.insert(config.jwt_issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

// User login
pub async fn login(
    repo: &UserRepository,
    config: &Config,
    request: &LoginRequest,
) -> Result<LoginResponse, AppError> {
    let (email, password) = match (required(&request.email), request.password.as_deref()) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(incomplete()),
    };

    let user = repo
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::InvalidRequest("Account does not exist".to_string()))?;

    let (valid, legacy) = check_password(password, &user.password)?;
    if !valid {
        return Err(AppError::InvalidRequest("Incorrect email or password".to_string()));
    }

    if !user.email_verified {
        return Err(AppError::InvalidRequest(
            "Email not verified, please check your inbox".to_string(),
        ));
    }

    if legacy {
        let hashed = hash(password, config.bcrypt_cost)?;
        upgrade_legacy_password(repo, email, password, hashed).await?;
    }

    Ok(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token: generate_jwt(config, &user)?,
        user: UserSummary::from(&user),
    })
}

/// Replaces a plaintext password with its hash, unless the record changed
/// since it was read (e.g. a reset committed in between)
async fn upgrade_legacy_password(
    repo: &UserRepository,
    email: &str,
    plaintext: &str,
    hashed: String,
) -> Result<bool, AppError> {
    let upgraded = repo
        .update(email, |u| {
            if u.password != plaintext {
                return Ok(false);
            }
            u.password = hashed;
            Ok(true)
        })
        .await?;

    if upgraded {
        log::info!("🔒 Upgraded plaintext password to bcrypt: {}", email);
    } else {
        log::debug!("Password for {} changed before upgrade, left as is", email);
    }
    Ok(upgraded)
}

// User registration (account starts unverified)
pub async fn register(
    repo: &UserRepository,
    config: &Config,
    request: &RegisterRequest,
) -> Result<MessageResponse, AppError> {
    let (last_name, first_name, email, password) = match (
        required(&request.last_name),
        required(&request.first_name),
        required(&request.email),
        present(&request.password),
    ) {
        (Some(l), Some(f), Some(e), Some(p)) => (l, f, e, p),
        _ => return Err(incomplete()),
    };

    if repo.find_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let now = now_millis();
    let new_user = User {
        id: 0,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        password: hash(password, config.bcrypt_cost)?,
        email_verified: false,
        reset_code: None,
        reset_code_expiry: None,
        created_at: Some(now),
        updated_at: Some(now),
        extra: Default::default(),
    };

    // insert re-checks uniqueness under the lock
    let created = repo.insert(new_user).await?;
    log::info!("✅ User registered: {} (id {})", created.email, created.id);
    log::info!("📧 Activation email queued for {}", created.email);

    Ok(MessageResponse::ok(
        "Registration successful, please verify your email before logging in",
    ))
}

// Forgot password: issues a reset code valid for `reset_code_ttl_minutes`
pub async fn forgot_password(
    repo: &UserRepository,
    config: &Config,
    request: &ForgotPasswordRequest,
) -> Result<MessageResponse, AppError> {
    let email = required(&request.email)
        .ok_or_else(|| AppError::InvalidRequest("Please enter your email address".to_string()))?;

    let code = generate_reset_code();
    let expiry = now_millis() + config.reset_code_ttl_minutes * 60 * 1000;

    let issued = repo
        .update(email, |user| {
            user.reset_code = Some(code.clone());
            user.reset_code_expiry = Some(expiry);
            Ok(())
        })
        .await;

    match issued {
        Ok(()) => {
            // simulated email
            log::info!("📧 Password reset code sent to {}: {}", email, code);
        }
        Err(AppError::NotFound(_)) => {
            log::warn!("⚠️  Password reset requested for unknown email: {}", email);
        }
        Err(e) => return Err(e),
    }

    Ok(MessageResponse::ok(
        "If the email is registered, a reset code has been sent",
    ))
}

// Reset password with a valid, unexpired code
pub async fn reset_password(
    repo: &UserRepository,
    config: &Config,
    request: &ResetPasswordRequest,
) -> Result<MessageResponse, AppError> {
    let (email, code, new_password) = match (
        required(&request.email),
        required(&request.code),
        present(&request.new_password),
    ) {
        (Some(e), Some(c), Some(p)) => (e, c, p),
        _ => return Err(incomplete()),
    };

    // Check the code before paying for a hash
    let user = repo
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::InvalidRequest("User does not exist".to_string()))?;
    check_reset_code(&user, code, now_millis())?;

    let hashed = hash(new_password, config.bcrypt_cost)?;

    // Re-checked under the lock: the code may have been used or replaced meanwhile
    repo.update(email, |user| {
        check_reset_code(user, code, now_millis())?;
        user.password = hashed;
        user.clear_reset_code();
        Ok(())
    })
    .await
    .map_err(user_missing_is_bad_request)?;

    log::info!("🔑 Password reset for {}", email);
    Ok(MessageResponse::ok("Password reset successful"))
}

fn check_reset_code(user: &User, code: &str, now: i64) -> Result<(), AppError> {
    if user.reset_code.as_deref() != Some(code) {
        return Err(AppError::InvalidRequest("Invalid verification code".to_string()));
    }

    if matches!(user.reset_code_expiry, Some(expiry) if now > expiry) {
        return Err(AppError::InvalidRequest(
            "Verification code has expired".to_string(),
        ));
    }

    Ok(())
}

// Email verification against the configured code
pub async fn verify_email(
    repo: &UserRepository,
    config: &Config,
    request: &VerifyEmailRequest,
) -> Result<MessageResponse, AppError> {
    let (email, code) = match (required(&request.email), required(&request.code)) {
        (Some(e), Some(c)) => (e, c),
        _ => return Err(incomplete()),
    };

    repo.update(email, |user| {
        if code != config.verification_code {
            return Err(AppError::InvalidRequest("Invalid verification code".to_string()));
        }
        user.email_verified = true;
        Ok(())
    })
    .await
    .map_err(user_missing_is_bad_request)?;

    log::info!("✅ Email verified: {}", email);
    Ok(MessageResponse::ok("Email verified successfully"))
}

// The form endpoints answer 400 (not 404) for unknown users
fn user_missing_is_bad_request(e: AppError) -> AppError {
    match e {
        AppError::NotFound(msg) => AppError::InvalidRequest(msg),
        other => other,
    }
}
