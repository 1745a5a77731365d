use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use crate::{config::Config, database::UserRepository, services::auth_service};
use crate::services::auth_service::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    ResetPasswordRequest, VerifyEmailRequest, VerifyTokenResponse,
};
use crate::utils::AppError;

fn email_of(email: &Option<String>) -> &str {
    email.as_deref().unwrap_or("N/A")
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Unknown account, wrong password or unverified email")
    )
)]
pub async fn login(
    repo: web::Data<UserRepository>,
    config: web::Data<Config>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    let email = email_of(&request.email);
    log::info!("🔐 POST /api/login - email: {}", email);

    match auth_service::login(&repo, &config, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered, email verification pending", body = MessageResponse),
        (status = 400, description = "Missing fields or email already registered")
    )
)]
pub async fn register(
    repo: web::Data<UserRepository>,
    config: web::Data<Config>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    let email = email_of(&request.email);
    log::info!("📝 POST /api/register - email: {}", email);

    match auth_service::register(&repo, &config, &request).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/forgot",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset code issued (same answer for unknown emails)", body = MessageResponse),
        (status = 400, description = "Email missing")
    )
)]
pub async fn forgot_password(
    repo: web::Data<UserRepository>,
    config: web::Data<Config>,
    request: web::Json<ForgotPasswordRequest>,
) -> HttpResponse {
    log::info!("🔁 POST /api/forgot - email: {}", email_of(&request.email));

    match auth_service::forgot_password(&repo, &config, &request).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("❌ Forgot password failed: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/reset-password",
    tag = "Auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Missing fields, unknown user, wrong or expired code")
    )
)]
pub async fn reset_password(
    repo: web::Data<UserRepository>,
    config: web::Data<Config>,
    request: web::Json<ResetPasswordRequest>,
) -> HttpResponse {
    let email = email_of(&request.email);
    log::info!("🔑 POST /api/reset-password - email: {}", email);

    match auth_service::reset_password(&repo, &config, &request).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("❌ Password reset failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/verify",
    tag = "Auth",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Missing fields, unknown user or wrong code")
    )
)]
pub async fn verify_email(
    repo: web::Data<UserRepository>,
    config: web::Data<Config>,
    request: web::Json<VerifyEmailRequest>,
) -> HttpResponse {
    let email = email_of(&request.email);
    log::info!("📧 POST /api/verify - email: {}", email);

    match auth_service::verify_email(&repo, &config, &request).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("❌ Email verification failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = VerifyTokenResponse),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_token(config: web::Data<Config>, req: HttpRequest) -> HttpResponse {
    log::info!("✓ GET /api/auth/verify");

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return AppError::Unauthorized("No valid Authorization header".to_string())
            .error_response();
    };

    match auth_service::verify_token(&config, token) {
        Ok(claims) => {
            log::info!("✅ Token valid for user: {}", claims.sub);
            HttpResponse::Ok().json(VerifyTokenResponse {
                valid: true,
                email: claims.sub,
                exp: claims.exp,
            })
        }
        Err(e) => {
            log::warn!("❌ Invalid token: {}", e);
            e.error_response()
        }
    }
}
