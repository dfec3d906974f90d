use axum::{
    Extension, Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use super::types::{
    ChangePasswordRequest, LoginRequest, MeResponse, MessageResponse, NavigationDepartment,
    ResetCodeRequest, ResetConfirmRequest, ResetRequest, ResetRequestResponse,
};
use super::validation::{validate_email, validate_password};
use crate::auth::{CredentialError, credentials};
use crate::models::{Identity, Module};
use crate::store::Store;

/// The authenticated identity, loaded fresh from the store on every request.
/// Token claims are authentication evidence only; authorization always reads
/// these live attributes.
#[derive(Clone)]
pub struct CurrentUser(pub Identity);

// ============================================================================
// Middleware
// ============================================================================

/// Session middleware: verifies the cookie token and resolves the identity it
/// names. A valid token whose identity no longer exists is treated exactly
/// like no token at all.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.config().read().await.auth.cookie_name.clone();

    let Some(cookie) = jar.get(&cookie_name) else {
        return login_redirect(jar, &cookie_name);
    };

    let Ok(claims) = state.tokens().verify_session(cookie.value()) else {
        return login_redirect(jar, &cookie_name);
    };

    let Some(identity) = state.store().get_user(&claims.sub).await else {
        return login_redirect(jar, &cookie_name);
    };

    request.extensions_mut().insert(CurrentUser(identity));
    next.run(request).await
}

/// Gate for management operations. Checks the live admin flag, never the
/// token claim, so revoking admin takes effect before the token expires.
pub async fn admin_middleware(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Response {
    if user.active && user.admin {
        next.run(request).await
    } else {
        tracing::warn!(identity = %user.id, "admin endpoint denied");
        ApiError::Forbidden.into_response()
    }
}

/// Every authentication failure ends the same way: cookie cleared, caller
/// sent back to the login page. The reason is never distinguished.
fn login_redirect(jar: CookieJar, cookie_name: &str) -> Response {
    let jar = jar.remove(removal_cookie(cookie_name));
    (jar, Redirect::to("/login")).into_response()
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_owned(), "")).path("/").build()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Verifies credentials and sets the http-only session cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<MeResponse>>), ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let user = credentials::verify(state.store(), &payload.email, &payload.password)
        .await
        .map_err(|e| match e {
            // NotFound and BadCredentials are indistinguishable on purpose.
            CredentialError::NotFound | CredentialError::BadCredentials => {
                ApiError::invalid_credentials()
            }
            CredentialError::Inactive => ApiError::Unauthorized("Account is inactive".to_string()),
            CredentialError::Internal(msg) => ApiError::internal(msg),
        })?;

    let token = state
        .tokens()
        .issue_session(&user.id, user.admin)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let config = state.config().read().await;
    let cookie = Cookie::build((config.auth.cookie_name.clone(), token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.server.secure_cookies)
        .path("/")
        .max_age(time::Duration::hours(config.auth.session_ttl_hours))
        .build();
    drop(config);

    tracing::info!(identity = %user.id, "login succeeded");

    let me = navigation(state.store(), user).await;
    Ok((jar.add(cookie), Json(ApiResponse::success(me))))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    let cookie_name = state.config().read().await.auth.cookie_name.clone();

    (
        jar.remove(removal_cookie(&cookie_name)),
        Json(ApiResponse::success(MessageResponse {
            message: "Logged out".to_string(),
        })),
    )
}

/// GET /api/me
/// Identity summary plus resolved departments for default navigation.
/// Purely informational; embed requests are authorized independently.
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::success(navigation(state.store(), user).await))
}

/// PUT /api/password
/// Changes the caller's own password after re-verifying the current one.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate_password(&payload.new_password)?;

    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    let current_ok = credentials::verify_password(
        user.password_hash.clone(),
        payload.current_password,
    )
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?;

    if !current_ok {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let security = state.config().read().await.security.clone();
    let new_hash = credentials::hash_password(payload.new_password, security)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    state
        .store()
        .set_password_hash(&user.id, new_hash)
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    tracing::info!(identity = %user.id, "password changed");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated".to_string(),
    })))
}

/// POST /auth/reset/request
/// Self-service reset: email plus, when registered, an exactly matching CPF.
/// Every failure collapses into one generic error so the endpoint cannot be
/// used to enumerate accounts.
pub async fn reset_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<ApiResponse<ResetRequestResponse>>, ApiError> {
    let generic = || ApiError::validation("Reset request could not be processed");

    let email = validate_email(&payload.email).map_err(|_| generic())?;

    let user = state
        .store()
        .find_user_by_email(&email)
        .await
        .ok_or_else(generic)?;

    if !user.active {
        return Err(generic());
    }

    if !user.cpf.is_empty() {
        let provided: String = payload.cpf.chars().filter(char::is_ascii_digit).collect();
        if provided != user.cpf {
            return Err(generic());
        }
    }

    let token = state
        .tokens()
        .issue_reset_token(&user.id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::info!(identity = %user.id, "reset token issued");

    Ok(Json(ApiResponse::success(ResetRequestResponse {
        reset_url: format!("/reset-password?token={token}"),
    })))
}

/// POST /auth/reset/confirm
/// Consumes a reset token and sets the new password.
pub async fn reset_confirm(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetConfirmRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid or expired reset token".to_string());

    if payload.new_password != payload.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }
    validate_password(&payload.new_password)?;

    let identity_id = state
        .tokens()
        .verify_reset_token(&payload.token)
        .map_err(|_| invalid())?;

    let user = state.store().get_user(&identity_id).await.ok_or_else(invalid)?;
    if !user.active {
        return Err(invalid());
    }

    let security = state.config().read().await.security.clone();
    let new_hash = credentials::hash_password(payload.new_password, security)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    state
        .store()
        .set_password_hash(&user.id, new_hash)
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    tracing::info!(identity = %user.id, "password reset via token");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated".to_string(),
    })))
}

/// POST /auth/reset/code
/// Consumes an admin-issued reset code (PJ path). The stored hash is cleared
/// on success so a code can never be replayed inside its validity window.
pub async fn reset_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetCodeRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid or expired reset code".to_string());

    if payload.new_password != payload.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }
    validate_password(&payload.new_password)?;

    let email = validate_email(&payload.email).map_err(|_| invalid())?;
    let user = state
        .store()
        .find_user_by_email(&email)
        .await
        .ok_or_else(invalid)?;

    if !user.active {
        return Err(invalid());
    }

    let (Some(code_hash), Some(expires_at)) =
        (user.reset_code_hash.clone(), user.reset_code_expires_at)
    else {
        return Err(invalid());
    };

    if expires_at <= Utc::now() {
        return Err(invalid());
    }

    let code_ok = credentials::verify_password(code_hash, payload.code)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !code_ok {
        return Err(invalid());
    }

    let security = state.config().read().await.security.clone();
    let new_hash = credentials::hash_password(payload.new_password, security)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    // Single use: the code dies with the password change, in one mutation.
    state
        .store()
        .consume_reset_code(&user.id, new_hash)
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    tracing::info!(identity = %user.id, "password reset via admin code");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated".to_string(),
    })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Builds the navigation payload: permitted modules plus the user's
/// departments resolved against the store, silently dropping dangling ids.
async fn navigation(store: &Store, user: Identity) -> MeResponse {
    let mut departments = Vec::new();
    for id in &user.department_ids {
        if let Some(dept) = store.get_department(id).await {
            departments.push(NavigationDepartment {
                id: dept.id.clone(),
                name: dept.name.clone(),
                configured_modules: dept.configured_modules(),
            });
        }
    }

    let mut modules: Vec<Module> = user.modules.iter().copied().collect();
    modules.sort_by_key(|m| m.as_str());

    MeResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        admin: user.admin,
        modules,
        departments,
    }
}
