//! Admin user management. All routes sit behind the admin middleware.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{Duration, Utc};
use std::sync::Arc;

use super::types::{CreatedUserResponse, MessageResponse, ResetCodeIssued, UserDto, UserPayload};
use super::validation::{validate_cpf, validate_email, validate_name, validate_password};
use super::{ApiError, ApiResponse, AppState};
use crate::auth::credentials;
use crate::models::{Identity, IdentityKind};

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<UserDto>>> {
    let users = state
        .store()
        .list_users()
        .await
        .into_iter()
        .map(UserDto::from)
        .collect();
    Json(ApiResponse::success(users))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .store()
        .get_user(&id)
        .await
        .ok_or_else(|| ApiError::not_found("User", &id))?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /api/admin/users
/// Password is optional: when absent a strong temporary password is generated
/// and returned exactly once.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<ApiResponse<CreatedUserResponse>>, ApiError> {
    let name = validate_name(&payload.name)?.to_string();
    let email = validate_email(&payload.email)?;

    if state.store().email_taken(&email, None).await {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let cpf = normalized_cpf(&payload, None, state.store()).await?;

    let (plain_password, temp_password) = match payload
        .password
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        Some(p) => {
            validate_password(p)?;
            (p.to_string(), None)
        }
        None => {
            let generated = credentials::generate_temp_password();
            (generated.clone(), Some(generated))
        }
    };

    let security = state.config().read().await.security.clone();
    let password_hash = credentials::hash_password(plain_password, security)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let user = Identity {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        email,
        kind: payload.kind,
        cpf,
        active: payload.active,
        admin: payload.admin,
        modules: payload.modules.into_iter().collect(),
        department_ids: payload.department_ids,
        password_hash,
        reset_code_hash: None,
        reset_code_expires_at: None,
    };

    state
        .store()
        .insert_user(user.clone())
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    tracing::info!(identity = %user.id, "user created");

    Ok(Json(ApiResponse::success(CreatedUserResponse {
        user: user.into(),
        temp_password,
    })))
}

/// PUT /api/admin/users/{id}
/// Password changes only when a new one is supplied; reset-code state is
/// preserved untouched.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let mut user = state
        .store()
        .get_user(&id)
        .await
        .ok_or_else(|| ApiError::not_found("User", &id))?;

    let name = validate_name(&payload.name)?.to_string();
    let email = validate_email(&payload.email)?;

    if state.store().email_taken(&email, Some(&id)).await {
        return Err(ApiError::conflict("Email is already registered to another user"));
    }

    let cpf = normalized_cpf(&payload, Some(&id), state.store()).await?;

    if let Some(new_password) = payload
        .password
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        validate_password(new_password)?;
        let security = state.config().read().await.security.clone();
        user.password_hash = credentials::hash_password(new_password.to_string(), security)
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?;
    }

    user.name = name;
    user.email = email;
    user.kind = payload.kind;
    user.cpf = cpf;
    user.active = payload.active;
    user.admin = payload.admin;
    user.modules = payload.modules.into_iter().collect();
    user.department_ids = payload.department_ids;

    state
        .store()
        .update_user(user.clone())
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let removed = state
        .store()
        .delete_user(&id)
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    if !removed {
        return Err(ApiError::not_found("User", &id));
    }

    tracing::info!(identity = %id, "user deleted");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "User deleted".to_string(),
    })))
}

/// POST /api/admin/users/{id}/reset-code
/// Issues a fresh one-time reset code for a PJ identity. The plaintext is
/// returned here and nowhere else; issuing again replaces any older code.
pub async fn issue_reset_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ResetCodeIssued>>, ApiError> {
    let user = state
        .store()
        .get_user(&id)
        .await
        .ok_or_else(|| ApiError::not_found("User", &id))?;

    if user.kind != IdentityKind::Pj {
        return Err(ApiError::validation("Reset codes are only for PJ users"));
    }

    let code = credentials::generate_reset_code();

    let config = state.config().read().await;
    let security = config.security.clone();
    let expires_at = Utc::now() + Duration::minutes(config.auth.reset_ttl_minutes);
    drop(config);

    let code_hash = credentials::hash_password(code.clone(), security)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    state
        .store()
        .set_reset_code(&user.id, Some(code_hash), Some(expires_at))
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    tracing::info!(identity = %user.id, "reset code issued");

    Ok(Json(ApiResponse::success(ResetCodeIssued {
        code,
        email: user.email,
        expires_at: expires_at.to_rfc3339(),
    })))
}

/// CPF rules: mandatory, 11 digits and unique for EFETIVO; always empty
/// for PJ.
async fn normalized_cpf(
    payload: &UserPayload,
    exclude_id: Option<&str>,
    store: &crate::store::Store,
) -> Result<String, ApiError> {
    match payload.kind {
        IdentityKind::Efetivo => {
            let cpf = validate_cpf(&payload.cpf)?;
            if store.cpf_taken(&cpf, exclude_id).await {
                return Err(ApiError::conflict("CPF is already registered to another user"));
            }
            Ok(cpf)
        }
        IdentityKind::Pj => Ok(String::new()),
    }
}
