//! Admin department management.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::types::{DepartmentDto, DepartmentPayload, MessageResponse};
use super::validation::{validate_name, validate_report_url};
use super::{ApiError, ApiResponse, AppState};
use crate::models::Department;

/// GET /api/admin/departments
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<DepartmentDto>>> {
    let departments = state
        .store()
        .list_departments()
        .await
        .into_iter()
        .map(DepartmentDto::from)
        .collect();
    Json(ApiResponse::success(departments))
}

/// GET /api/admin/departments/{id}
pub async fn get_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DepartmentDto>>, ApiError> {
    let department = state
        .store()
        .get_department(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Department", &id))?;
    Ok(Json(ApiResponse::success(department.into())))
}

/// POST /api/admin/departments
pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<Json<ApiResponse<DepartmentDto>>, ApiError> {
    let department = Department {
        id: uuid::Uuid::new_v4().to_string(),
        name: validate_name(&payload.name)?.to_string(),
        plex_url: validate_report_url(payload.plex_url.as_deref())?,
        grd_url: validate_report_url(payload.grd_url.as_deref())?,
        ugb_url: validate_report_url(payload.ugb_url.as_deref())?,
    };

    state
        .store()
        .insert_department(department.clone())
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    tracing::info!(department = %department.id, "department created");

    Ok(Json(ApiResponse::success(department.into())))
}

/// PUT /api/admin/departments/{id}
pub async fn update_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<Json<ApiResponse<DepartmentDto>>, ApiError> {
    if state.store().get_department(&id).await.is_none() {
        return Err(ApiError::not_found("Department", &id));
    }

    let department = Department {
        id,
        name: validate_name(&payload.name)?.to_string(),
        plex_url: validate_report_url(payload.plex_url.as_deref())?,
        grd_url: validate_report_url(payload.grd_url.as_deref())?,
        ugb_url: validate_report_url(payload.ugb_url.as_deref())?,
    };

    state
        .store()
        .update_department(department.clone())
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    Ok(Json(ApiResponse::success(department.into())))
}

/// DELETE /api/admin/departments/{id}
/// Cascades: the id is removed from every identity's membership list.
pub async fn delete_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let removed = state
        .store()
        .delete_department(&id)
        .await
        .map_err(|e| ApiError::StoreError(e.to_string()))?;

    if !removed {
        return Err(ApiError::not_found("Department", &id));
    }

    tracing::info!(department = %id, "department deleted");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Department deleted".to_string(),
    })))
}
