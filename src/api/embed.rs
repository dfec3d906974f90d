//! The embed gateway: the only place an external report URL ever leaves the
//! system, and only as a redirect after a full authorization decision.

use axum::{
    Extension,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, AppState};
use crate::auth::authorize;
use crate::models::Module;

#[derive(Debug, Deserialize)]
pub struct EmbedQuery {
    #[serde(default)]
    pub dept_id: String,
}

/// GET /embed/{module}?dept_id=…
///
/// Authenticated by the session middleware; authorizes against live identity
/// state and, on Allow, redirects to the department's external report URL.
/// The URL never appears in a response body, and every denial looks the same
/// to the caller; the reason goes to the log, not the wire.
///
/// No side effects: safe to retry and safe to prefetch.
pub async fn view_embed(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(module): Path<String>,
    Query(query): Query<EmbedQuery>,
) -> Response {
    // Malformed input is safe to describe precisely; it says nothing about
    // anyone else's data.
    let Some(module) = Module::parse(&module) else {
        return ApiError::validation(format!("Invalid module: {module}")).into_response();
    };

    let dept_id = query.dept_id.trim();
    if dept_id.is_empty() {
        return ApiError::validation("dept_id is required").into_response();
    }

    let department = state.store().get_department(dept_id).await;

    match authorize(&user, module, dept_id, department.as_ref()) {
        Ok(url) => Redirect::to(url).into_response(),
        Err(reason) => {
            tracing::warn!(
                identity = %user.id,
                module = %module,
                department = %dept_id,
                %reason,
                "embed request denied"
            );
            ApiError::Forbidden.into_response()
        }
    }
}
