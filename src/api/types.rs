use serde::{Deserialize, Serialize};

use crate::models::{Department, Identity, IdentityKind, Module};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// A user record as exposed to admins. Never carries hashes.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub kind: IdentityKind,
    pub cpf: String,
    pub active: bool,
    pub admin: bool,
    pub modules: Vec<Module>,
    pub department_ids: Vec<String>,
}

impl From<Identity> for UserDto {
    fn from(user: Identity) -> Self {
        let mut modules: Vec<Module> = user.modules.into_iter().collect();
        modules.sort_by_key(|m| m.as_str());

        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            kind: user.kind,
            cpf: user.cpf,
            active: user.active,
            admin: user.admin,
            modules,
            department_ids: user.department_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DepartmentDto {
    pub id: String,
    pub name: String,
    pub plex_url: Option<String>,
    pub grd_url: Option<String>,
    pub ugb_url: Option<String>,
}

impl From<Department> for DepartmentDto {
    fn from(dept: Department) -> Self {
        Self {
            id: dept.id,
            name: dept.name,
            plex_url: dept.plex_url,
            grd_url: dept.grd_url,
            ugb_url: dept.ugb_url,
        }
    }
}

/// Department entry in the navigation payload: id, name and which modules
/// have a report configured. Holding this never implies access; every embed
/// request is re-authorized.
#[derive(Debug, Serialize)]
pub struct NavigationDepartment {
    pub id: String,
    pub name: String,
    pub configured_modules: Vec<Module>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub admin: bool,
    pub modules: Vec<Module>,
    pub departments: Vec<NavigationDepartment>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
    #[serde(default)]
    pub cpf: String,
}

#[derive(Debug, Serialize)]
pub struct ResetRequestResponse {
    /// Relative URL the user follows to set a new password; the reset token
    /// travels as its query parameter.
    pub reset_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetCodeRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetCodeIssued {
    /// Shown exactly once; only the hash is stored.
    pub code: String,
    pub email: String,
    pub expires_at: String,
}

#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub kind: IdentityKind,
    #[serde(default)]
    pub cpf: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub department_ids: Vec<String>,
    /// Optional on create: when absent a strong temporary password is
    /// generated and returned once. Optional on update: absent keeps the
    /// current password.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    #[serde(flatten)]
    pub user: UserDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentPayload {
    pub name: String,
    #[serde(default)]
    pub plex_url: Option<String>,
    #[serde(default)]
    pub grd_url: Option<String>,
    #[serde(default)]
    pub ugb_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
