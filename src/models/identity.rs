use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three fixed report modules an identity can be permitted to view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Module {
    Plex,
    Grd,
    Ugb,
}

impl Module {
    pub const ALL: [Self; 3] = [Self::Plex, Self::Grd, Self::Ugb];

    /// Parses a module name case-insensitively. Anything outside the closed
    /// set is rejected here, before it can reach an authorization decision.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(value.trim()))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plex => "PLEX",
            Self::Grd => "GRD",
            Self::Ugb => "UGB",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employment kind. EFETIVO identities carry a mandatory, unique CPF;
/// PJ identities do not and are eligible for the admin-issued reset code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdentityKind {
    Efetivo,
    Pj,
}

/// A portal user record.
///
/// The permitted-module set and the department membership set are independent
/// dimensions: both must pass for an embed to be authorized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    /// Stored lowercase; every lookup normalizes before comparing.
    pub email: String,
    pub kind: IdentityKind,
    /// 11 digits for EFETIVO, empty for PJ.
    #[serde(default)]
    pub cpf: String,
    pub active: bool,
    pub admin: bool,
    #[serde(default)]
    pub modules: HashSet<Module>,
    /// May reference departments that no longer exist; readers filter,
    /// never fail, since department deletion cascades lazily.
    #[serde(default)]
    pub department_ids: Vec<String>,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_code_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_code_expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    #[must_use]
    pub fn has_module(&self, module: Module) -> bool {
        self.modules.contains(&module)
    }

    #[must_use]
    pub fn is_member_of(&self, department_id: &str) -> bool {
        self.department_ids.iter().any(|id| id == department_id)
    }
}
