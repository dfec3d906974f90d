//! The embed authorization decision.
//!
//! A pure function over immutable snapshots: no I/O, no clock, no mutation.
//! Permission and membership are independent dimensions. An identity can
//! hold PLEX permission without belonging to the department that carries the
//! PLEX link, and both checks must pass.

use thiserror::Error;

use crate::models::{Department, Identity, Module};

/// Why a request was denied. Reasons are for internal logging only; the HTTP
/// boundary collapses all of them into one generic response so a caller can
/// never distinguish "not a member" from "no such department".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Deny {
    #[error("identity is inactive")]
    Inactive,

    #[error("module not permitted")]
    NoPermission,

    #[error("not a member of the department")]
    NotMember,

    #[error("department does not exist")]
    DepartmentNotFound,

    #[error("no report configured for this module")]
    NotConfigured,
}

/// Decides whether `identity` may view `module` for `department_id`,
/// short-circuiting on the first failing check.
///
/// The membership check runs against the identity's own list before the
/// department record is even looked at, so a member of department A cannot
/// probe department B's existence by guessing ids. On success the resolved
/// report URL is returned instead of a bare boolean, so a caller cannot
/// authorize and then forget the configuration check.
///
/// Malformed module names never reach this function: [`Module`] is a closed
/// enum rejected at the parse boundary.
pub fn authorize<'a>(
    identity: &Identity,
    module: Module,
    department_id: &str,
    department: Option<&'a Department>,
) -> Result<&'a str, Deny> {
    if !identity.active {
        return Err(Deny::Inactive);
    }

    if !identity.has_module(module) {
        return Err(Deny::NoPermission);
    }

    if department_id.is_empty() || !identity.is_member_of(department_id) {
        return Err(Deny::NotMember);
    }

    let department = department.ok_or(Deny::DepartmentNotFound)?;

    department.report_url(module).ok_or(Deny::NotConfigured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentityKind;
    use std::collections::HashSet;

    const PLEX_URL: &str = "https://reports.example.com/plex/a";

    /// U belongs to department A only and holds PLEX permission only.
    fn identity() -> Identity {
        Identity {
            id: "u1".to_string(),
            name: "U".to_string(),
            email: "u@example.com".to_string(),
            kind: IdentityKind::Efetivo,
            cpf: "12345678901".to_string(),
            active: true,
            admin: false,
            modules: HashSet::from([Module::Plex]),
            department_ids: vec!["dept-a".to_string()],
            password_hash: "x".to_string(),
            reset_code_hash: None,
            reset_code_expires_at: None,
        }
    }

    /// Department A: PLEX configured, GRD and UGB unset.
    fn dept_a() -> Department {
        Department {
            id: "dept-a".to_string(),
            name: "A".to_string(),
            plex_url: Some(PLEX_URL.to_string()),
            grd_url: None,
            ugb_url: None,
        }
    }

    #[test]
    fn test_allow_carries_resolved_url() {
        let u = identity();
        let a = dept_a();
        assert_eq!(authorize(&u, Module::Plex, "dept-a", Some(&a)), Ok(PLEX_URL));
    }

    #[test]
    fn test_inactive_denies_regardless_of_everything_else() {
        let mut u = identity();
        u.active = false;
        let a = dept_a();
        assert_eq!(
            authorize(&u, Module::Plex, "dept-a", Some(&a)),
            Err(Deny::Inactive)
        );
    }

    #[test]
    fn test_missing_permission_denies_even_when_configured() {
        let u = identity();
        let mut a = dept_a();
        a.grd_url = Some("https://reports.example.com/grd/a".to_string());
        assert_eq!(
            authorize(&u, Module::Grd, "dept-a", Some(&a)),
            Err(Deny::NoPermission)
        );
    }

    #[test]
    fn test_permission_check_precedes_configuration_check() {
        // UGB is unset on A, but the denial must still be NoPermission.
        let u = identity();
        let a = dept_a();
        assert_eq!(
            authorize(&u, Module::Ugb, "dept-a", Some(&a)),
            Err(Deny::NoPermission)
        );
    }

    #[test]
    fn test_non_membership_denies_even_with_valid_url() {
        let u = identity();
        let b = Department {
            id: "dept-b".to_string(),
            name: "B".to_string(),
            plex_url: Some("https://reports.example.com/plex/b".to_string()),
            grd_url: None,
            ugb_url: None,
        };
        assert_eq!(
            authorize(&u, Module::Plex, "dept-b", Some(&b)),
            Err(Deny::NotMember)
        );
    }

    #[test]
    fn test_membership_uses_own_list_not_caller_input() {
        // Empty or foreign department ids fail before existence is consulted.
        let u = identity();
        assert_eq!(
            authorize(&u, Module::Plex, "", None),
            Err(Deny::NotMember)
        );
        assert_eq!(
            authorize(&u, Module::Plex, "dept-b", None),
            Err(Deny::NotMember)
        );
    }

    #[test]
    fn test_dangling_membership_yields_department_not_found() {
        let mut u = identity();
        u.department_ids.push("dept-gone".to_string());
        assert_eq!(
            authorize(&u, Module::Plex, "dept-gone", None),
            Err(Deny::DepartmentNotFound)
        );
    }

    #[test]
    fn test_unconfigured_module_denies_after_permission_and_membership() {
        let mut u = identity();
        u.modules.insert(Module::Grd);
        let a = dept_a();
        assert_eq!(
            authorize(&u, Module::Grd, "dept-a", Some(&a)),
            Err(Deny::NotConfigured)
        );
    }

    #[test]
    fn test_blank_url_counts_as_not_configured() {
        let mut u = identity();
        u.modules.insert(Module::Grd);
        let mut a = dept_a();
        a.grd_url = Some("   ".to_string());
        assert_eq!(
            authorize(&u, Module::Grd, "dept-a", Some(&a)),
            Err(Deny::NotConfigured)
        );
    }
}
