//! Role areas of the dashboard and the paths that belong to them.

use crate::identity::Role;

/// Path of the login page.
pub const LOGIN_PATH: &str = "/auth/login";

/// Path of the public landing page.
pub const ROOT_PATH: &str = "/";

/// A role-owned path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleArea {
    /// Path prefix owned by the role
    pub prefix: &'static str,
    /// The only role admitted under `prefix`
    pub role: Role,
}

/// Every role-prefixed area, checked in order.
pub const ROLE_AREAS: [RoleArea; 3] = [
    RoleArea {
        prefix: "/admin",
        role: Role::Admin,
    },
    RoleArea {
        prefix: "/teacher",
        role: Role::Teacher,
    },
    RoleArea {
        prefix: "/student",
        role: Role::Student,
    },
];

impl Role {
    /// Landing path of the role's own area.
    pub fn home(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Teacher => "/teacher",
            Role::Student => "/student",
        }
    }
}

/// Returns `true` for paths an unauthenticated visitor may reach.
pub fn is_public(path: &str) -> bool {
    path == ROOT_PATH || path == LOGIN_PATH
}

/// Finds the role area whose prefix `path` starts with.
///
/// Matching is a plain prefix test, so `/administration` also falls in the
/// admin area. Over-matching only ever redirects more requests.
pub fn area_for(path: &str) -> Option<RoleArea> {
    ROLE_AREAS
        .iter()
        .copied()
        .find(|area| path.starts_with(area.prefix))
}

/// Normalises a request path before any gate decision.
///
/// Collapses repeated slashes, drops `.` segments and resolves `..` against
/// the preceding segment. A `..` at the root stays at the root. The result
/// always starts with `/` and never ends with one, except for the root.
///
/// # Examples
///
/// ```
/// use campus_gate::policy::normalize_path;
///
/// assert_eq!(normalize_path("//teacher/../admin/"), "/admin");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}
