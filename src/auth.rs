//! Staff access control for client search.
//!
//! Sessions are issued elsewhere. The auth gateway in front of this service
//! asserts the staff principal in request headers and proves itself with a
//! shared internal token.
use crate::errors::AppError;
use axum::http::HeaderMap;

pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";
pub const STAFF_ID_HEADER: &str = "x-staff-id";
pub const STAFF_ROLE_HEADER: &str = "x-staff-role";
pub const STAFF_PERMISSIONS_HEADER: &str = "x-staff-permissions";

/// Roles allowed to search client history.
pub const CLIENT_SEARCH_ROLES: &[&str] = &["admin", "manager", "coordinator"];
/// Explicit grant for staff outside those roles.
pub const CLIENT_SEARCH_PERMISSION: &str = "clients:search";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffPrincipal {
    pub staff_id: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl StaffPrincipal {
    pub fn can_search_clients(&self) -> bool {
        CLIENT_SEARCH_ROLES.contains(&self.role.as_str())
            || self.permissions.iter().any(|p| p == CLIENT_SEARCH_PERMISSION)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Extracts the staff principal asserted by the auth gateway.
///
/// When `expected_token` is configured, `X-Internal-Token` must match it.
pub fn authenticate(headers: &HeaderMap, expected_token: Option<&str>) -> Result<StaffPrincipal, AppError> {
    if let Some(expected) = expected_token {
        let token = header(headers, INTERNAL_TOKEN_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing X-Internal-Token header".to_string()))?;

        if !constant_time_compare(token, expected) {
            tracing::warn!("Invalid internal token received");
            return Err(AppError::Unauthorized("Invalid internal token".to_string()));
        }
    }

    let staff_id = header(headers, STAFF_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing staff principal".to_string()))?;
    let role = header(headers, STAFF_ROLE_HEADER).unwrap_or_default();
    let permissions = header(headers, STAFF_PERMISSIONS_HEADER)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Ok(StaffPrincipal {
        staff_id: staff_id.to_string(),
        role: role.to_lowercase(),
        permissions,
    })
}

/// Authenticates the caller and checks the client-search grant.
pub fn authorize_client_search(
    headers: &HeaderMap,
    expected_token: Option<&str>,
) -> Result<StaffPrincipal, AppError> {
    let principal = authenticate(headers, expected_token)?;
    if !principal.can_search_clients() {
        return Err(AppError::Forbidden(format!(
            "Staff {} (role '{}') may not search clients",
            principal.staff_id, principal.role
        )));
    }
    Ok(principal)
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
