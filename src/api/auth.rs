//! Acting-staff resolution and permission checks.
//!
//! Callers identify themselves with the `x-staff-id` header. Authentication
//! happens upstream; this layer only decides what the identified staff may do.

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::{async_trait, Json};
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::AppState;
use crate::db::repo::is_unique_violation;
use crate::domain::{Permission, PermissionOverrides, Role, Staff, StaffId};
use crate::error::AppError;

pub const STAFF_HEADER: &str = "x-staff-id";

/// The staff member performing the request.
#[derive(Debug, Clone)]
pub struct ActingStaff(pub Staff);

impl ActingStaff {
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.0.can(permission) {
            return Ok(());
        }
        warn!(staff_id = %self.0.id, ?permission, "permission denied");
        Err(AppError::Forbidden(format!(
            "{} is not allowed to {:?}",
            self.0.name, permission
        )))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ActingStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(STAFF_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", STAFF_HEADER)))?;
        let id = raw
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("invalid {} header", STAFF_HEADER)))?;

        let staff = state
            .repo
            .get_staff(StaffId::new(id))
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown staff member".into()))?;
        Ok(ActingStaff(staff))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRequest {
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub custom_permissions: PermissionOverrides,
}

pub async fn create_staff(
    State(state): State<AppState>,
    acting: ActingStaff,
    Json(req): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<Staff>), AppError> {
    if acting.0.role != Role::Admin {
        return Err(AppError::Forbidden("only administrators manage staff".into()));
    }
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let staff = state
        .repo
        .insert_staff(name, req.role, &req.custom_permissions)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("staff member {} already exists", name))
            } else {
                e.into()
            }
        })?;

    info!(staff_id = %staff.id, role = staff.role.as_str(), "staff member created");
    Ok((StatusCode::CREATED, Json(staff)))
}
