// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ModRoles, RequireModule},
        recinto::RecintoContext,
    },
    models::{
        auth::Role,
        rbac::{PermissionMatrix, RoleInfo, UpdatePermissionsPayload},
    },
    services::rbac_service::ensure_role,
};

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "RBAC",
    responses((status = 200, description = "Catálogo de papéis", body = Vec<RoleInfo>)),
    security(("api_jwt" = []))
)]
pub async fn list_roles(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.rbac_service.roles())
}

// GET /api/roles/permissions
#[utoipa::path(
    get,
    path = "/api/roles/permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Matriz de permissões do recinto", body = PermissionMatrix),
        (status = 403, description = "Sem acesso")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_matrix(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModRoles>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, &[Role::Administrador, Role::Calidad]).map_err(|e| e.to_api_error(&locale))?;

    let matrix = app_state
        .rbac_service
        .matrix(recinto.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(matrix))
}

// PUT /api/roles/{role}/permissions
#[utoipa::path(
    put,
    path = "/api/roles/{role}/permissions",
    tag = "RBAC",
    request_body = UpdatePermissionsPayload,
    params(("role" = Role, Path, description = "Papel (Usuario, Calidad, Administrador)")),
    responses(
        (status = 200, description = "Módulos visíveis do papel (módulo -> visível)"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_role_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModRoles>,
    Path(role): Path<Role>,
    Json(payload): Json<UpdatePermissionsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, &[Role::Administrador]).map_err(|e| e.to_api_error(&locale))?;

    let modules = app_state
        .rbac_service
        .update_role_permissions(recinto.0, role, &payload.modules)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(modules))
}
