// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ModUsuarios, RequireModule},
        recinto::RecintoContext,
    },
    models::{
        auth::{Role, User},
        department::AssignDepartmentPayload,
    },
    services::rbac_service::ensure_role,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRolePayload {
    #[schema(example = "Calidad")]
    pub role: Role,
}

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Usuários do recinto", body = Vec<User>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModUsuarios>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, &[Role::Administrador]).map_err(|e| e.to_api_error(&locale))?;

    let users = app_state
        .user_service
        .list(recinto.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(users))
}

// PUT /api/users/{uid}/role
#[utoipa::path(
    put,
    path = "/api/users/{uid}/role",
    tag = "Users",
    request_body = UpdateRolePayload,
    params(("uid" = String, Path, description = "UID do usuário")),
    responses(
        (status = 200, description = "Papel atualizado", body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModUsuarios>,
    Path(uid): Path<String>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, &[Role::Administrador]).map_err(|e| e.to_api_error(&locale))?;

    let updated = app_state
        .user_service
        .update_role(recinto.0, &uid, payload.role)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(updated))
}

// PUT /api/users/{uid}/department
#[utoipa::path(
    put,
    path = "/api/users/{uid}/department",
    tag = "Users",
    request_body = AssignDepartmentPayload,
    params(("uid" = String, Path, description = "UID do usuário")),
    responses(
        (status = 200, description = "Departamento atribuído", body = User),
        (status = 404, description = "Usuário ou departamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_department(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModUsuarios>,
    Path(uid): Path<String>,
    Json(payload): Json<AssignDepartmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, &[Role::Administrador]).map_err(|e| e.to_api_error(&locale))?;

    let updated = app_state
        .user_service
        .assign_department(recinto.0, &uid, payload.department_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(updated))
}

// PUT /api/users/me/department
#[utoipa::path(
    put,
    path = "/api/users/me/department",
    tag = "Users",
    request_body = AssignDepartmentPayload,
    responses(
        (status = 200, description = "Departamento selecionado", body = User),
        (status = 403, description = "Departamento já selecionado")
    ),
    security(("api_jwt" = []))
)]
pub async fn select_my_department(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AssignDepartmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state
        .user_service
        .select_own_department(&user, payload.department_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(updated))
}
