// src/handlers/departments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ModDepartamentos, RequireModule},
        recinto::RecintoContext,
    },
    models::{
        auth::Role,
        department::{Department, DepartmentPayload},
    },
    services::rbac_service::ensure_role,
};

const MANAGERS: &[Role] = &[Role::Administrador, Role::Calidad];

// GET /api/departments
#[utoipa::path(
    get,
    path = "/api/departments",
    tag = "Departments",
    responses((status = 200, description = "Departamentos do recinto", body = Vec<Department>)),
    security(("api_jwt" = []))
)]
pub async fn list_departments(
    State(app_state): State<AppState>,
    locale: Locale,
    recinto: RecintoContext,
) -> Result<impl IntoResponse, ApiError> {
    let departments = app_state
        .department_service
        .list(recinto.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(departments))
}

// POST /api/departments
#[utoipa::path(
    post,
    path = "/api/departments",
    tag = "Departments",
    request_body = DepartmentPayload,
    responses(
        (status = 201, description = "Departamento criado", body = Department),
        (status = 409, description = "Nome já existe no recinto")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_department(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModDepartamentos>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, MANAGERS).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let department = app_state
        .department_service
        .create(recinto.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(department)))
}

// PUT /api/departments/{id}
#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    tag = "Departments",
    request_body = DepartmentPayload,
    params(("id" = Uuid, Path, description = "ID do departamento")),
    responses(
        (status = 200, description = "Departamento atualizado", body = Department),
        (status = 404, description = "Departamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_department(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModDepartamentos>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, MANAGERS).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let department = app_state
        .department_service
        .update(recinto.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(department))
}

// DELETE /api/departments/{id}
#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    tag = "Departments",
    params(("id" = Uuid, Path, description = "ID do departamento")),
    responses(
        (status = 204, description = "Departamento removido"),
        (status = 404, description = "Departamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_department(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModDepartamentos>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, MANAGERS).map_err(|e| e.to_api_error(&locale))?;

    app_state
        .department_service
        .delete(recinto.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
