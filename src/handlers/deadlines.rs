// src/handlers/deadlines.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ModTiempos, RequireModule},
        recinto::RecintoContext,
    },
    models::{
        auth::Role,
        deadline::{DeadlineConfig, UnlockPayload, UpdateDeadlinePayload},
    },
    services::rbac_service::ensure_role,
};

const MANAGERS: &[Role] = &[Role::Administrador, Role::Calidad];

// GET /api/deadlines
#[utoipa::path(
    get,
    path = "/api/deadlines",
    tag = "Deadlines",
    responses((status = 200, description = "Prazo e liberações do recinto", body = DeadlineConfig)),
    security(("api_jwt" = []))
)]
pub async fn get_deadline(
    State(app_state): State<AppState>,
    locale: Locale,
    recinto: RecintoContext,
) -> Result<impl IntoResponse, ApiError> {
    let config = app_state
        .deadline_service
        .get(recinto.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(config))
}

// PUT /api/deadlines
#[utoipa::path(
    put,
    path = "/api/deadlines",
    tag = "Deadlines",
    request_body = UpdateDeadlinePayload,
    responses(
        (status = 200, description = "Prazo gravado", body = DeadlineConfig),
        (status = 403, description = "Sem acesso")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_deadline(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModTiempos>,
    Json(payload): Json<UpdateDeadlinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, MANAGERS).map_err(|e| e.to_api_error(&locale))?;

    let config = app_state
        .deadline_service
        .set_fecha_limite(recinto.0, payload.fecha_limite)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(config))
}

// PUT /api/deadlines/unlocks/{department_id}
#[utoipa::path(
    put,
    path = "/api/deadlines/unlocks/{department_id}",
    tag = "Deadlines",
    request_body = UnlockPayload,
    params(("department_id" = Uuid, Path, description = "ID do departamento")),
    responses(
        (status = 200, description = "Liberação gravada", body = DeadlineConfig),
        (status = 404, description = "Departamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_unlock(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    recinto: RecintoContext,
    _guard: RequireModule<ModTiempos>,
    Path(department_id): Path<Uuid>,
    Json(payload): Json<UnlockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(user.role, MANAGERS).map_err(|e| e.to_api_error(&locale))?;

    let config = app_state
        .deadline_service
        .set_unlocked(recinto.0, department_id, payload.unlocked)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(config))
}
