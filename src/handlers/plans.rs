// src/handlers/plans.rs

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
        rbac::{ModEventos, ModPlanes, RequireModule},
    },
    models::plan::{ActionPlan, CreatePlanPayload, PlanView, UpdatePlanPayload},
};

// POST /api/plans
#[utoipa::path(
    post,
    path = "/api/plans",
    tag = "Plans",
    request_body = CreatePlanPayload,
    responses(
        (status = 201, description = "Plano criado a partir do comentário do evento", body = ActionPlan),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireModule<ModEventos>,
    Json(payload): Json<CreatePlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let plan = app_state
        .plan_service
        .create(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(plan)))
}

// GET /api/plans
#[utoipa::path(
    get,
    path = "/api/plans",
    tag = "Plans",
    responses((status = 200, description = "Fila de planos ativos", body = Vec<PlanView>)),
    security(("api_jwt" = []))
)]
pub async fn list_plans(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireModule<ModPlanes>,
) -> Result<impl IntoResponse, ApiError> {
    let plans = app_state
        .plan_service
        .list_active(&user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(plans))
}

// GET /api/plans/{id}
#[utoipa::path(
    get,
    path = "/api/plans/{id}",
    tag = "Plans",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano", body = PlanView),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireModule<ModPlanes>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .plan_service
        .get(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(plan))
}

// PUT /api/plans/{id}
#[utoipa::path(
    put,
    path = "/api/plans/{id}",
    tag = "Plans",
    request_body = UpdatePlanPayload,
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano atualizado", body = PlanView),
        (status = 403, description = "Plano bloqueado para edição"),
        (status = 409, description = "Transição inválida ou conflito de edição")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireModule<ModPlanes>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let plan = app_state
        .plan_service
        .update(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(plan))
}

// POST /api/plans/{id}/submit
#[utoipa::path(
    post,
    path = "/api/plans/{id}/submit",
    tag = "Plans",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano enviado para aprovação", body = PlanView),
        (status = 409, description = "Plano já enviado")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireModule<ModPlanes>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .plan_service
        .submit(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(plan))
}
