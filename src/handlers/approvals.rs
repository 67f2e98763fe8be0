// src/handlers/approvals.rs

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
        rbac::{ModAprobaciones, RequireModule},
    },
    models::plan::{ActionPlan, RejectPayload},
};

// GET /api/approvals
#[utoipa::path(
    get,
    path = "/api/approvals",
    tag = "Approvals",
    responses(
        (status = 200, description = "Planos enviados aguardando decisão", body = Vec<ActionPlan>),
        (status = 403, description = "Apenas Calidad ou Administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireModule<ModAprobaciones>,
) -> Result<impl IntoResponse, ApiError> {
    let plans = app_state
        .plan_service
        .pending_approvals(&user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(plans))
}

// POST /api/approvals/{id}/approve
#[utoipa::path(
    post,
    path = "/api/approvals/{id}/approve",
    tag = "Approvals",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano aprovado", body = ActionPlan),
        (status = 409, description = "Estado não permite aprovação")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireModule<ModAprobaciones>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .plan_service
        .approve(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(plan))
}

// POST /api/approvals/{id}/reject
#[utoipa::path(
    post,
    path = "/api/approvals/{id}/reject",
    tag = "Approvals",
    request_body = RejectPayload,
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano rejeitado", body = ActionPlan),
        (status = 400, description = "Motivo obrigatório")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireModule<ModAprobaciones>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .plan_service
        .reject(&user, id, &payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(plan))
}

// POST /api/approvals/{id}/review
#[utoipa::path(
    post,
    path = "/api/approvals/{id}/review",
    tag = "Approvals",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano em revisão", body = ActionPlan),
        (status = 409, description = "Apenas planos fechados entram em revisão")
    ),
    security(("api_jwt" = []))
)]
pub async fn review_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireModule<ModAprobaciones>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .plan_service
        .review(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(plan))
}
