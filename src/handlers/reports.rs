// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{ModReportes, RequireModule},
        recinto::RecintoContext,
    },
    models::plan::{ActionPlan, ReportFilter},
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// GET /api/reports/plans
#[utoipa::path(
    get,
    path = "/api/reports/plans",
    tag = "Reports",
    params(ReportFilter),
    responses((status = 200, description = "Histórico completo filtrado", body = Vec<ActionPlan>)),
    security(("api_jwt" = []))
)]
pub async fn list_history(
    State(app_state): State<AppState>,
    locale: Locale,
    recinto: RecintoContext,
    _guard: RequireModule<ModReportes>,
    Query(filter): Query<ReportFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let plans = app_state
        .report_service
        .history(recinto.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(plans))
}

// GET /api/reports/export
#[utoipa::path(
    get,
    path = "/api/reports/export",
    tag = "Reports",
    params(ReportFilter),
    responses((status = 200, description = "Planilha XLSX do histórico filtrado")),
    security(("api_jwt" = []))
)]
pub async fn export_history(
    State(app_state): State<AppState>,
    locale: Locale,
    recinto: RecintoContext,
    _guard: RequireModule<ModReportes>,
    Query(filter): Query<ReportFilter>,
) -> Result<Response, ApiError> {
    let (filename, bytes) = app_state
        .report_service
        .export(recinto.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    // Força o download no navegador
    let headers = [
        (header::CONTENT_TYPE, XLSX_MIME.to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ];

    Ok((headers, bytes).into_response())
}
