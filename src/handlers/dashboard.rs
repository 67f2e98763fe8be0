// src/handlers/dashboard.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{ModResultados, RequireModule},
        recinto::RecintoContext,
    },
    // Importamos os models para referenciar no Swagger
    models::dashboard::ResultsResponse,
};

// GET /api/dashboard/results
#[utoipa::path(
    get,
    path = "/api/dashboard/results",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Totais por estado e por departamento", body = ResultsResponse),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Sem acesso ao módulo")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_results(
    State(app_state): State<AppState>,
    locale: Locale,
    recinto: RecintoContext,
    _guard: RequireModule<ModResultados>,
) -> Result<impl IntoResponse, ApiError> {
    let results = app_state
        .report_service
        .results(recinto.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(results)))
}
