// src/handlers/eventos.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{ModEventos, RequireModule},
        recinto::RecintoContext,
    },
    models::evento::{Evento, EventosQuery},
};

// GET /api/eventos
#[utoipa::path(
    get,
    path = "/api/eventos",
    tag = "Eventos",
    params(EventosQuery),
    responses(
        (status = 200, description = "Eventos do recinto no período", body = Vec<Evento>),
        (status = 502, description = "API de eventos indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_eventos(
    State(app_state): State<AppState>,
    locale: Locale,
    recinto: RecintoContext,
    _guard: RequireModule<ModEventos>,
    Query(query): Query<EventosQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let eventos = app_state
        .skill_client
        .fetch_events(recinto.0, &query.start_date, &query.end_date)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tracing::info!("{} evento(s) de {} entre {} e {}", eventos.len(), recinto.0, query.start_date, query.end_date);
    Ok(Json(eventos))
}
