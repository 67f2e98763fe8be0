// src/middleware/recinto.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

use crate::{common::error::ApiError, models::recinto::Recinto};

// O recinto da sessão atual. Vem do token (não de cabeçalho), então o
// usuário nunca enxerga dados de outro recinto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecintoContext(pub Recinto);

impl<S> FromRequestParts<S> for RecintoContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RecintoContext>()
            .copied()
            .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Contexto del recinto no encontrado."))
    }
}
