// src/models/deadline.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::recinto::Recinto;

/// Configuração de prazo de um recinto ("Tiempos Límites").
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineConfig {
    pub recinto: Recinto,
    /// Prazo global; ausente = sem bloqueio.
    pub fecha_limite: Option<DateTime<Utc>>,
    /// Departamentos liberados para continuar editando após o prazo.
    #[schema(value_type = Object)]
    pub unlocked_departments: BTreeMap<Uuid, bool>,
}

impl DeadlineConfig {
    pub fn empty(recinto: Recinto) -> Self {
        Self { recinto, fecha_limite: None, unlocked_departments: BTreeMap::new() }
    }

    pub fn is_unlocked(&self, department_id: Uuid) -> bool {
        self.unlocked_departments.get(&department_id).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UnlockRow {
    pub department_id: Uuid,
    pub unlocked: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeadlinePayload {
    /// ISO-8601 com offset, ex.: "2026-10-20T17:00:00-06:00". `null` remove o prazo.
    pub fecha_limite: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnlockPayload {
    pub unlocked: bool,
}
