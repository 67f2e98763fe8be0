// src/models/plan.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::recinto::Recinto;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PlanStatus {
    #[serde(rename = "Abierto")]
    Abierto,
    #[serde(rename = "En Proceso")]
    EnProceso,
    #[serde(rename = "Cerrado")]
    Cerrado,
    #[serde(rename = "Revision")]
    Revision,
    #[serde(rename = "Aprobado")]
    Aprobado,
    #[serde(rename = "Rechazado")]
    Rechazado,
}

#[derive(Debug, thiserror::Error)]
#[error("Estado de plano desconhecido: {0}")]
pub struct UnknownStatus(pub String);

impl PlanStatus {
    pub const ALL: [PlanStatus; 6] = [
        PlanStatus::Abierto,
        PlanStatus::EnProceso,
        PlanStatus::Cerrado,
        PlanStatus::Revision,
        PlanStatus::Aprobado,
        PlanStatus::Rechazado,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlanStatus::Abierto => "Abierto",
            PlanStatus::EnProceso => "En Proceso",
            PlanStatus::Cerrado => "Cerrado",
            PlanStatus::Revision => "Revision",
            PlanStatus::Aprobado => "Aprobado",
            PlanStatus::Rechazado => "Rechazado",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PlanStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PlanStatus::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or(UnknownStatus(value))
    }
}

// --- Plano de ação ---
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub recinto: Recinto,
    #[schema(example = "EV-2026-0142")]
    pub evento_id: String,
    #[schema(example = "Congreso Nacional de Cardiología")]
    pub evento_name: String,
    #[schema(example = "El aire acondicionado del salón B no funcionaba.")]
    pub comentario: String,
    pub departamento_id: Uuid,
    #[schema(example = "Mantenimiento")]
    pub departamento_name: String,
    pub responsable_email: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: PlanStatus,
    pub causas: Option<String>,
    pub plan_accion_detalle: Option<String>,
    #[schema(example = "NC-2026-001")]
    #[serde(rename = "consecutivoNC")]
    pub consecutivo_nc: Option<String>,
    pub comentario_cierre: Option<String>,
    pub reject_reason: Option<String>,
    pub fotos_cierre: Vec<String>,
    /// Enviado para aprovação.
    pub gestionado: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

/// Plano com a flag de edição já calculada para o usuário atual.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    #[serde(flatten)]
    pub plan: ActionPlan,
    pub editable: bool,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanPayload {
    #[validate(length(min = 1, message = "required"))]
    pub evento_id: String,
    #[validate(length(min = 1, message = "required"))]
    pub evento_name: String,
    #[validate(length(min = 1, message = "required"))]
    pub comentario: String,
    pub departamento_id: Uuid,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanPayload {
    pub status: Option<PlanStatus>,
    pub causas: Option<String>,
    pub plan_accion_detalle: Option<String>,
    #[serde(rename = "consecutivoNC")]
    #[validate(length(max = 64, message = "too_long"))]
    pub consecutivo_nc: Option<String>,
    pub comentario_cierre: Option<String>,
    pub fotos_cierre: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectPayload {
    #[schema(example = "La evidencia fotográfica no corresponde al salón indicado.")]
    pub reason: String,
}

/// Filtros do histórico (tela de Relatórios).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportFilter {
    pub search: Option<String>,
    /// Nome do estado ("Abierto", "En Proceso", ...) ou "all".
    pub status: Option<String>,
    /// Nome do departamento ou "all".
    pub departamento: Option<String>,
}
