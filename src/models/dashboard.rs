// src/models/dashboard.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// 1. Totais por estado (os cards do topo)
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanStats {
    pub total: i64,
    pub abiertos: i64,
    pub proceso: i64,
    pub cerrados: i64,
    pub aprobados: i64,
    pub rechazados: i64,
}

// 2. Gráfico por departamento
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeptStat {
    pub name: String,
    /// Abierto + En Proceso
    pub abiertos: i64,
    pub cerrados: i64,
    pub aprobados: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub stats: PlanStats,
    pub departments: Vec<DeptStat>,
}

/// Linha agregada vinda do banco: (departamento, estado) -> quantidade.
#[derive(Debug, Clone, FromRow)]
pub struct StatusCountRow {
    pub departamento_name: String,
    pub status: String,
    pub total: i64,
}
