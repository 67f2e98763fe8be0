// src/services/report_service.rs

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::BTreeMap;

use crate::{
    common::error::AppError,
    db::{DashboardRepository, PlanRepository},
    models::{
        dashboard::{DeptStat, PlanStats, ResultsResponse, StatusCountRow},
        plan::{ActionPlan, PlanStatus, ReportFilter},
        recinto::Recinto,
    },
};

const SHEET_NAME: &str = "Planes de Acción";
const COLUMNS: [&str; 11] = [
    "ID",
    "Evento",
    "Departamento",
    "Estado",
    "Fecha Evento",
    "No. Conformidad",
    "Comentario del Cliente",
    "Causas",
    "Detalle Plan de Acción",
    "Comentario de Cierre",
    "Motivo de Rechazo",
];

#[derive(Clone)]
pub struct ReportService {
    plans: PlanRepository,
    dashboard: DashboardRepository,
    tz: Tz,
}

// "all" ou vazio = sem filtro
fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn contains(field: Option<&str>, term: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(term))
}

pub fn matches(plan: &ActionPlan, filter: &ReportFilter) -> bool {
    if let Some(term) = active(&filter.search) {
        let term = term.to_lowercase();
        let hit = contains(Some(&plan.evento_name), &term)
            || contains(Some(&plan.departamento_name), &term)
            || contains(Some(&plan.comentario), &term)
            || contains(plan.consecutivo_nc.as_deref(), &term)
            || contains(plan.causas.as_deref(), &term)
            || contains(plan.plan_accion_detalle.as_deref(), &term);
        if !hit {
            return false;
        }
    }
    if let Some(status) = active(&filter.status) {
        if plan.status.as_str() != status {
            return false;
        }
    }
    if let Some(departamento) = active(&filter.departamento) {
        if plan.departamento_name != departamento {
            return false;
        }
    }
    true
}

pub fn apply_filter(plans: Vec<ActionPlan>, filter: &ReportFilter) -> Vec<ActionPlan> {
    plans.into_iter().filter(|p| matches(p, filter)).collect()
}

/// Dobra as contagens (departamento, estado) nos cards e no gráfico.
pub fn fold_results(rows: &[StatusCountRow]) -> ResultsResponse {
    let mut stats = PlanStats::default();
    let mut departments: BTreeMap<String, DeptStat> = BTreeMap::new();

    for row in rows {
        let Ok(status) = PlanStatus::try_from(row.status.clone()) else {
            tracing::warn!("Estado desconhecido nas estatísticas: {}", row.status);
            continue;
        };

        stats.total += row.total;
        match status {
            PlanStatus::Abierto => stats.abiertos += row.total,
            PlanStatus::EnProceso => stats.proceso += row.total,
            PlanStatus::Cerrado => stats.cerrados += row.total,
            PlanStatus::Aprobado => stats.aprobados += row.total,
            PlanStatus::Rechazado => stats.rechazados += row.total,
            PlanStatus::Revision => {}
        }

        let dept = departments
            .entry(row.departamento_name.clone())
            .or_insert_with(|| DeptStat { name: row.departamento_name.clone(), ..Default::default() });
        match status {
            PlanStatus::Abierto | PlanStatus::EnProceso => dept.abiertos += row.total,
            PlanStatus::Cerrado => dept.cerrados += row.total,
            PlanStatus::Aprobado => dept.aprobados += row.total,
            _ => {}
        }
    }

    ResultsResponse { stats, departments: departments.into_values().collect() }
}

pub fn export_filename(recinto: Recinto, today: NaiveDate) -> String {
    format!("Reporte_Planes_{}_{}.xlsx", recinto.code(), today.format("%Y-%m-%d"))
}

fn export_row(plan: &ActionPlan, tz: &Tz) -> [String; 11] {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let consecutivo = plan
        .consecutivo_nc
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("N/A")
        .to_string();

    [
        plan.id.to_string(),
        plan.evento_name.clone(),
        plan.departamento_name.clone(),
        plan.status.to_string(),
        plan.created_at.with_timezone(tz).format("%d/%m/%Y").to_string(),
        consecutivo,
        plan.comentario.clone(),
        text(&plan.causas),
        text(&plan.plan_accion_detalle),
        text(&plan.comentario_cierre),
        text(&plan.reject_reason),
    ]
}

pub fn build_workbook(plans: &[ActionPlan], tz: &Tz) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, title) in COLUMNS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &header)?;
            sheet.set_column_width(col as u16, 22)?;
        }

        for (i, plan) in plans.iter().enumerate() {
            let row = (i + 1) as u32;
            for (col, value) in export_row(plan, tz).iter().enumerate() {
                sheet.write_string(row, col as u16, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

impl ReportService {
    pub fn new(plans: PlanRepository, dashboard: DashboardRepository, tz: Tz) -> Self {
        Self { plans, dashboard, tz }
    }

    pub async fn history(&self, recinto: Recinto, filter: &ReportFilter) -> Result<Vec<ActionPlan>, AppError> {
        let plans = self.plans.list_all(recinto).await?;
        Ok(apply_filter(plans, filter))
    }

    /// Planilha do histórico filtrado: (nome do arquivo, bytes).
    pub async fn export(&self, recinto: Recinto, filter: &ReportFilter) -> Result<(String, Vec<u8>), AppError> {
        let plans = self.history(recinto, filter).await?;
        let bytes = build_workbook(&plans, &self.tz)?;
        let today = chrono::Utc::now().with_timezone(&self.tz).date_naive();

        tracing::info!("Exportação de {} planos de {}", plans.len(), recinto);
        Ok((export_filename(recinto, today), bytes))
    }

    pub async fn results(&self, recinto: Recinto) -> Result<ResultsResponse, AppError> {
        let rows = self.dashboard.count_by_department_and_status(recinto).await?;
        Ok(fold_results(&rows))
    }
}
