// src/db/dashboard_repo.rs

use crate::{
    common::{db_utils::FacilityPools, error::AppError},
    models::{dashboard::StatusCountRow, recinto::Recinto},
};

#[derive(Clone)]
pub struct DashboardRepository {
    pools: FacilityPools,
}

impl DashboardRepository {
    pub fn new(pools: FacilityPools) -> Self {
        Self { pools }
    }

    // Contagem de planos por (departamento, estado)
    pub async fn count_by_department_and_status(&self, recinto: Recinto) -> Result<Vec<StatusCountRow>, AppError> {
        let rows = sqlx::query_as::<_, StatusCountRow>(
            r#"
            SELECT departamento_name, status, COUNT(*)::bigint AS total
            FROM action_plans
            WHERE recinto = $1
            GROUP BY departamento_name, status
            ORDER BY departamento_name
            "#,
        )
        .bind(recinto.code())
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(rows)
    }
}
