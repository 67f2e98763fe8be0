// src/db/rbac_repo.rs

use sqlx::{Executor, Postgres};

use crate::common::{db_utils::FacilityPools, error::AppError};
use crate::models::{
    auth::Role,
    rbac::{Module, PermissionRow},
    recinto::Recinto,
};

#[derive(Clone)]
pub struct RbacRepository {
    pools: FacilityPools,
}

impl RbacRepository {
    pub fn new(pools: FacilityPools) -> Self {
        Self { pools }
    }

    // 1. Linhas gravadas do recinto (a matriz final é montada no model)
    pub async fn list_rows(&self, recinto: Recinto) -> Result<Vec<PermissionRow>, AppError> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            "SELECT role, module, visible FROM role_permissions WHERE recinto = $1",
        )
        .bind(recinto.code())
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(rows)
    }

    // 2. Grava a visibilidade de um módulo para um papel
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        recinto: Recinto,
        role: Role,
        module: Module,
        visible: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (recinto, role, module, visible)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (recinto, role, module)
            DO UPDATE SET visible = EXCLUDED.visible, updated_at = NOW()
            "#,
        )
        .bind(recinto.code())
        .bind(role.as_str())
        .bind(module.as_str())
        .bind(visible)
        .execute(executor)
        .await?;

        Ok(())
    }
}
