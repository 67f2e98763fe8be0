// src/db/department_repo.rs

use uuid::Uuid;

use crate::{
    common::{
        db_utils::FacilityPools,
        error::{map_unique_violation, AppError},
    },
    models::{department::Department, recinto::Recinto},
};

const DUPLICATE_NAME: &str = "Ya existe un departamento con ese nombre.";

#[derive(Clone)]
pub struct DepartmentRepository {
    pools: FacilityPools,
}

impl DepartmentRepository {
    pub fn new(pools: FacilityPools) -> Self {
        Self { pools }
    }

    pub async fn list(&self, recinto: Recinto) -> Result<Vec<Department>, AppError> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT * FROM departments WHERE recinto = $1 ORDER BY name",
        )
        .bind(recinto.code())
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(departments)
    }

    pub async fn find(&self, recinto: Recinto, id: Uuid) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE recinto = $1 AND id = $2")
            .bind(recinto.code())
            .bind(id)
            .fetch_optional(self.pools.get(recinto))
            .await?
            .ok_or(AppError::NotFound("departamento"))
    }

    pub async fn create(
        &self,
        recinto: Recinto,
        name: &str,
        manager_email: Option<&str>,
    ) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (id, recinto, name, manager_email)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recinto.code())
        .bind(name.trim())
        .bind(manager_email)
        .fetch_one(self.pools.get(recinto))
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_NAME))
    }

    pub async fn update(
        &self,
        recinto: Recinto,
        id: Uuid,
        name: &str,
        manager_email: Option<&str>,
    ) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments SET name = $3, manager_email = $4
            WHERE recinto = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(recinto.code())
        .bind(id)
        .bind(name.trim())
        .bind(manager_email)
        .fetch_optional(self.pools.get(recinto))
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_NAME))?
        .ok_or(AppError::NotFound("departamento"))
    }

    pub async fn delete(&self, recinto: Recinto, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE recinto = $1 AND id = $2")
            .bind(recinto.code())
            .bind(id)
            .execute(self.pools.get(recinto))
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("departamento"));
        }
        Ok(())
    }
}
