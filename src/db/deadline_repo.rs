// src/db/deadline_repo.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::{db_utils::FacilityPools, error::AppError},
    models::{
        deadline::{DeadlineConfig, UnlockRow},
        recinto::Recinto,
    },
};

#[derive(Clone)]
pub struct DeadlineRepository {
    pools: FacilityPools,
}

impl DeadlineRepository {
    pub fn new(pools: FacilityPools) -> Self {
        Self { pools }
    }

    pub async fn fecha_limite(&self, recinto: Recinto) -> Result<Option<DateTime<Utc>>, AppError> {
        let fecha = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT fecha_limite FROM deadline_config WHERE recinto = $1",
        )
        .bind(recinto.code())
        .fetch_optional(self.pools.get(recinto))
        .await?;

        // Sem linha ou coluna nula: sem prazo.
        Ok(fecha.flatten())
    }

    pub async fn load(&self, recinto: Recinto) -> Result<DeadlineConfig, AppError> {
        let fecha_limite = self.fecha_limite(recinto).await?;

        let unlocks = sqlx::query_as::<_, UnlockRow>(
            "SELECT department_id, unlocked FROM department_unlocks WHERE recinto = $1",
        )
        .bind(recinto.code())
        .fetch_all(self.pools.get(recinto))
        .await?;

        let mut config = DeadlineConfig::empty(recinto);
        config.fecha_limite = fecha_limite;
        config.unlocked_departments = unlocks
            .into_iter()
            .map(|row| (row.department_id, row.unlocked))
            .collect();

        Ok(config)
    }

    pub async fn set_fecha_limite(
        &self,
        recinto: Recinto,
        fecha_limite: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO deadline_config (recinto, fecha_limite)
            VALUES ($1, $2)
            ON CONFLICT (recinto)
            DO UPDATE SET fecha_limite = EXCLUDED.fecha_limite, updated_at = NOW()
            "#,
        )
        .bind(recinto.code())
        .bind(fecha_limite)
        .execute(self.pools.get(recinto))
        .await?;

        Ok(())
    }

    pub async fn set_unlocked(&self, recinto: Recinto, department_id: Uuid, unlocked: bool) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO department_unlocks (recinto, department_id, unlocked)
            VALUES ($1, $2, $3)
            ON CONFLICT (recinto, department_id)
            DO UPDATE SET unlocked = EXCLUDED.unlocked, updated_at = NOW()
            "#,
        )
        .bind(recinto.code())
        .bind(department_id)
        .bind(unlocked)
        .execute(self.pools.get(recinto))
        .await?;

        Ok(())
    }

    // --- Lembretes enviados ---

    /// Reserva o envio; false quando outro disparo já reservou esse prazo.
    pub async fn claim_reminder(&self, recinto: Recinto, fecha_limite: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO deadline_reminders (recinto, fecha_limite)
            VALUES ($1, $2)
            ON CONFLICT (recinto, fecha_limite) DO NOTHING
            "#,
        )
        .bind(recinto.code())
        .bind(fecha_limite)
        .execute(self.pools.get(recinto))
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn release_reminder(&self, recinto: Recinto, fecha_limite: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("DELETE FROM deadline_reminders WHERE recinto = $1 AND fecha_limite = $2")
            .bind(recinto.code())
            .bind(fecha_limite)
            .execute(self.pools.get(recinto))
            .await?;

        Ok(())
    }
}
