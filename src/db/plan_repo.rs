// src/db/plan_repo.rs

use uuid::Uuid;

use crate::{
    common::{db_utils::FacilityPools, error::AppError},
    models::{
        department::Department,
        plan::{ActionPlan, CreatePlanPayload, PlanStatus, UpdatePlanPayload},
        recinto::Recinto,
    },
};

#[derive(Clone)]
pub struct PlanRepository {
    pools: FacilityPools,
}

impl PlanRepository {
    pub fn new(pools: FacilityPools) -> Self {
        Self { pools }
    }

    pub async fn create(
        &self,
        recinto: Recinto,
        payload: &CreatePlanPayload,
        department: &Department,
        created_by: &str,
    ) -> Result<ActionPlan, AppError> {
        let plan = sqlx::query_as::<_, ActionPlan>(
            r#"
            INSERT INTO action_plans (
                id, recinto, evento_id, evento_name, comentario,
                departamento_id, departamento_name, responsable_email,
                status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recinto.code())
        .bind(payload.evento_id.trim())
        .bind(payload.evento_name.trim())
        .bind(payload.comentario.trim())
        .bind(department.id)
        .bind(&department.name)
        .bind(&department.manager_email)
        .bind(PlanStatus::Abierto.as_str())
        .bind(created_by)
        .fetch_one(self.pools.get(recinto))
        .await?;

        Ok(plan)
    }

    pub async fn find(&self, recinto: Recinto, id: Uuid) -> Result<ActionPlan, AppError> {
        sqlx::query_as::<_, ActionPlan>("SELECT * FROM action_plans WHERE recinto = $1 AND id = $2")
            .bind(recinto.code())
            .bind(id)
            .fetch_optional(self.pools.get(recinto))
            .await?
            .ok_or(AppError::NotFound("plan de acción"))
    }

    /// Fila de trabalho: tudo que ainda não foi aprovado.
    pub async fn list_active(&self, recinto: Recinto, department: Option<Uuid>) -> Result<Vec<ActionPlan>, AppError> {
        let plans = sqlx::query_as::<_, ActionPlan>(
            r#"
            SELECT * FROM action_plans
            WHERE recinto = $1
              AND status <> $2
              AND ($3::uuid IS NULL OR departamento_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(recinto.code())
        .bind(PlanStatus::Aprobado.as_str())
        .bind(department)
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(plans)
    }

    pub async fn list_pending_approval(&self, recinto: Recinto) -> Result<Vec<ActionPlan>, AppError> {
        let plans = sqlx::query_as::<_, ActionPlan>(
            r#"
            SELECT * FROM action_plans
            WHERE recinto = $1 AND gestionado = TRUE AND status <> $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(recinto.code())
        .bind(PlanStatus::Aprobado.as_str())
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(plans)
    }

    /// Histórico completo (relatórios e exportação).
    pub async fn list_all(&self, recinto: Recinto) -> Result<Vec<ActionPlan>, AppError> {
        let plans = sqlx::query_as::<_, ActionPlan>(
            "SELECT * FROM action_plans WHERE recinto = $1 ORDER BY created_at DESC",
        )
        .bind(recinto.code())
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(plans)
    }

    // ---
    // Escritas com compare-and-set sobre o estado anterior.
    // Nenhuma linha afetada = alguém mudou o plano antes.
    // ---

    pub async fn update_fields(
        &self,
        recinto: Recinto,
        id: Uuid,
        expected: PlanStatus,
        new_status: PlanStatus,
        changes: &UpdatePlanPayload,
    ) -> Result<ActionPlan, AppError> {
        sqlx::query_as::<_, ActionPlan>(
            r#"
            UPDATE action_plans SET
                status              = $4,
                causas              = COALESCE($5, causas),
                plan_accion_detalle = COALESCE($6, plan_accion_detalle),
                consecutivo_nc      = COALESCE($7, consecutivo_nc),
                comentario_cierre   = COALESCE($8, comentario_cierre),
                fotos_cierre        = COALESCE($9, fotos_cierre),
                closed_at           = CASE WHEN $4 = 'Cerrado' AND status <> 'Cerrado' THEN NOW() ELSE closed_at END,
                updated_at          = NOW()
            WHERE recinto = $1 AND id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(recinto.code())
        .bind(id)
        .bind(expected.as_str())
        .bind(new_status.as_str())
        .bind(&changes.causas)
        .bind(&changes.plan_accion_detalle)
        .bind(&changes.consecutivo_nc)
        .bind(&changes.comentario_cierre)
        .bind(&changes.fotos_cierre)
        .fetch_optional(self.pools.get(recinto))
        .await?
        .ok_or(AppError::Conflict)
    }

    pub async fn submit(&self, recinto: Recinto, id: Uuid, expected: PlanStatus) -> Result<ActionPlan, AppError> {
        sqlx::query_as::<_, ActionPlan>(
            r#"
            UPDATE action_plans SET
                status       = $4,
                gestionado   = TRUE,
                submitted_at = NOW(),
                closed_at    = COALESCE(closed_at, NOW()),
                updated_at   = NOW()
            WHERE recinto = $1 AND id = $2 AND status = $3 AND gestionado = FALSE
            RETURNING *
            "#,
        )
        .bind(recinto.code())
        .bind(id)
        .bind(expected.as_str())
        .bind(PlanStatus::Cerrado.as_str())
        .fetch_optional(self.pools.get(recinto))
        .await?
        .ok_or(AppError::Conflict)
    }

    pub async fn approve(&self, recinto: Recinto, id: Uuid, expected: PlanStatus) -> Result<ActionPlan, AppError> {
        sqlx::query_as::<_, ActionPlan>(
            r#"
            UPDATE action_plans SET status = $4, approved_at = NOW(), updated_at = NOW()
            WHERE recinto = $1 AND id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(recinto.code())
        .bind(id)
        .bind(expected.as_str())
        .bind(PlanStatus::Aprobado.as_str())
        .fetch_optional(self.pools.get(recinto))
        .await?
        .ok_or(AppError::Conflict)
    }

    // Devolve o plano ao departamento.
    pub async fn reject(
        &self,
        recinto: Recinto,
        id: Uuid,
        expected: PlanStatus,
        reason: &str,
    ) -> Result<ActionPlan, AppError> {
        sqlx::query_as::<_, ActionPlan>(
            r#"
            UPDATE action_plans SET
                status        = $4,
                reject_reason = $5,
                gestionado    = FALSE,
                rejected_at   = NOW(),
                updated_at    = NOW()
            WHERE recinto = $1 AND id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(recinto.code())
        .bind(id)
        .bind(expected.as_str())
        .bind(PlanStatus::Rechazado.as_str())
        .bind(reason)
        .fetch_optional(self.pools.get(recinto))
        .await?
        .ok_or(AppError::Conflict)
    }

    pub async fn set_status(
        &self,
        recinto: Recinto,
        id: Uuid,
        expected: PlanStatus,
        new_status: PlanStatus,
    ) -> Result<ActionPlan, AppError> {
        sqlx::query_as::<_, ActionPlan>(
            r#"
            UPDATE action_plans SET status = $4, updated_at = NOW()
            WHERE recinto = $1 AND id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(recinto.code())
        .bind(id)
        .bind(expected.as_str())
        .bind(new_status.as_str())
        .fetch_optional(self.pools.get(recinto))
        .await?
        .ok_or(AppError::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DepartmentRepository;
    use std::collections::BTreeMap;

    // Precisa de um Postgres descartável; sem PLANES_TEST_DATABASE_URL o teste não roda.
    async fn repositories() -> Option<(PlanRepository, DepartmentRepository)> {
        let url = std::env::var("PLANES_TEST_DATABASE_URL").ok()?;
        let pools = FacilityPools::connect_lazy(&BTreeMap::new(), &url).unwrap();
        sqlx::migrate!().run(pools.get(Recinto::Cccr)).await.unwrap();
        Some((PlanRepository::new(pools.clone()), DepartmentRepository::new(pools)))
    }

    #[tokio::test]
    async fn work_queues_never_list_approved_plans() {
        let Some((plans, departments)) = repositories().await else {
            return;
        };
        let recinto = Recinto::Cccr;
        let dept = departments
            .create(recinto, &format!("Audiovisuales {}", Uuid::new_v4()), None)
            .await
            .unwrap();
        let payload = CreatePlanPayload {
            evento_id: "EV-1".into(),
            evento_name: "Expo".into(),
            comentario: "Sonido deficiente".into(),
            departamento_id: dept.id,
        };

        let open = plans.create(recinto, &payload, &dept, "u-1").await.unwrap();
        let waiting = plans.create(recinto, &payload, &dept, "u-1").await.unwrap();
        let waiting = plans.submit(recinto, waiting.id, PlanStatus::Abierto).await.unwrap();
        let approved = plans.create(recinto, &payload, &dept, "u-1").await.unwrap();
        plans.submit(recinto, approved.id, PlanStatus::Abierto).await.unwrap();
        plans.approve(recinto, approved.id, PlanStatus::Cerrado).await.unwrap();

        let active: Vec<Uuid> = plans
            .list_active(recinto, Some(dept.id))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(active.len(), 2);
        assert!(active.contains(&open.id));
        assert!(active.contains(&waiting.id));

        let queue: Vec<Uuid> = plans
            .list_pending_approval(recinto)
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.departamento_id == dept.id)
            .map(|p| p.id)
            .collect();
        assert_eq!(queue, vec![waiting.id]);

        // O histórico continua com os três.
        let all = plans.list_all(recinto).await.unwrap();
        assert_eq!(all.iter().filter(|p| p.departamento_id == dept.id).count(), 3);
    }
}
