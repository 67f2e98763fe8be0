// src/services/plan_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DeadlineRepository, DepartmentRepository, PlanRepository},
    models::{
        auth::{Role, User},
        deadline::DeadlineConfig,
        plan::{ActionPlan, CreatePlanPayload, PlanView, UpdatePlanPayload},
    },
    services::{
        lifecycle::{self, Action},
        notifications::Notifier,
    },
};

#[derive(Clone)]
pub struct PlanService {
    plans: PlanRepository,
    departments: DepartmentRepository,
    deadlines: DeadlineRepository,
    notifier: Notifier,
}

fn view(user: &User, plan: ActionPlan, config: &DeadlineConfig) -> PlanView {
    let editable = lifecycle::can_edit(user, &plan, config, Utc::now());
    PlanView { plan, editable }
}

/// Usuário comum só enxerga planos do próprio departamento.
fn ensure_visible(user: &User, plan: &ActionPlan) -> Result<(), AppError> {
    if user.role == Role::Usuario && user.department_id != Some(plan.departamento_id) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Motivo de rejeição obrigatório; é gravado sem espaços nas pontas.
fn reject_reason(reason: &str) -> Result<&str, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::RejectReasonRequired);
    }
    Ok(reason)
}

impl PlanService {
    pub fn new(
        plans: PlanRepository,
        departments: DepartmentRepository,
        deadlines: DeadlineRepository,
        notifier: Notifier,
    ) -> Self {
        Self { plans, departments, deadlines, notifier }
    }

    pub async fn create(&self, user: &User, payload: &CreatePlanPayload) -> Result<ActionPlan, AppError> {
        let department = self.departments.find(user.recinto, payload.departamento_id).await?;
        let plan = self.plans.create(user.recinto, payload, &department, &user.uid).await?;

        tracing::info!(
            "📝 Plano {} criado para {} (evento {})",
            plan.id,
            plan.departamento_name,
            plan.evento_name
        );
        self.notifier.plan_created(plan.clone());
        Ok(plan)
    }

    pub async fn list_active(&self, user: &User) -> Result<Vec<PlanView>, AppError> {
        let department = match user.role {
            Role::Usuario => match user.department_id {
                Some(id) => Some(id),
                // Sem departamento não há fila.
                None => return Ok(vec![]),
            },
            _ => None,
        };

        let config = self.deadlines.load(user.recinto).await?;
        let plans = self.plans.list_active(user.recinto, department).await?;
        Ok(plans.into_iter().map(|p| view(user, p, &config)).collect())
    }

    pub async fn get(&self, user: &User, id: Uuid) -> Result<PlanView, AppError> {
        let plan = self.plans.find(user.recinto, id).await?;
        ensure_visible(user, &plan)?;
        let config = self.deadlines.load(user.recinto).await?;
        Ok(view(user, plan, &config))
    }

    pub async fn update(&self, user: &User, id: Uuid, changes: &UpdatePlanPayload) -> Result<PlanView, AppError> {
        let plan = self.plans.find(user.recinto, id).await?;
        let config = self.deadlines.load(user.recinto).await?;
        lifecycle::ensure_editable(user, &plan, &config, Utc::now())?;

        let new_status = match changes.status {
            Some(target) if target != plan.status => {
                let action = Action::for_edit(plan.status, target)?;
                lifecycle::transition(plan.status, action, user.role)?
            }
            _ => plan.status,
        };

        let updated = self
            .plans
            .update_fields(user.recinto, id, plan.status, new_status, changes)
            .await?;
        Ok(view(user, updated, &config))
    }

    pub async fn submit(&self, user: &User, id: Uuid) -> Result<PlanView, AppError> {
        let plan = self.plans.find(user.recinto, id).await?;
        let config = self.deadlines.load(user.recinto).await?;
        lifecycle::ensure_submittable(user, &plan, &config, Utc::now())?;

        let submitted = self.plans.submit(user.recinto, id, plan.status).await?;
        tracing::info!("Plano {} enviado para aprovação por {}", id, user.email);

        // O update só casa com gestionado = false, então aqui sempre houve a virada false -> true.
        self.notifier.plan_submitted(submitted.clone());
        Ok(view(user, submitted, &config))
    }

    // --- Aprovações ---

    pub async fn pending_approvals(&self, user: &User) -> Result<Vec<ActionPlan>, AppError> {
        if !user.role.is_privileged() {
            return Err(AppError::Forbidden);
        }
        self.plans.list_pending_approval(user.recinto).await
    }

    pub async fn approve(&self, user: &User, id: Uuid) -> Result<ActionPlan, AppError> {
        let plan = self.plans.find(user.recinto, id).await?;
        lifecycle::transition(plan.status, Action::Approve, user.role)?;

        let approved = self.plans.approve(user.recinto, id, plan.status).await?;
        tracing::info!("✅ Plano {} aprovado por {}", id, user.email);
        Ok(approved)
    }

    pub async fn reject(&self, user: &User, id: Uuid, reason: &str) -> Result<ActionPlan, AppError> {
        let reason = reject_reason(reason)?;

        let plan = self.plans.find(user.recinto, id).await?;
        lifecycle::transition(plan.status, Action::Reject, user.role)?;

        let rejected = self.plans.reject(user.recinto, id, plan.status, reason).await?;
        tracing::info!("Plano {} rejeitado por {}", id, user.email);
        Ok(rejected)
    }

    pub async fn review(&self, user: &User, id: Uuid) -> Result<ActionPlan, AppError> {
        let plan = self.plans.find(user.recinto, id).await?;
        let target = lifecycle::transition(plan.status, Action::Review, user.role)?;
        self.plans.set_status(user.recinto, id, plan.status, target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::PlanStatus;
    use crate::services::lifecycle::tests::{plan, user};

    #[test]
    fn department_users_only_see_their_own_plans() {
        let dept = Uuid::new_v4();
        let own = plan(PlanStatus::Abierto, dept);
        let other = plan(PlanStatus::Abierto, Uuid::new_v4());

        let usuario = user(Role::Usuario, Some(dept));
        assert!(ensure_visible(&usuario, &own).is_ok());
        assert!(matches!(ensure_visible(&usuario, &other), Err(AppError::Forbidden)));
        assert!(ensure_visible(&user(Role::Calidad, None), &other).is_ok());
    }

    #[test]
    fn blank_reject_reason_is_refused_and_padding_is_trimmed() {
        for blank in ["", "   ", "\n", " \t\n "] {
            assert!(matches!(reject_reason(blank), Err(AppError::RejectReasonRequired)));
        }
        assert_eq!(reject_reason("  Falta evidencia \n").unwrap(), "Falta evidencia");
    }

    #[test]
    fn view_flags_locked_plans_as_not_editable() {
        let dept = Uuid::new_v4();
        let usuario = user(Role::Usuario, Some(dept));
        let config = DeadlineConfig::empty(crate::models::recinto::Recinto::Cccr);

        assert!(view(&usuario, plan(PlanStatus::EnProceso, dept), &config).editable);
        assert!(!view(&usuario, plan(PlanStatus::Revision, dept), &config).editable);
    }
}
