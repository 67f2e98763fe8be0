// src/services/lifecycle.rs

use chrono::{DateTime, Utc};

use crate::{
    common::error::AppError,
    models::{
        auth::{Role, User},
        deadline::DeadlineConfig,
        plan::{ActionPlan, PlanStatus},
    },
};

use PlanStatus::*;

// ---
// Ações do ciclo de vida
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Reopen,
    Close,
    Submit,
    Review,
    Approve,
    Reject,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Start,
        Action::Reopen,
        Action::Close,
        Action::Submit,
        Action::Review,
        Action::Approve,
        Action::Reject,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Reopen => "reopen",
            Action::Close => "close",
            Action::Submit => "submit",
            Action::Review => "review",
            Action::Approve => "approve",
            Action::Reject => "reject",
        }
    }

    /// Estados a partir dos quais a ação é aceita.
    pub fn sources(self) -> &'static [PlanStatus] {
        match self {
            Action::Start => &[Abierto, Rechazado],
            Action::Reopen => &[EnProceso],
            Action::Close => &[Abierto, EnProceso, Rechazado],
            Action::Submit => &[Abierto, EnProceso, Cerrado, Rechazado],
            Action::Review => &[Cerrado],
            Action::Approve | Action::Reject => &[Abierto, EnProceso, Cerrado, Revision],
        }
    }

    pub fn target(self) -> PlanStatus {
        match self {
            Action::Start => EnProceso,
            Action::Reopen => Abierto,
            Action::Close | Action::Submit => Cerrado,
            Action::Review => Revision,
            Action::Approve => Aprobado,
            Action::Reject => Rechazado,
        }
    }

    /// Revisão, aprovação e rejeição são exclusivas de Calidad/Administrador.
    pub fn privileged_only(self) -> bool {
        matches!(self, Action::Review | Action::Approve | Action::Reject)
    }

    /// Ação correspondente a uma troca de estado feita pela tela de edição.
    pub fn for_edit(from: PlanStatus, to: PlanStatus) -> Result<Action, AppError> {
        match to {
            EnProceso => Ok(Action::Start),
            Abierto => Ok(Action::Reopen),
            Cerrado => Ok(Action::Close),
            _ => Err(AppError::InvalidTransition { from, action: "update" }),
        }
    }
}

/// Aplica a tabela de transições. Devolve o novo estado.
pub fn transition(from: PlanStatus, action: Action, role: Role) -> Result<PlanStatus, AppError> {
    if action.privileged_only() && !role.is_privileged() {
        return Err(AppError::Forbidden);
    }
    if !action.sources().contains(&from) {
        return Err(AppError::InvalidTransition { from, action: action.as_str() });
    }
    Ok(action.target())
}

// ---
// Bloqueio de edição
// ---

/// Prazo vencido? Sem prazo configurado nunca vence.
pub fn is_expired(now: DateTime<Utc>, fecha_limite: Option<DateTime<Utc>>) -> bool {
    fecha_limite.is_some_and(|limit| now > limit)
}

fn locked_by_status(status: PlanStatus) -> bool {
    matches!(status, Cerrado | Revision | Aprobado)
}

fn locked_by_time(plan: &ActionPlan, config: &DeadlineConfig, now: DateTime<Utc>) -> bool {
    is_expired(now, config.fecha_limite) && !config.is_unlocked(plan.departamento_id)
}

fn owns_plan(user: &User, plan: &ActionPlan) -> bool {
    user.department_id == Some(plan.departamento_id)
}

/// Verifica se o usuário pode editar o plano agora.
pub fn ensure_editable(
    user: &User,
    plan: &ActionPlan,
    config: &DeadlineConfig,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if plan.status == Aprobado {
        return Err(AppError::EditLocked);
    }
    if user.role.is_privileged() {
        return Ok(());
    }
    if !owns_plan(user, plan) {
        return Err(AppError::Forbidden);
    }
    if locked_by_time(plan, config, now) || locked_by_status(plan.status) {
        return Err(AppError::EditLocked);
    }
    Ok(())
}

pub fn can_edit(user: &User, plan: &ActionPlan, config: &DeadlineConfig, now: DateTime<Utc>) -> bool {
    ensure_editable(user, plan, config, now).is_ok()
}

/// Envio para aprovação: só o prazo bloqueia (um plano já "Cerrado" ainda pode ser enviado).
pub fn ensure_submittable(
    user: &User,
    plan: &ActionPlan,
    config: &DeadlineConfig,
    now: DateTime<Utc>,
) -> Result<PlanStatus, AppError> {
    if plan.gestionado {
        return Err(AppError::AlreadySubmitted);
    }
    if !user.role.is_privileged() {
        if !owns_plan(user, plan) {
            return Err(AppError::Forbidden);
        }
        if locked_by_time(plan, config, now) {
            return Err(AppError::EditLocked);
        }
    }
    transition(plan.status, Action::Submit, user.role)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::recinto::Recinto;
    use chrono::Duration;
    use uuid::Uuid;

    pub(crate) fn user(role: Role, department_id: Option<Uuid>) -> User {
        User {
            uid: "u-1".into(),
            email: "ana@costaricacc.com".into(),
            display_name: "Ana".into(),
            role,
            department_id,
            department_name: None,
            recinto: Recinto::Cccr,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn plan(status: PlanStatus, departamento_id: Uuid) -> ActionPlan {
        ActionPlan {
            id: Uuid::new_v4(),
            recinto: Recinto::Cccr,
            evento_id: "EV-1".into(),
            evento_name: "Expo".into(),
            comentario: "Sonido deficiente".into(),
            departamento_id,
            departamento_name: "Audiovisuales".into(),
            responsable_email: None,
            status,
            causas: None,
            plan_accion_detalle: None,
            consecutivo_nc: None,
            comentario_cierre: None,
            reject_reason: None,
            fotos_cierre: vec![],
            gestionado: false,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            submitted_at: None,
            closed_at: None,
            approved_at: None,
            rejected_at: None,
        }
    }

    fn config_with(fecha_limite: Option<DateTime<Utc>>) -> DeadlineConfig {
        let mut config = DeadlineConfig::empty(Recinto::Cccr);
        config.fecha_limite = fecha_limite;
        config
    }

    #[test]
    fn approved_is_terminal_for_every_action_and_role() {
        for action in Action::ALL {
            for role in Role::ALL {
                assert!(transition(Aprobado, action, role).is_err(), "{action:?} by {role}");
            }
        }
    }

    #[test]
    fn review_approve_reject_require_privileged_role() {
        for action in [Action::Review, Action::Approve, Action::Reject] {
            assert!(matches!(transition(Cerrado, action, Role::Usuario), Err(AppError::Forbidden)));
        }
        assert_eq!(transition(Cerrado, Action::Review, Role::Calidad).unwrap(), Revision);
        assert_eq!(transition(Revision, Action::Approve, Role::Administrador).unwrap(), Aprobado);
        assert_eq!(transition(Revision, Action::Reject, Role::Calidad).unwrap(), Rechazado);
    }

    #[test]
    fn revision_is_only_reached_through_review() {
        for action in Action::ALL {
            if action != Action::Review {
                assert_ne!(action.target(), Revision);
            }
        }
        assert!(transition(EnProceso, Action::Review, Role::Calidad).is_err());
    }

    #[test]
    fn rejected_plan_can_be_restarted_and_resubmitted() {
        assert_eq!(transition(Rechazado, Action::Start, Role::Usuario).unwrap(), EnProceso);
        assert_eq!(transition(Rechazado, Action::Submit, Role::Usuario).unwrap(), Cerrado);
        assert!(transition(Rechazado, Action::Reopen, Role::Usuario).is_err());
    }

    #[test]
    fn edit_screen_only_moves_between_working_states() {
        assert_eq!(Action::for_edit(Abierto, EnProceso).unwrap(), Action::Start);
        assert_eq!(Action::for_edit(EnProceso, Cerrado).unwrap(), Action::Close);
        assert!(Action::for_edit(Cerrado, Aprobado).is_err());
        assert!(Action::for_edit(Cerrado, Revision).is_err());
    }

    #[test]
    fn missing_deadline_never_expires() {
        assert!(!is_expired(Utc::now(), None));
        assert!(is_expired(Utc::now(), Some(Utc::now() - Duration::minutes(1))));
        assert!(!is_expired(Utc::now(), Some(Utc::now() + Duration::minutes(1))));
    }

    #[test]
    fn expired_deadline_locks_department_users_unless_unlocked() {
        let dept = Uuid::new_v4();
        let now = Utc::now();
        let usuario = user(Role::Usuario, Some(dept));
        let abierto = plan(Abierto, dept);
        let mut config = config_with(Some(now - Duration::hours(1)));

        assert!(matches!(ensure_editable(&usuario, &abierto, &config, now), Err(AppError::EditLocked)));

        config.unlocked_departments.insert(dept, true);
        assert!(can_edit(&usuario, &abierto, &config, now));
    }

    #[test]
    fn closed_states_lock_department_users_even_before_deadline() {
        let dept = Uuid::new_v4();
        let now = Utc::now();
        let usuario = user(Role::Usuario, Some(dept));
        let config = config_with(Some(now + Duration::days(2)));

        for status in [Cerrado, Revision, Aprobado] {
            assert!(!can_edit(&usuario, &plan(status, dept), &config, now), "{status}");
        }
        for status in [Abierto, EnProceso, Rechazado] {
            assert!(can_edit(&usuario, &plan(status, dept), &config, now), "{status}");
        }
    }

    #[test]
    fn privileged_roles_bypass_locks_except_approved() {
        let dept = Uuid::new_v4();
        let now = Utc::now();
        let calidad = user(Role::Calidad, None);
        let config = config_with(Some(now - Duration::days(1)));

        assert!(can_edit(&calidad, &plan(Cerrado, dept), &config, now));
        assert!(can_edit(&calidad, &plan(Revision, dept), &config, now));
        assert!(!can_edit(&calidad, &plan(Aprobado, dept), &config, now));
    }

    #[test]
    fn users_cannot_touch_other_departments() {
        let now = Utc::now();
        let usuario = user(Role::Usuario, Some(Uuid::new_v4()));
        let other = plan(Abierto, Uuid::new_v4());
        let config = config_with(None);
        assert!(matches!(ensure_editable(&usuario, &other, &config, now), Err(AppError::Forbidden)));

        let sin_depto = user(Role::Usuario, None);
        assert!(!can_edit(&sin_depto, &other, &config, now));
    }

    #[test]
    fn closed_plan_can_still_be_submitted_before_deadline() {
        let dept = Uuid::new_v4();
        let now = Utc::now();
        let usuario = user(Role::Usuario, Some(dept));
        let config = config_with(Some(now + Duration::hours(3)));

        assert_eq!(ensure_submittable(&usuario, &plan(Cerrado, dept), &config, now).unwrap(), Cerrado);

        let mut enviado = plan(Cerrado, dept);
        enviado.gestionado = true;
        assert!(matches!(
            ensure_submittable(&usuario, &enviado, &config, now),
            Err(AppError::AlreadySubmitted)
        ));

        let expired = config_with(Some(now - Duration::hours(3)));
        assert!(matches!(
            ensure_submittable(&usuario, &plan(EnProceso, dept), &expired, now),
            Err(AppError::EditLocked)
        ));
    }
}
