// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::update_role,
        handlers::users::assign_department,
        handlers::users::select_my_department,

        // --- Departments ---
        handlers::departments::list_departments,
        handlers::departments::create_department,
        handlers::departments::update_department,
        handlers::departments::delete_department,

        // --- RBAC ---
        handlers::rbac::list_roles,
        handlers::rbac::get_matrix,
        handlers::rbac::update_role_permissions,

        // --- Deadlines ---
        handlers::deadlines::get_deadline,
        handlers::deadlines::set_deadline,
        handlers::deadlines::set_unlock,

        // --- Plans ---
        handlers::plans::create_plan,
        handlers::plans::list_plans,
        handlers::plans::get_plan,
        handlers::plans::update_plan,
        handlers::plans::submit_plan,

        // --- Approvals ---
        handlers::approvals::list_pending,
        handlers::approvals::approve_plan,
        handlers::approvals::reject_plan,
        handlers::approvals::review_plan,

        // --- Reports / Dashboard ---
        handlers::reports::list_history,
        handlers::reports::export_history,
        handlers::dashboard::get_results,

        // --- Eventos ---
        handlers::eventos::list_eventos,
    ),
    components(
        schemas(
            // --- Recinto ---
            models::recinto::Recinto,

            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,

            // --- RBAC ---
            models::rbac::Module,
            models::rbac::PermissionMatrix,
            models::rbac::RoleInfo,
            models::rbac::UpdatePermissionsPayload,

            // --- Departments ---
            models::department::Department,
            models::department::DepartmentPayload,
            models::department::AssignDepartmentPayload,

            // --- Deadlines ---
            models::deadline::DeadlineConfig,
            models::deadline::UpdateDeadlinePayload,
            models::deadline::UnlockPayload,

            // --- Plans ---
            models::plan::PlanStatus,
            models::plan::ActionPlan,
            models::plan::PlanView,
            models::plan::CreatePlanPayload,
            models::plan::UpdatePlanPayload,
            models::plan::RejectPayload,

            // --- Dashboard ---
            models::dashboard::PlanStats,
            models::dashboard::DeptStat,
            models::dashboard::ResultsResponse,

            // --- Eventos ---
            models::evento::Evento,

            // --- Payloads ---
            handlers::users::UpdateRolePayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login com a conta corporativa"),
        (name = "Users", description = "Usuários, papéis e departamento"),
        (name = "Departments", description = "Departamentos do recinto"),
        (name = "RBAC", description = "Matriz de permissões por papel"),
        (name = "Deadlines", description = "Tiempos Límites e liberações"),
        (name = "Plans", description = "Planos de ação"),
        (name = "Approvals", description = "Aprovação e rejeição de planos"),
        (name = "Reports", description = "Histórico e exportação"),
        (name = "Dashboard", description = "Resultados por estado e departamento"),
        (name = "Eventos", description = "Eventos da API externa")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
