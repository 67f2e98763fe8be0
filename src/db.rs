pub mod user_repo;
pub use user_repo::UserRepository;
pub mod department_repo;
pub use department_repo::DepartmentRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod plan_repo;
pub use plan_repo::PlanRepository;
pub mod deadline_repo;
pub use deadline_repo::DeadlineRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
