pub mod auth;
pub mod deadline_service;
pub mod department_service;
pub mod identity;
pub mod lifecycle;
pub mod mail;
pub mod notifications;
pub mod plan_service;
pub mod rbac_service;
pub mod reminder;
pub mod report_service;
pub mod skill;
pub mod user_service;
