pub mod auth;
pub mod dashboard;
pub mod deadline;
pub mod department;
pub mod evento;
pub mod plan;
pub mod rbac;
pub mod recinto;
