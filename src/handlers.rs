pub mod approvals;
pub mod auth;
pub mod dashboard;
pub mod deadlines;
pub mod departments;
pub mod eventos;
pub mod plans;
pub mod proxy;
pub mod rbac;
pub mod reports;
pub mod users;
