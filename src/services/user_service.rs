// src/services/user_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DepartmentRepository, UserRepository},
    models::{
        auth::{Role, User},
        recinto::Recinto,
    },
};

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    departments: DepartmentRepository,
}

impl UserService {
    pub fn new(users: UserRepository, departments: DepartmentRepository) -> Self {
        Self { users, departments }
    }

    pub async fn list(&self, recinto: Recinto) -> Result<Vec<User>, AppError> {
        self.users.list(recinto).await
    }

    pub async fn update_role(&self, recinto: Recinto, uid: &str, role: Role) -> Result<User, AppError> {
        let user = self.users.update_role(recinto, uid, role).await?;
        tracing::info!("Papel de {} alterado para {} em {}", user.email, role, recinto);
        Ok(user)
    }

    pub async fn assign_department(&self, recinto: Recinto, uid: &str, department_id: Uuid) -> Result<User, AppError> {
        // O nome é copiado do cadastro do departamento.
        let department = self.departments.find(recinto, department_id).await?;
        self.users
            .update_department(recinto, uid, department.id, &department.name)
            .await
    }

    /// Primeiro acesso: o próprio usuário escolhe o departamento, uma única vez.
    pub async fn select_own_department(&self, user: &User, department_id: Uuid) -> Result<User, AppError> {
        if user.department_id.is_some() {
            return Err(AppError::DepartmentAlreadySelected);
        }
        let department = self.departments.find(user.recinto, department_id).await?;

        self.users
            .set_department_if_empty(user.recinto, &user.uid, department.id, &department.name)
            .await?
            .ok_or(AppError::DepartmentAlreadySelected)
    }
}
