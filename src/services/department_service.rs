// src/services/department_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DepartmentRepository,
    models::{
        department::{Department, DepartmentPayload},
        recinto::Recinto,
    },
};

#[derive(Clone)]
pub struct DepartmentService {
    repo: DepartmentRepository,
}

fn manager_email(payload: &DepartmentPayload) -> Option<&str> {
    payload
        .manager_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
}

impl DepartmentService {
    pub fn new(repo: DepartmentRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, recinto: Recinto) -> Result<Vec<Department>, AppError> {
        self.repo.list(recinto).await
    }

    pub async fn create(&self, recinto: Recinto, payload: &DepartmentPayload) -> Result<Department, AppError> {
        self.repo.create(recinto, &payload.name, manager_email(payload)).await
    }

    pub async fn update(&self, recinto: Recinto, id: Uuid, payload: &DepartmentPayload) -> Result<Department, AppError> {
        self.repo.update(recinto, id, &payload.name, manager_email(payload)).await
    }

    pub async fn delete(&self, recinto: Recinto, id: Uuid) -> Result<(), AppError> {
        self.repo.delete(recinto, id).await?;
        tracing::info!("Departamento {id} removido de {recinto}");
        Ok(())
    }
}
