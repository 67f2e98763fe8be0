// src/services/deadline_service.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DeadlineRepository, DepartmentRepository},
    models::{deadline::DeadlineConfig, recinto::Recinto},
    services::notifications::Notifier,
};

#[derive(Clone)]
pub struct DeadlineService {
    repo: DeadlineRepository,
    departments: DepartmentRepository,
    notifier: Notifier,
}

impl DeadlineService {
    pub fn new(repo: DeadlineRepository, departments: DepartmentRepository, notifier: Notifier) -> Self {
        Self { repo, departments, notifier }
    }

    pub async fn get(&self, recinto: Recinto) -> Result<DeadlineConfig, AppError> {
        self.repo.load(recinto).await
    }

    /// Grava o prazo; um prazo novo (não nulo) avisa todos os usuários do recinto.
    pub async fn set_fecha_limite(
        &self,
        recinto: Recinto,
        fecha_limite: Option<DateTime<Utc>>,
    ) -> Result<DeadlineConfig, AppError> {
        self.repo.set_fecha_limite(recinto, fecha_limite).await?;

        match fecha_limite {
            Some(fecha) => {
                tracing::info!("Prazo de {recinto} definido para {fecha}");
                self.notifier.deadline_updated(recinto, fecha);
            }
            None => tracing::info!("Prazo de {recinto} removido"),
        }

        self.repo.load(recinto).await
    }

    pub async fn set_unlocked(
        &self,
        recinto: Recinto,
        department_id: Uuid,
        unlocked: bool,
    ) -> Result<DeadlineConfig, AppError> {
        // Garante que o departamento existe no recinto.
        self.departments.find(recinto, department_id).await?;
        self.repo.set_unlocked(recinto, department_id, unlocked).await?;
        self.repo.load(recinto).await
    }
}
