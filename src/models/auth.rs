// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{rbac::Module, recinto::Recinto};

// ---
// Papéis do sistema (conjunto fechado)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Role {
    #[serde(rename = "Usuario")]
    Usuario,
    #[serde(rename = "Calidad")]
    Calidad,
    #[serde(rename = "Administrador")]
    Administrador,
}

#[derive(Debug, thiserror::Error)]
#[error("Papel desconhecido: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::Usuario, Role::Calidad, Role::Administrador];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Usuario => "Usuario",
            Role::Calidad => "Calidad",
            Role::Administrador => "Administrador",
        }
    }

    /// Calidad e Administrador ignoram o bloqueio por prazo.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Calidad | Role::Administrador)
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::Usuario => "Puede ver eventos y gestionar los planes de acción asignados a su departamento.",
            Role::Calidad => "Puede ver todos los planes de acción y tiene permisos para aprobar o rechazar cierres.",
            Role::Administrador => "Acceso total a la configuración del sistema, gestión de usuarios, departamentos y tiempos.",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Usuario" => Ok(Role::Usuario),
            "Calidad" => Ok(Role::Calidad),
            "Administrador" => Ok(Role::Administrador),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = "9f1c2a7e-5b0d-4c1e-8a55-0d3c6b1f2e90")]
    pub uid: String,
    #[schema(example = "ana.perez@costaricacc.com")]
    pub email: String,
    #[schema(example = "Ana Pérez")]
    pub display_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub department_id: Option<Uuid>,
    pub department_name: Option<String>,
    #[sqlx(try_from = "String")]
    pub recinto: Recinto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identidade confirmada pelo provedor corporativo (Microsoft Entra).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub uid: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "required"))]
    pub id_token: String,
    #[schema(example = "CCCR")]
    pub recinto: Recinto,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    #[schema(value_type = Object)]
    pub permissions: BTreeMap<Module, bool>,
}

// Estrutura de dados ("claims") dentro do JWT de sessão
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,       // uid do usuário
    pub recinto: Recinto,  // recinto escolhido no login
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_quality_and_admin_are_privileged() {
        assert!(!Role::Usuario.is_privileged());
        assert!(Role::Calidad.is_privileged());
        assert!(Role::Administrador.is_privileged());
    }

    #[test]
    fn role_round_trips_through_its_stored_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("Gerente".parse::<Role>().is_err());
    }
}
