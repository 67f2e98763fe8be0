// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use utoipa::ToSchema;

use crate::models::auth::Role;

/// Telas (módulos) cuja visibilidade é controlada pela matriz de permissões.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Dashboard,
    Eventos,
    Planes,
    Aprobaciones,
    Reportes,
    Resultados,
    Usuarios,
    Departamentos,
    Roles,
    Tiempos,
}

#[derive(Debug, thiserror::Error)]
#[error("Módulo desconhecido: {0}")]
pub struct UnknownModule(pub String);

impl Module {
    pub const ALL: [Module; 10] = [
        Module::Dashboard,
        Module::Eventos,
        Module::Planes,
        Module::Aprobaciones,
        Module::Reportes,
        Module::Resultados,
        Module::Usuarios,
        Module::Departamentos,
        Module::Roles,
        Module::Tiempos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Eventos => "eventos",
            Module::Planes => "planes",
            Module::Aprobaciones => "aprobaciones",
            Module::Reportes => "reportes",
            Module::Resultados => "resultados",
            Module::Usuarios => "usuarios",
            Module::Departamentos => "departamentos",
            Module::Roles => "roles",
            Module::Tiempos => "tiempos",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownModule(s.to_string()))
    }
}

/// Visibilidade de cada módulo para um papel.
pub type ModuleMap = BTreeMap<Module, bool>;

/// Matriz padrão, usada quando o recinto não tem linhas gravadas.
pub fn default_permissions(role: Role) -> ModuleMap {
    Module::ALL
        .into_iter()
        .map(|module| {
            let visible = match role {
                Role::Administrador => true,
                Role::Calidad => module != Module::Usuarios,
                Role::Usuario => matches!(
                    module,
                    Module::Dashboard | Module::Eventos | Module::Planes | Module::Resultados
                ),
            };
            (module, visible)
        })
        .collect()
}

/// Linha crua da tabela `role_permissions`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PermissionRow {
    pub role: String,
    pub module: String,
    pub visible: bool,
}

/// Matriz completa de um recinto, já validada.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PermissionMatrix {
    #[schema(value_type = Object)]
    pub roles: BTreeMap<Role, ModuleMap>,
}

impl PermissionMatrix {
    /// Sobrepõe as linhas gravadas à matriz padrão.
    /// Linhas com papel ou módulo desconhecido são descartadas (com aviso).
    pub fn from_rows(rows: &[PermissionRow]) -> Self {
        let mut roles: BTreeMap<Role, ModuleMap> = Role::ALL
            .into_iter()
            .map(|role| (role, default_permissions(role)))
            .collect();

        for row in rows {
            let (Ok(role), Ok(module)) = (row.role.parse::<Role>(), row.module.parse::<Module>()) else {
                tracing::warn!(
                    "Permissão ignorada: papel '{}' / módulo '{}' inválidos",
                    row.role,
                    row.module
                );
                continue;
            };
            roles.entry(role).or_default().insert(module, row.visible);
        }

        Self { roles }
    }

    pub fn for_role(&self, role: Role) -> ModuleMap {
        self.roles
            .get(&role)
            .cloned()
            .unwrap_or_else(|| default_permissions(role))
    }

    pub fn allows(&self, role: Role, module: Module) -> bool {
        self.for_role(role).get(&module).copied().unwrap_or(false)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub name: Role,
    pub description: &'static str,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionsPayload {
    #[schema(value_type = Object)]
    pub modules: ModuleMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str, module: &str, visible: bool) -> PermissionRow {
        PermissionRow { role: role.into(), module: module.into(), visible }
    }

    #[test]
    fn falls_back_to_defaults_when_no_rows() {
        let matrix = PermissionMatrix::from_rows(&[]);
        assert!(matrix.allows(Role::Administrador, Module::Usuarios));
        assert!(!matrix.allows(Role::Calidad, Module::Usuarios));
        assert!(matrix.allows(Role::Calidad, Module::Aprobaciones));
        assert!(matrix.allows(Role::Usuario, Module::Planes));
        assert!(!matrix.allows(Role::Usuario, Module::Aprobaciones));
    }

    #[test]
    fn stored_rows_override_defaults_and_invalid_rows_are_skipped() {
        let matrix = PermissionMatrix::from_rows(&[
            row("Usuario", "reportes", true),
            row("Usuario", "planes", false),
            row("Usuario", "inventario", true),
            row("Gerente", "planes", true),
        ]);
        let usuario = matrix.for_role(Role::Usuario);
        assert_eq!(usuario.get(&Module::Reportes), Some(&true));
        assert_eq!(usuario.get(&Module::Planes), Some(&false));
        assert_eq!(usuario.get(&Module::Eventos), Some(&true));
        assert_eq!(usuario.len(), Module::ALL.len());
    }

    #[test]
    fn module_map_serializes_with_lowercase_keys() {
        let json = serde_json::to_value(default_permissions(Role::Usuario)).unwrap();
        assert_eq!(json["planes"], true);
        assert_eq!(json["tiempos"], false);
    }
}
