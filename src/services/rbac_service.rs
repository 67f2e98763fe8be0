// src/services/rbac_service.rs

use crate::{
    common::{db_utils::FacilityPools, error::AppError},
    db::RbacRepository,
    models::{
        auth::Role,
        rbac::{Module, ModuleMap, PermissionMatrix, RoleInfo},
        recinto::Recinto,
    },
};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    pools: FacilityPools,
}

/// Falha com `Forbidden` se o papel não estiver na lista.
pub fn ensure_role(role: Role, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Administrador nunca perde a tela de papéis; sem ela ninguém mais edita a matriz.
pub fn protect_admin_access(role: Role, modules: &ModuleMap) -> ModuleMap {
    let mut modules = modules.clone();
    if role == Role::Administrador {
        if modules.get(&Module::Roles) == Some(&false) {
            tracing::warn!("Tentativa de remover '{}' de {role} ignorada", Module::Roles);
        }
        modules.insert(Module::Roles, true);
    }
    modules
}

impl RbacService {
    pub fn new(repo: RbacRepository, pools: FacilityPools) -> Self {
        Self { repo, pools }
    }

    pub fn roles(&self) -> Vec<RoleInfo> {
        Role::ALL
            .into_iter()
            .map(|role| RoleInfo { name: role, description: role.description() })
            .collect()
    }

    pub async fn matrix(&self, recinto: Recinto) -> Result<PermissionMatrix, AppError> {
        let rows = self.repo.list_rows(recinto).await?;
        Ok(PermissionMatrix::from_rows(&rows))
    }

    pub async fn permissions_for(&self, recinto: Recinto, role: Role) -> Result<ModuleMap, AppError> {
        Ok(self.matrix(recinto).await?.for_role(role))
    }

    pub async fn allows(&self, recinto: Recinto, role: Role, module: Module) -> Result<bool, AppError> {
        Ok(self.matrix(recinto).await?.allows(role, module))
    }

    pub async fn update_role_permissions(
        &self,
        recinto: Recinto,
        role: Role,
        modules: &ModuleMap,
    ) -> Result<ModuleMap, AppError> {
        let modules = protect_admin_access(role, modules);

        // 1. Inicia Transação
        let mut tx = self.pools.get(recinto).begin().await?;

        // 2. Grava cada módulo
        for (module, visible) in &modules {
            self.repo.upsert(&mut *tx, recinto, role, *module, *visible).await?;
        }

        // 3. Commit
        tx.commit().await?;
        tracing::info!("Permissões de {role} atualizadas em {recinto} ({} módulos)", modules.len());

        self.permissions_for(recinto, role).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrador_always_keeps_the_roles_screen() {
        let mut modules = ModuleMap::new();
        modules.insert(Module::Roles, false);
        modules.insert(Module::Reportes, false);

        let admin = protect_admin_access(Role::Administrador, &modules);
        assert_eq!(admin.get(&Module::Roles), Some(&true));
        assert_eq!(admin.get(&Module::Reportes), Some(&false));

        // Mapa parcial sem Roles também grava a permissão
        let partial = protect_admin_access(Role::Administrador, &ModuleMap::new());
        assert_eq!(partial.get(&Module::Roles), Some(&true));

        let calidad = protect_admin_access(Role::Calidad, &modules);
        assert_eq!(calidad, modules);
    }

    #[test]
    fn ensure_role_only_accepts_listed_roles() {
        let admins = [Role::Administrador];
        assert!(ensure_role(Role::Administrador, &admins).is_ok());
        assert!(matches!(ensure_role(Role::Calidad, &admins), Err(AppError::Forbidden)));
    }
}
