// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::Module,
};

/// 1. O Trait que liga um tipo a um módulo da matriz
pub trait ModuleDef: Send + Sync + 'static {
    fn module() -> Module;
}

/// 2. O Extractor (Guardião)
pub struct RequireModule<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts

impl<T, S> FromRequestParts<S> for RequireModule<T>
where
    T: ModuleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

        // A. Extrai Usuário (colocado pelo auth_guard)
        let AuthenticatedUser(user) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        // B. Verifica na matriz do recinto
        let module = T::module();
        let allowed = app_state
            .rbac_service
            .allows(user.recinto, user.role, module)
            .await
            .map_err(|e| e.to_api_error(&locale))?;

        if !allowed {
            return Err(AppError::ModuleNotAllowed(module).to_api_error(&locale));
        }

        Ok(RequireModule(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS MÓDULOS (TIPOS)
// ---
// Module::Dashboard é a tela inicial do front-end e não guarda nenhuma rota.

pub struct ModEventos;
impl ModuleDef for ModEventos {
    fn module() -> Module { Module::Eventos }
}

pub struct ModPlanes;
impl ModuleDef for ModPlanes {
    fn module() -> Module { Module::Planes }
}

pub struct ModAprobaciones;
impl ModuleDef for ModAprobaciones {
    fn module() -> Module { Module::Aprobaciones }
}

pub struct ModReportes;
impl ModuleDef for ModReportes {
    fn module() -> Module { Module::Reportes }
}

pub struct ModResultados;
impl ModuleDef for ModResultados {
    fn module() -> Module { Module::Resultados }
}

pub struct ModUsuarios;
impl ModuleDef for ModUsuarios {
    fn module() -> Module { Module::Usuarios }
}

pub struct ModDepartamentos;
impl ModuleDef for ModDepartamentos {
    fn module() -> Module { Module::Departamentos }
}

pub struct ModRoles;
impl ModuleDef for ModRoles {
    fn module() -> Module { Module::Roles }
}

pub struct ModTiempos;
impl ModuleDef for ModTiempos {
    fn module() -> Module { Module::Tiempos }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_module_but_the_home_screen_guards_routes() {
        let gated = [
            ModEventos::module(),
            ModPlanes::module(),
            ModAprobaciones::module(),
            ModReportes::module(),
            ModResultados::module(),
            ModUsuarios::module(),
            ModDepartamentos::module(),
            ModRoles::module(),
            ModTiempos::module(),
        ];

        assert!(!gated.contains(&Module::Dashboard));
        for module in Module::ALL.into_iter().filter(|m| *m != Module::Dashboard) {
            assert!(gated.contains(&module), "{module:?} sem marcador");
        }
    }
}
