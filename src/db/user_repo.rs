use uuid::Uuid;

use crate::{
    common::{db_utils::FacilityPools, error::AppError},
    models::{
        auth::{ExternalIdentity, Role, User},
        recinto::Recinto,
    },
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pools: FacilityPools,
}

impl UserRepository {
    pub fn new(pools: FacilityPools) -> Self {
        Self { pools }
    }

    pub async fn find_by_uid(&self, recinto: Recinto, uid: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE recinto = $1 AND uid = $2")
            .bind(recinto.code())
            .bind(uid)
            .fetch_optional(self.pools.get(recinto))
            .await?;

        Ok(user)
    }

    // Cria o usuário no primeiro login; nos seguintes só atualiza nome e e-mail.
    pub async fn upsert_on_login(&self, recinto: Recinto, identity: &ExternalIdentity) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (recinto, uid, email, display_name, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (recinto, uid)
            DO UPDATE SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(recinto.code())
        .bind(&identity.uid)
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(Role::Usuario.as_str())
        .fetch_one(self.pools.get(recinto))
        .await?;

        Ok(user)
    }

    pub async fn list(&self, recinto: Recinto) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE recinto = $1 ORDER BY display_name, email",
        )
        .bind(recinto.code())
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(users)
    }

    pub async fn update_role(&self, recinto: Recinto, uid: &str, role: Role) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET role = $3, updated_at = NOW() WHERE recinto = $1 AND uid = $2 RETURNING *",
        )
        .bind(recinto.code())
        .bind(uid)
        .bind(role.as_str())
        .fetch_optional(self.pools.get(recinto))
        .await?
        .ok_or(AppError::UserNotFound)
    }

    pub async fn update_department(
        &self,
        recinto: Recinto,
        uid: &str,
        department_id: Uuid,
        department_name: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET department_id = $3, department_name = $4, updated_at = NOW()
            WHERE recinto = $1 AND uid = $2
            RETURNING *
            "#,
        )
        .bind(recinto.code())
        .bind(uid)
        .bind(department_id)
        .bind(department_name)
        .fetch_optional(self.pools.get(recinto))
        .await?
        .ok_or(AppError::UserNotFound)
    }

    /// Auto-seleção do departamento: só grava se o usuário ainda não tiver um.
    pub async fn set_department_if_empty(
        &self,
        recinto: Recinto,
        uid: &str,
        department_id: Uuid,
        department_name: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET department_id = $3, department_name = $4, updated_at = NOW()
            WHERE recinto = $1 AND uid = $2 AND department_id IS NULL
            RETURNING *
            "#,
        )
        .bind(recinto.code())
        .bind(uid)
        .bind(department_id)
        .bind(department_name)
        .fetch_optional(self.pools.get(recinto))
        .await?;

        Ok(user)
    }

    // --- Destinatários de notificações ---

    pub async fn all_emails(&self, recinto: Recinto) -> Result<Vec<String>, AppError> {
        let emails = sqlx::query_scalar::<_, String>(
            "SELECT email FROM users WHERE recinto = $1 AND email <> '' ORDER BY email",
        )
        .bind(recinto.code())
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(emails)
    }

    pub async fn emails_by_department(&self, recinto: Recinto, department_id: Uuid) -> Result<Vec<String>, AppError> {
        let emails = sqlx::query_scalar::<_, String>(
            r#"
            SELECT email FROM users
            WHERE recinto = $1 AND department_id = $2 AND email <> ''
            ORDER BY email
            "#,
        )
        .bind(recinto.code())
        .bind(department_id)
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(emails)
    }

    pub async fn emails_by_roles(&self, recinto: Recinto, roles: &[Role]) -> Result<Vec<String>, AppError> {
        let role_names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();

        let emails = sqlx::query_scalar::<_, String>(
            r#"
            SELECT email FROM users
            WHERE recinto = $1 AND role = ANY($2) AND email <> ''
            ORDER BY email
            "#,
        )
        .bind(recinto.code())
        .bind(&role_names)
        .fetch_all(self.pools.get(recinto))
        .await?;

        Ok(emails)
    }
}
