// src/services/auth.rs

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::{AuthResponse, Claims, User},
        recinto::Recinto,
    },
    services::identity::IdentityProvider,
};

const SESSION_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    identity: Arc<dyn IdentityProvider>,
    jwt_secret: String,
}

/// O e-mail precisa pertencer a um dos domínios do recinto escolhido.
pub fn ensure_domain(recinto: Recinto, email: &str) -> Result<(), AppError> {
    if recinto.domain_allowed(email) {
        return Ok(());
    }
    let domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or(email).to_lowercase();
    Err(AppError::DomainNotAllowed { domain, recinto })
}

impl AuthService {
    pub fn new(user_repo: UserRepository, identity: Arc<dyn IdentityProvider>, jwt_secret: String) -> Self {
        Self { user_repo, identity, jwt_secret }
    }

    pub async fn login(&self, id_token: &str, recinto: Recinto) -> Result<AuthResponse, AppError> {
        // 1. Identidade corporativa
        let identity = self.identity.verify(id_token).await?;

        // 2. Domínio permitido no recinto
        if let Err(e) = ensure_domain(recinto, &identity.email) {
            tracing::warn!("Login recusado: {} em {}", identity.email, recinto);
            return Err(e);
        }

        // 3. Cria ou atualiza o perfil
        let user = self.user_repo.upsert_on_login(recinto, &identity).await?;
        tracing::info!("🔑 Login de {} ({}) em {}", user.email, user.role, recinto);

        // 4. Sessão própria
        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    /// Decodifica o token de sessão sem tocar no banco.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    /// Valida o token e relê o usuário (o papel pode ter mudado).
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        self.user_repo
            .find_by_uid(claims.recinto, &claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(SESSION_DAYS);

        let claims = Claims {
            sub: user.uid.clone(),
            recinto: user.recinto,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
