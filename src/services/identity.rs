// src/services/identity.rs

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{common::error::AppError, models::auth::ExternalIdentity};

/// Verificação do token de identidade corporativa enviado pelo front-end.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, AppError>;
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Conjunto de chaves públicas (JWKS) do provedor.
    pub jwks_url: String,
    /// Client id da SPA (audiência do ID token).
    pub audience: String,
    /// Tenants (`tid`) aceitos. O JWKS `common` assina tokens de qualquer tenant.
    pub allowed_tenants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    tid: Option<String>,
    oid: Option<String>,
    email: Option<String>,
    /// O domínio do `email` foi verificado pelo tenant.
    #[serde(default)]
    xms_edov: bool,
    preferred_username: Option<String>,
    upn: Option<String>,
    name: Option<String>,
}

impl IdTokenClaims {
    fn into_identity(self, allowed_tenants: &[String]) -> Result<ExternalIdentity, AppError> {
        let tid = self
            .tid
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::InvalidIdentity("token sem 'tid'".into()))?;
        if !allowed_tenants.iter().any(|allowed| allowed.trim().eq_ignore_ascii_case(&tid)) {
            tracing::warn!("Token de tenant não autorizado: {tid}");
            return Err(AppError::InvalidIdentity(format!("tenant '{tid}' não autorizado")));
        }

        // `email` é editável pelo usuário; só vale com domínio verificado.
        let verified_email = self.email.filter(|_| self.xms_edov);
        let email = self
            .preferred_username
            .or(self.upn)
            .or(verified_email)
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::InvalidIdentity("token sem e-mail".into()))?;

        let display_name = self.name.unwrap_or_else(|| email.clone());
        // `oid` só é único dentro do tenant.
        let uid = format!("{tid}:{}", self.oid.unwrap_or(self.sub));
        Ok(ExternalIdentity { uid, email, display_name })
    }
}

/// Microsoft Entra ID: valida RS256 contra as chaves publicadas.
pub struct MicrosoftIdentity {
    http: reqwest::Client,
    config: IdentityConfig,
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl MicrosoftIdentity {
    pub fn new(http: reqwest::Client, config: IdentityConfig) -> Self {
        Self { http, config, keys: RwLock::new(HashMap::new()) }
    }

    async fn refresh_keys(&self) -> Result<(), AppError> {
        let jwks: Jwks = self
            .http
            .get(&self.config.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else { continue };
            if jwk.kty != "RSA" {
                continue;
            }
            match DecodingKey::from_rsa_components(&n, &e) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(err) => tracing::warn!("Chave JWKS '{kid}' ignorada: {err}"),
            }
        }

        tracing::debug!("JWKS carregado: {} chave(s)", keys.len());
        *self.keys.write().await = keys;
        Ok(())
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AppError> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        // Chave nova (rotação): recarrega o conjunto uma vez.
        self.refresh_keys().await?;
        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| AppError::InvalidIdentity(format!("chave '{kid}' desconhecida")))
    }
}

#[async_trait]
impl IdentityProvider for MicrosoftIdentity {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, AppError> {
        let header = decode_header(id_token).map_err(|e| AppError::InvalidIdentity(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AppError::InvalidIdentity("token sem 'kid'".into()))?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.config.audience.as_str()]);

        let data = decode::<IdTokenClaims>(id_token, &key, &validation)
            .map_err(|e| AppError::InvalidIdentity(e.to_string()))?;

        data.claims.into_identity(&self.config.allowed_tenants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const TEST_KEY_PEM: &str = include_str!("../../testdata/identity_rsa.pem");
    const TEST_KEY_N: &str = include_str!("../../testdata/identity_rsa.n");

    fn sign(kid: &str, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(TEST_KEY_PEM.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    fn claims(aud: &str) -> serde_json::Value {
        json!({
            "sub": "sub-1",
            "tid": "tenant-gh",
            "oid": "oid-1",
            "aud": aud,
            "preferred_username": "Ana.Perez@CostaRicaCC.com",
            "name": "Ana Pérez",
            "exp": chrono::Utc::now().timestamp() + 600,
        })
    }

    async fn provider(server: &mut mockito::Server, hits: usize) -> (MicrosoftIdentity, mockito::Mock) {
        let jwks = json!({ "keys": [{ "kid": "k1", "kty": "RSA", "n": TEST_KEY_N.trim(), "e": "AQAB" }] });
        let mock = server
            .mock("GET", "/keys")
            .with_status(200)
            .with_body(jwks.to_string())
            .expect(hits)
            .create_async()
            .await;

        let identity = MicrosoftIdentity::new(
            reqwest::Client::new(),
            IdentityConfig {
                jwks_url: format!("{}/keys", server.url()),
                audience: "spa-client".into(),
                allowed_tenants: vec!["tenant-gh".into()],
            },
        );
        (identity, mock)
    }

    #[tokio::test]
    async fn verifies_token_and_caches_keys() {
        let mut server = mockito::Server::new_async().await;
        let (identity, jwks) = provider(&mut server, 1).await;
        let token = sign("k1", claims("spa-client"));

        let first = identity.verify(&token).await.unwrap();
        assert_eq!(first.uid, "tenant-gh:oid-1");
        assert_eq!(first.email, "ana.perez@costaricacc.com");
        assert_eq!(first.display_name, "Ana Pérez");

        identity.verify(&token).await.unwrap();
        jwks.assert_async().await;
    }

    #[tokio::test]
    async fn rejects_wrong_audience() {
        let mut server = mockito::Server::new_async().await;
        let (identity, _jwks) = provider(&mut server, 1).await;

        let err = identity.verify(&sign("k1", claims("other-app"))).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentity(_)));
    }

    #[tokio::test]
    async fn unknown_key_id_is_rejected_after_refresh() {
        let mut server = mockito::Server::new_async().await;
        let (identity, jwks) = provider(&mut server, 1).await;

        let err = identity.verify(&sign("rotated", claims("spa-client"))).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentity(msg) if msg.contains("rotated")));
        jwks.assert_async().await;
    }

    #[tokio::test]
    async fn garbage_token_is_invalid_identity() {
        let mut server = mockito::Server::new_async().await;
        let (identity, _jwks) = provider(&mut server, 0).await;
        assert!(matches!(identity.verify("not-a-jwt").await, Err(AppError::InvalidIdentity(_))));
    }

    #[tokio::test]
    async fn foreign_tenant_with_spoofed_email_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let (identity, _jwks) = provider(&mut server, 1).await;

        let mut foreign = claims("spa-client");
        foreign["tid"] = json!("tenant-externo");
        foreign["email"] = json!("a@grupoheroica.com");
        foreign["xms_edov"] = json!(true);

        let err = identity.verify(&sign("k1", foreign)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentity(msg) if msg.contains("tenant-externo")));
    }

    #[test]
    fn unverified_email_claim_is_ignored() {
        let tenants = vec!["tenant-gh".to_string()];
        let parse = |value: serde_json::Value| serde_json::from_value::<IdTokenClaims>(value).unwrap();

        let spoofed = parse(json!({
            "sub": "s", "tid": "tenant-gh", "oid": "o",
            "email": "a@grupoheroica.com",
            "preferred_username": "ana@gmail.com",
        }));
        assert_eq!(spoofed.into_identity(&tenants).unwrap().email, "ana@gmail.com");

        let only_email = parse(json!({ "sub": "s", "tid": "tenant-gh", "email": "a@grupoheroica.com" }));
        assert!(matches!(only_email.into_identity(&tenants), Err(AppError::InvalidIdentity(_))));

        let verified = parse(json!({
            "sub": "s", "tid": "tenant-gh", "email": "A@grupoheroica.com", "xms_edov": true,
        }));
        let identity = verified.into_identity(&tenants).unwrap();
        assert_eq!(identity.email, "a@grupoheroica.com");
        assert_eq!(identity.uid, "tenant-gh:s");
    }

    #[test]
    fn token_without_tenant_is_rejected() {
        let claims: IdTokenClaims =
            serde_json::from_value(json!({ "sub": "s", "preferred_username": "a@costaricacc.com" })).unwrap();
        assert!(matches!(claims.into_identity(&["tenant-gh".to_string()]), Err(AppError::InvalidIdentity(_))));
    }
}
