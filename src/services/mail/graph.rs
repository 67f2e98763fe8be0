// src/services/mail/graph.rs

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{EmailMessage, Mailer};
use crate::common::error::AppError;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
// Renova o token um pouco antes de expirar.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub sender_email: String,
    pub login_url: String,
    pub graph_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Envia e-mails pela Microsoft Graph com credenciais de aplicação.
pub struct GraphMailer {
    http: reqwest::Client,
    config: GraphConfig,
    token: Mutex<Option<CachedToken>>,
}

impl GraphMailer {
    pub fn new(http: reqwest::Client, config: GraphConfig) -> Self {
        Self { http, config, token: Mutex::new(None) }
    }

    async fn access_token(&self) -> Result<String, AppError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + EXPIRY_MARGIN < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.login_url.trim_end_matches('/'),
            self.config.tenant_id
        );
        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamError(format!(
                "Falha ao obter token da Graph ({status}): {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!("Token da Graph renovado (expira em {}s)", token.expires_in);

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn post_mail(&self, token: &str, message: &EmailMessage) -> Result<reqwest::Response, AppError> {
        let url = format!(
            "{}/v1.0/users/{}/sendMail",
            self.config.graph_url.trim_end_matches('/'),
            self.config.sender_email
        );
        let recipients: Vec<_> = message
            .to
            .iter()
            .map(|address| json!({ "emailAddress": { "address": address } }))
            .collect();

        let body = json!({
            "message": {
                "subject": message.subject,
                "body": { "contentType": "HTML", "content": message.html },
                "toRecipients": recipients,
            },
            "saveToSentItems": false,
        });

        Ok(self.http.post(&url).bearer_auth(token).json(&body).send().await?)
    }
}

#[async_trait]
impl Mailer for GraphMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        if message.to.is_empty() {
            return Ok(());
        }

        let token = self.access_token().await?;
        let mut response = self.post_mail(&token, message).await?;

        // Token revogado ou expirado antes da hora: renova uma única vez.
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("Graph recusou o token; renovando e reenviando");
            self.invalidate_token().await;
            let token = self.access_token().await?;
            response = self.post_mail(&token, message).await?;
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamError(format!("Graph sendMail respondeu {status}: {body}")));
        }

        tracing::info!("📧 E-mail '{}' enviado para {} destinatário(s)", message.subject, message.to.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const SENDER: &str = "notificaciones@grupoheroica.com";

    fn mailer(server: &mockito::Server) -> GraphMailer {
        GraphMailer::new(
            reqwest::Client::new(),
            GraphConfig {
                client_id: "client".into(),
                client_secret: "secret".into(),
                tenant_id: "tenant-1".into(),
                sender_email: SENDER.into(),
                login_url: server.url(),
                graph_url: server.url(),
            },
        )
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: vec!["ana@costaricacc.com".into()],
            subject: "Aprobación Pendiente: Expo".into(),
            html: "<p>hola</p>".into(),
        }
    }

    fn send_path() -> String {
        format!("/v1.0/users/{SENDER}/sendMail")
    }

    #[tokio::test]
    async fn reuses_cached_token_between_sends() {
        let mut server = mockito::Server::new_async().await;
        let token = server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .match_body(Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"Bearer","expires_in":3600,"access_token":"tok-1"}"#)
            .expect(1)
            .create_async()
            .await;
        let send = server
            .mock("POST", send_path().as_str())
            .match_header("authorization", "Bearer tok-1")
            .match_body(Matcher::PartialJson(json!({
                "message": { "toRecipients": [{ "emailAddress": { "address": "ana@costaricacc.com" } }] },
                "saveToSentItems": false
            })))
            .with_status(202)
            .expect(2)
            .create_async()
            .await;

        let mailer = mailer(&server);
        mailer.send(&message()).await.unwrap();
        mailer.send(&message()).await.unwrap();

        token.assert_async().await;
        send.assert_async().await;
    }

    #[tokio::test]
    async fn refreshes_token_once_after_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let token = server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .with_status(200)
            .with_body(r#"{"expires_in":3600,"access_token":"fresh"}"#)
            .expect(1)
            .create_async()
            .await;
        let stale = server
            .mock("POST", send_path().as_str())
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let fresh = server
            .mock("POST", send_path().as_str())
            .match_header("authorization", "Bearer fresh")
            .with_status(202)
            .expect(1)
            .create_async()
            .await;

        let mailer = mailer(&server);
        *mailer.token.lock().await = Some(CachedToken {
            access_token: "stale".into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        });

        mailer.send(&message()).await.unwrap();

        token.assert_async().await;
        stale.assert_async().await;
        fresh.assert_async().await;
    }

    #[tokio::test]
    async fn token_failure_is_reported_as_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_client"}"#)
            .create_async()
            .await;

        let err = mailer(&server).send(&message()).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamError(msg) if msg.contains("invalid_client")));
    }

    #[tokio::test]
    async fn empty_recipient_list_sends_nothing() {
        let server = mockito::Server::new_async().await;
        let mut msg = message();
        msg.to.clear();
        mailer(&server).send(&msg).await.unwrap();
    }
}
