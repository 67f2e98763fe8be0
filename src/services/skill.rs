// src/services/skill.rs

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    models::{evento::Evento, recinto::Recinto},
};

pub const DEFAULT_BASE_URL: &str = "https://grupoheroicaapi.skillsuite.net/app/wssuite/api";

/// Cabeçalhos do cliente repassados ao upstream.
const FORWARDED_HEADERS: [&str; 3] = ["authorization", "iddata", "companyauthid"];

#[derive(Debug, Clone)]
pub struct SkillConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub company_auth_id: String,
}

/// Resposta do upstream, devolvida sem alterações.
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Cliente da API de eventos (Skill).
#[derive(Clone)]
pub struct SkillClient {
    http: reqwest::Client,
    config: SkillConfig,
}

impl SkillClient {
    pub fn new(http: reqwest::Client, config: SkillConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path_and_query)
    }

    /// Repassa uma requisição do navegador. Só erros de transporte viram `Err`.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ProxyResponse, reqwest::Error> {
        let url = self.url(path_and_query);
        tracing::info!("Proxy {} -> {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json");

        for name in FORWARDED_HEADERS {
            let value = headers
                .get(name)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(""));
            request = request.header(name, value);
        }

        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await?;

        Ok(ProxyResponse { status, content_type, body })
    }

    /// Login com as credenciais de serviço; devolve o token.
    pub async fn authenticate(&self) -> Result<String, AppError> {
        let payload = json!({
            "username": self.config.username.trim(),
            "password": self.config.password.trim(),
            "companyAuthId": self.config.company_auth_id.trim(),
            "companyId": "",
        });

        let response: Value = self
            .http
            .post(self.url("/authenticate"))
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if response.get("success") == Some(&Value::Bool(false)) {
            let code = response.get("errorCode").map(Value::to_string).unwrap_or_default();
            let message = response
                .get("errorMessage")
                .and_then(Value::as_str)
                .unwrap_or("Credenciales inválidas");
            return Err(AppError::UpstreamError(format!("Skill API ({code}): {message}")));
        }

        response
            .pointer("/result/token")
            .or_else(|| response.get("token"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::UpstreamError("No se encontró el token en la respuesta".into()))
    }

    pub async fn events(
        &self,
        token: &str,
        recinto: Recinto,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Evento>, AppError> {
        let response = self
            .http
            .post(self.url("/events"))
            .bearer_auth(token)
            .header("idData", recinto.id_data().to_string())
            .header("companyAuthId", self.config.company_auth_id.trim())
            .json(&json!({ "Events": { "startDate": start_date, "endDate": end_date } }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamError(format!("Skill /events respondeu {status}: {body}")));
        }

        let body: Value = response.json().await?;
        let events = body
            .pointer("/result/events")
            .or_else(|| body.get("events"))
            .cloned()
            .unwrap_or_else(|| Value::Array(vec![]));

        serde_json::from_value(events)
            .map_err(|e| AppError::UpstreamError(format!("Eventos com formato inesperado: {e}")))
    }

    pub async fn fetch_events(&self, recinto: Recinto, start_date: &str, end_date: &str) -> Result<Vec<Evento>, AppError> {
        let token = self.authenticate().await?;
        self.events(&token, recinto, start_date, end_date).await
    }
}
