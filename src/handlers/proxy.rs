// src/handlers/proxy.rs

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;

use crate::services::skill::SkillClient;

pub const PREFIX: &str = "/api-skill";

/// Caminho repassado ao upstream: sem o prefixo, com a query.
fn upstream_path(uri: &Uri) -> String {
    let path = uri.path().strip_prefix(PREFIX).unwrap_or(uri.path());
    let path = if path.is_empty() { "/" } else { path };
    match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}

// ANY /api-skill/{*rest}
pub async fn forward(
    State(skill): State<SkillClient>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match skill.forward(method, &upstream_path(&uri), &headers, body).await {
        Ok(upstream) => {
            let mut response = (upstream.status, upstream.body).into_response();
            if let Some(content_type) = upstream.content_type {
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
            }
            response
        }
        Err(e) => {
            tracing::error!("Erro no proxy da Skill: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "errorMessage": e.to_string() }))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::skill::SkillConfig;
    use axum::{body::Body, http::Request, routing::any, Router};
    use http_body_util::BodyExt;
    use mockito::Matcher;
    use tower::ServiceExt;

    fn app(base_url: String) -> Router {
        let skill = SkillClient::new(
            reqwest::Client::new(),
            SkillConfig {
                base_url,
                username: String::new(),
                password: String::new(),
                company_auth_id: String::new(),
            },
        );
        Router::new().route("/api-skill/{*rest}", any(forward)).with_state(skill)
    }

    #[test]
    fn strips_prefix_and_keeps_query() {
        let uri: Uri = "/api-skill/events/12?full=1".parse().unwrap();
        assert_eq!(upstream_path(&uri), "/events/12?full=1");
        let uri: Uri = "/api-skill".parse().unwrap();
        assert_eq!(upstream_path(&uri), "/");
    }

    #[tokio::test]
    async fn returns_upstream_status_and_body_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/events")
            .match_header("authorization", "Bearer abc")
            .match_header("iddata", "14")
            .match_body(Matcher::Json(json!({ "Events": {} })))
            .with_status(418)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false}"#)
            .create_async()
            .await;

        let request = Request::builder()
            .method("POST")
            .uri("/api-skill/events")
            .header("authorization", "Bearer abc")
            .header("idData", "14")
            .body(Body::from(r#"{"Events":{}}"#))
            .unwrap();

        let response = app(server.url()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"success":false}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn transport_failure_is_a_500_with_error_message() {
        // Porta fechada: a conexão falha antes de qualquer resposta.
        let request = Request::builder()
            .method("GET")
            .uri("/api-skill/events")
            .body(Body::empty())
            .unwrap();

        let response = app("http://127.0.0.1:9".into()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["errorMessage"].is_string());
    }
}
