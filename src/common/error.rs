use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{
    middleware::i18n::Locale,
    models::{plan::PlanStatus, rbac::Module, recinto::Recinto},
};

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Identidade corporativa inválida: {0}")]
    InvalidIdentity(String),

    #[error("Domínio {domain} não autorizado no recinto {recinto}")]
    DomainNotAllowed { domain: String, recinto: Recinto },

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    NotFound(&'static str),

    #[error("Acesso negado")]
    Forbidden,

    #[error("Sem acesso ao módulo {0}")]
    ModuleNotAllowed(Module),

    #[error("Plano bloqueado para edição")]
    EditLocked,

    #[error("Departamento já selecionado")]
    DepartmentAlreadySelected,

    #[error("Transição inválida: {action} a partir de {from}")]
    InvalidTransition { from: PlanStatus, action: &'static str },

    #[error("Motivo de rejeição obrigatório")]
    RejectReasonRequired,

    #[error("Plano já enviado para aprovação")]
    AlreadySubmitted,

    #[error("O plano foi alterado por outro usuário")]
    Conflict,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Erro no serviço externo: {0}")]
    UpstreamError(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro do cliente HTTP: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Erro ao gerar planilha: {0}")]
    ExportError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

/// Corpo de erro devolvido ao cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::RejectReasonRequired => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidToken | AppError::InvalidIdentity(_) => StatusCode::UNAUTHORIZED,
            AppError::DomainNotAllowed { .. }
            | AppError::Forbidden
            | AppError::ModuleNotAllowed(_)
            | AppError::EditLocked
            | AppError::DepartmentAlreadySelected => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. }
            | AppError::AlreadySubmitted
            | AppError::Conflict
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::UpstreamError(_) | AppError::HttpClientError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte para a resposta HTTP no idioma do cliente (es por padrão).
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let en = locale.0 == "en";
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::BAD_GATEWAY {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let message = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                let error = if en {
                    "One or more fields are invalid."
                } else {
                    "Uno o más campos son inválidos."
                };
                return ApiError {
                    status,
                    error: error.to_string(),
                    details: Some(serde_json::Value::Object(details)),
                };
            }
            AppError::InvalidToken => {
                pick(en, "Invalid or missing session token.", "Token de sesión inválido o ausente.")
            }
            AppError::InvalidIdentity(_) => pick(
                en,
                "Could not verify your corporate account.",
                "No se pudo verificar tu cuenta corporativa.",
            ),
            AppError::DomainNotAllowed { domain, recinto } => {
                if en {
                    format!("Your e-mail domain ({domain}) is not allowed to access {recinto}.")
                } else {
                    format!("Tu dominio de correo ({domain}) no tiene permisos para acceder al recinto {recinto}.")
                }
            }
            AppError::UserNotFound => pick(en, "User not found.", "Usuario no encontrado."),
            AppError::NotFound(what) => {
                if en {
                    format!("Resource not found: {what}.")
                } else {
                    format!("No se encontró el recurso: {what}.")
                }
            }
            AppError::Forbidden => pick(
                en,
                "You are not allowed to perform this action.",
                "No tienes permisos para realizar esta acción.",
            ),
            AppError::ModuleNotAllowed(module) => {
                if en {
                    format!("You do not have access to the '{module}' module.")
                } else {
                    format!("No tienes acceso al módulo '{module}'.")
                }
            }
            AppError::EditLocked => pick(
                en,
                "This action plan can no longer be edited (deadline reached or already closed).",
                "Este plan de acción ya no puede editarse (tiempo límite vencido o plan cerrado).",
            ),
            AppError::DepartmentAlreadySelected => {
                pick(en, "Your department is already set.", "Tu departamento ya fue seleccionado.")
            }
            AppError::InvalidTransition { from, action } => {
                if en {
                    format!("Cannot {action} a plan in status '{from}'.")
                } else {
                    format!("No se puede aplicar '{action}' a un plan en estado '{from}'.")
                }
            }
            AppError::RejectReasonRequired => {
                pick(en, "A rejection reason is required.", "Debe indicar el motivo del rechazo.")
            }
            AppError::AlreadySubmitted => pick(
                en,
                "The plan was already submitted for approval.",
                "El plan ya fue enviado a aprobación.",
            ),
            AppError::Conflict => pick(
                en,
                "The plan was modified by someone else. Reload and try again.",
                "El plan fue modificado por otra persona. Recargue e intente de nuevo.",
            ),
            AppError::UniqueConstraintViolation(msg) => msg.clone(),
            AppError::UpstreamError(_) | AppError::HttpClientError(_) => {
                pick(en, "External service unavailable.", "El servicio externo no está disponible.")
            }
            _ => pick(en, "An unexpected error occurred.", "Ocurrió un error inesperado."),
        };

        ApiError { status, error: message, details: None }
    }
}

fn pick(en: bool, english: &str, spanish: &str) -> String {
    if en { english.to_string() } else { spanish.to_string() }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error(&Locale::default())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

/// Converte violação de unicidade do Postgres em erro amigável.
pub fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(message.to_string());
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_map_to_client_statuses() {
        assert_eq!(AppError::EditLocked.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::RejectReasonRequired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidTransition { from: PlanStatus::Aprobado, action: "reject" }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::UpstreamError("x".into()).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn messages_follow_the_request_language() {
        let err = AppError::DomainNotAllowed { domain: "gmail.com".into(), recinto: Recinto::Cccr };
        let es = err.to_api_error(&Locale("es".into()));
        let en = err.to_api_error(&Locale("en".into()));
        assert_eq!(es.status, StatusCode::FORBIDDEN);
        assert!(es.error.contains("no tiene permisos"));
        assert!(en.error.contains("not allowed"));
    }

    #[test]
    fn wrapped_arms_keep_both_translations() {
        let es = Locale("es".into());
        let en = Locale("en".into());

        let cases = [
            (
                AppError::InvalidToken,
                "Token de sesión inválido o ausente.",
                "Invalid or missing session token.",
            ),
            (
                AppError::Forbidden,
                "No tienes permisos para realizar esta acción.",
                "You are not allowed to perform this action.",
            ),
            (
                AppError::Conflict,
                "El plan fue modificado por otra persona. Recargue e intente de nuevo.",
                "The plan was modified by someone else. Reload and try again.",
            ),
            (
                AppError::UpstreamError("x".into()),
                "El servicio externo no está disponible.",
                "External service unavailable.",
            ),
        ];
        for (err, spanish, english) in cases {
            assert_eq!(err.to_api_error(&es).error, spanish);
            assert_eq!(err.to_api_error(&en).error, english);
        }

        let missing = AppError::NotFound("plan".into());
        assert_eq!(missing.to_api_error(&es).error, "No se encontró el recurso: plan.");
        assert_eq!(missing.to_api_error(&en).error, "Resource not found: plan.");
    }
}
