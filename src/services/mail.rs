// src/services/mail.rs

use async_trait::async_trait;

use crate::common::error::AppError;

pub mod graph;
pub mod templates;

pub use graph::{GraphConfig, GraphMailer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Envio de e-mails transacionais.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use tokio::sync::Mutex;

    /// Guarda as mensagens em memória; pode ser configurado para falhar.
    #[derive(Default)]
    pub struct FakeMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::UpstreamError("smtp down".into()));
            }
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }
}
