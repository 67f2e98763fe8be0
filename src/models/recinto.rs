// src/models/recinto.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Recinto (centro de convenções). Cada um tem o seu próprio espaço de dados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Recinto {
    #[serde(rename = "CCCR")]
    Cccr,
    #[serde(rename = "CCCI")]
    Ccci,
    #[serde(rename = "CEVP")]
    Cevp,
}

#[derive(Debug, thiserror::Error)]
#[error("Recinto desconhecido: {0}")]
pub struct UnknownRecinto(pub String);

impl Recinto {
    pub const ALL: [Recinto; 3] = [Recinto::Cccr, Recinto::Ccci, Recinto::Cevp];

    pub fn code(self) -> &'static str {
        match self {
            Recinto::Cccr => "CCCR",
            Recinto::Ccci => "CCCI",
            Recinto::Cevp => "CEVP",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Recinto::Cccr => "CCCR (Costa Rica)",
            Recinto::Ccci => "CCCI (Cartagena)",
            Recinto::Cevp => "CEVP (Cali)",
        }
    }

    /// Domínios de e-mail autorizados a entrar neste recinto.
    pub fn allowed_domains(self) -> &'static [&'static str] {
        match self {
            Recinto::Cccr => &["@grupoheroica.com", "@costaricacc.com"],
            Recinto::Ccci => &["@grupoheroica.com", "@cccartagena.com"],
            Recinto::Cevp => &["@grupoheroica.com", "@valledelpacifico.co"],
        }
    }

    /// Identificador do recinto na API de eventos (cabeçalho `idData`).
    pub fn id_data(self) -> u32 {
        match self {
            Recinto::Cccr => 14,
            Recinto::Ccci => 15,
            Recinto::Cevp => 16,
        }
    }

    pub fn domain_allowed(self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        !email.is_empty()
            && self
                .allowed_domains()
                .iter()
                .any(|domain| email.ends_with(&domain.to_lowercase()))
    }
}

impl fmt::Display for Recinto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Recinto {
    type Err = UnknownRecinto;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CCCR" => Ok(Recinto::Cccr),
            "CCCI" => Ok(Recinto::Ccci),
            "CEVP" => Ok(Recinto::Cevp),
            other => Err(UnknownRecinto(other.to_string())),
        }
    }
}

impl TryFrom<String> for Recinto {
    type Error = UnknownRecinto;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
