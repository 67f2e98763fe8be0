// src/models/evento.rs

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Evento vindo da API externa (Skill). Campos desconhecidos são preservados.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Evento {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventosQuery {
    /// Data inicial (YYYY-MM-DD)
    pub start_date: String,
    /// Data final (YYYY-MM-DD)
    pub end_date: String,
}

// A API devolve ids ora como número, ora como texto.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("id inválido: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numeric_ids_and_keeps_unknown_fields() {
        let evento: Evento = serde_json::from_value(serde_json::json!({
            "id": 3301,
            "name": "Expo Café",
            "startDate": "2026-10-01",
            "salon": "B"
        }))
        .unwrap();
        assert_eq!(evento.id, "3301");
        assert_eq!(evento.start_date.as_deref(), Some("2026-10-01"));
        assert_eq!(evento.extra["salon"], "B");
    }
}
