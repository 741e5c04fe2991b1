// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::db::GatewayError;
use crate::middleware::i18n::Locale;

// Erros da aplicação. Viram resposta HTTP via `to_api_error`, já traduzidos.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Erro no banco remoto: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

// Corpo de erro que vai para o cliente: `{ "error": "...", "details": ... }`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let (status, key, details) = match self {
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
                (StatusCode::BAD_REQUEST, "validation_error", Some(Value::Object(details)))
            }
            AppError::GatewayError(GatewayError::NotFound(table)) => {
                (StatusCode::NOT_FOUND, "not_found", Some(json!(table.name())))
            }
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials", None),
            AppError::InvalidToken | AppError::JwtError(_) => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::Conflict(reason) => (StatusCode::CONFLICT, "conflict", Some(json!(reason))),
            AppError::GatewayError(GatewayError::Constraint { message, .. }) => {
                (StatusCode::CONFLICT, "constraint_violation", Some(json!(message)))
            }
            AppError::GatewayError(e) => {
                tracing::error!("🔥 Falha no banco remoto: {}", e);
                (StatusCode::BAD_GATEWAY, "upstream_error", None)
            }
            e @ (AppError::BcryptError(_) | AppError::InternalServerError(_)) => {
                tracing::error!("🔥 Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        ApiError {
            status,
            message: i18n.translate(locale, key),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Table;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "O nome é obrigatório"))]
        name: String,
    }

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let errors = Payload { name: String::new() }.validate().unwrap_err();
        let api = AppError::from(errors).to_api_error(&en(), &I18nStore::new());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details.unwrap()["name"][0], "O nome é obrigatório");
    }

    #[test]
    fn gateway_errors_map_to_http_statuses() {
        let i18n = I18nStore::new();

        let not_found = AppError::from(GatewayError::NotFound(Table::Customers)).to_api_error(&en(), &i18n);
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let constraint = AppError::from(GatewayError::Constraint {
            code: "23503".into(),
            message: "fk".into(),
        })
        .to_api_error(&en(), &i18n);
        assert_eq!(constraint.status, StatusCode::CONFLICT);

        let down = AppError::from(GatewayError::Status {
            status: 503,
            code: None,
            message: "down".into(),
        })
        .to_api_error(&en(), &i18n);
        assert_eq!(down.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn messages_follow_the_locale() {
        let i18n = I18nStore::new();
        let en = AppError::InvalidCredentials.to_api_error(&en(), &i18n);
        let ar = AppError::InvalidCredentials.to_api_error(&Locale("ar".into()), &i18n);

        assert_eq!(en.status, StatusCode::UNAUTHORIZED);
        assert_ne!(en.message, ar.message);
    }
}
