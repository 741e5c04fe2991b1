// src/common/i18n.rs

use std::collections::HashMap;

use crate::middleware::i18n::Locale;

pub const SUPPORTED_LANGUAGES: [&str; 3] = ["en", "ar", "pt"];
pub const DEFAULT_LANGUAGE: &str = "en";

const EN: &[(&str, &str)] = &[
    ("validation_error", "One or more fields are invalid."),
    ("not_found", "Resource not found."),
    ("invalid_credentials", "Invalid username or password."),
    ("invalid_token", "Missing or invalid authentication token."),
    ("conflict", "The operation conflicts with the current state."),
    ("constraint_violation", "The data violates a database rule."),
    ("upstream_error", "The database is unavailable. Please try again."),
    ("internal_error", "An unexpected error occurred."),
];

const AR: &[(&str, &str)] = &[
    ("validation_error", "حقل واحد أو أكثر غير صالح."),
    ("not_found", "العنصر غير موجود."),
    ("invalid_credentials", "بيانات الدخول غير صحيحة"),
    ("invalid_token", "رمز الدخول مفقود أو غير صالح."),
    ("conflict", "العملية تتعارض مع الحالة الحالية."),
    ("constraint_violation", "البيانات تخالف قاعدة في قاعدة البيانات."),
    ("upstream_error", "قاعدة البيانات غير متاحة. حاول مرة أخرى."),
    ("internal_error", "حدث خطأ غير متوقع."),
];

const PT: &[(&str, &str)] = &[
    ("validation_error", "Um ou mais campos são inválidos."),
    ("not_found", "Recurso não encontrado."),
    ("invalid_credentials", "Usuário ou senha inválidos."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("conflict", "A operação conflita com o estado atual."),
    ("constraint_violation", "Os dados violam uma regra do banco."),
    ("upstream_error", "O banco de dados está indisponível. Tente novamente."),
    ("internal_error", "Ocorreu um erro inesperado."),
];

// Mensagens de erro por idioma, carregadas uma vez no AppState
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let messages = [("en", EN), ("ar", AR), ("pt", PT)]
            .into_iter()
            .map(|(lang, table)| (lang, table.iter().copied().collect()))
            .collect();
        Self { messages }
    }

    /// Idioma pedido -> inglês -> a própria chave.
    pub fn translate(&self, locale: &Locale, key: &str) -> String {
        [locale.0.as_str(), DEFAULT_LANGUAGE]
            .iter()
            .find_map(|lang| self.messages.get(*lang).and_then(|m| m.get(key)))
            .map(|m| m.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
