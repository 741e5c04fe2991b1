// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::{DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};

// Extrator de idioma (Accept-Language), restrito aos idiomas que temos
#[derive(Debug, Clone, PartialEq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANGUAGE.to_string())
    }
}

impl Locale {
    pub fn from_header(header_str: &str) -> Self {
        // "ar-SA,ar;q=0.9,en;q=0.8" -> ["ar", "en"] na ordem de preferência
        let primary: Vec<String> = accept_language::parse(header_str)
            .iter()
            .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            .collect();

        primary
            .into_iter()
            .find(|lang| SUPPORTED_LANGUAGES.contains(&lang.as_str()))
            .map(Locale)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_supported_language() {
        assert_eq!(Locale::from_header("ar-SA,ar;q=0.9,en;q=0.8").0, "ar");
        assert_eq!(Locale::from_header("fr-FR,pt-BR;q=0.7").0, "pt");
        assert_eq!(Locale::from_header("de").0, "en");
    }
}
