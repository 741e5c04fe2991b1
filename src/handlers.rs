pub mod auth;
pub mod catalog;
pub mod crm;
pub mod dashboard;
pub mod followups;
pub mod meetings;
pub mod quotations;
pub mod users;

use serde::Serialize;

use crate::db::Written;

// Registro gravado + aviso quando o histórico não pôde ser salvo
#[derive(Debug, Serialize)]
pub struct WithWarning<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T> From<Written<T>> for WithWarning<T> {
    fn from(written: Written<T>) -> Self {
        let warning = written.warning();
        Self {
            record: written.record,
            warning,
        }
    }
}
