// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_ext::{double_option, null_as_default};
use crate::db::query::Table;
use crate::db::repository::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Sales,
    Employee,
}

// Membro da equipe (tela de configurações). Não guarda senha: o login é do admin único.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for User {
    const TABLE: Table = Table::Users;
    const ORDER: (&'static str, bool) = ("created_at", false);
}

// Responsável embutido em clientes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewUser {
    #[validate(length(min = 1, message = "O nome é obrigatório"))]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    pub role: UserRole,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserPatch {
    #[validate(length(min = 1, message = "O nome é obrigatório"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// --- LOGIN ---

// Dados para login. O campo se chama `email`, mas carrega o usuário do admin.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Informe o usuário"))]
    #[schema(example = "admin")]
    pub email: String,

    #[validate(length(min = 1, message = "Informe a senha"))]
    #[schema(example = "admin123")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminIdentity {
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub user: AdminIdentity,
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // usuário do admin
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}
