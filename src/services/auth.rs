// src/services/auth.rs

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    models::auth::{AdminIdentity, Claims, LoginResponse},
};

const ADMIN_DISPLAY_NAME: &str = "المدير";
const ADMIN_ROLE: &str = "admin";

// Login do administrador único (usuário/senha vindos do ambiente)
#[derive(Clone)]
pub struct AuthService {
    admin_user: String,
    admin_pass: String, // texto puro ou hash bcrypt ($2...)
    jwt_secret: String,
    token_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(admin_user: String, admin_pass: String, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self {
            admin_user,
            admin_pass,
            jwt_secret,
            token_ttl: chrono::Duration::hours(token_ttl_hours),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        if username != self.admin_user {
            return Err(AppError::InvalidCredentials);
        }

        let is_password_valid = if self.admin_pass.starts_with("$2") {
            let password_clone = password.to_owned();
            let hash_clone = self.admin_pass.clone();

            // Executa a verificação em um thread separado
            tokio::task::spawn_blocking(move || verify(&password_clone, &hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??
        } else {
            password == self.admin_pass
        };

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Login do administrador '{}'", self.admin_user);

        Ok(LoginResponse {
            success: true,
            user: self.identity(),
            token: self.create_token()?,
        })
    }

    pub fn identity(&self) -> AdminIdentity {
        AdminIdentity {
            name: ADMIN_DISPLAY_NAME.to_string(),
            email: self.admin_user.clone(),
            role: ADMIN_ROLE.to_string(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        if token_data.claims.sub != self.admin_user {
            return Err(AppError::InvalidToken);
        }
        Ok(token_data.claims)
    }

    fn create_token(&self) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: self.admin_user.clone(),
            role: ADMIN_ROLE.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
