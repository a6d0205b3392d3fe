//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::services::auth_service::{AuthError, AuthGrant, AuthService, UserInfo};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, AuthError> {
        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = self
            .store
            .create_user(name, email, password, &self.security)
            .await?;

        info!(user_id = user.id, "User registered");

        let token = user.api_key.clone();
        Ok(AuthGrant {
            user: UserInfo::from(user),
            token,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant, AuthError> {
        let user = self
            .store
            .verify_user_password(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = user.api_key.clone();
        Ok(AuthGrant {
            user: UserInfo::from(user),
            token,
        })
    }

    async fn verify_token(&self, token: &str) -> Result<Option<UserInfo>, AuthError> {
        let user = self.store.verify_api_key(token).await?;
        Ok(user.map(UserInfo::from))
    }
}
