use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, Role};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, username: &str, email: &str, role: Role, password_hash: String) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    /// Usernames keyed by user id; ids without a user are left out.
    async fn usernames(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: RwLock<HashMap<Uuid, (AuthUser, String)>>, // key: user id, value: (user, password hash)
    }

    impl MockAuthRepository {
        /// Seed a user without going through registration (no password).
        pub async fn seed(&self, username: &str, role: Role) -> AuthUser {
            let user = AuthUser {
                id: Uuid::new_v4(),
                username: username.to_string(),
                email: format!("{}@example.com", username.to_lowercase()),
                role,
            };
            self.users.write().await.insert(user.id, (user.clone(), String::new()));
            user
        }

        pub async fn remove(&self, id: Uuid) -> bool {
            self.users.write().await.remove(&id).is_some()
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let email = email.trim().to_lowercase();
            let users = self.users.read().await;
            Ok(users.values().find(|(u, _)| u.email == email).map(|(u, _)| u.clone()))
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.users.read().await.get(&id).map(|(u, _)| u.clone()))
        }

        async fn create_user(&self, username: &str, email: &str, role: Role, password_hash: String) -> Result<AuthUser, AuthError> {
            let email = email.trim().to_lowercase();
            let mut users = self.users.write().await;
            if users.values().any(|(u, _)| u.email == email) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), username: username.trim().to_string(), email, role };
            users.insert(user.id, (user.clone(), password_hash));
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let users = self.users.read().await;
            Ok(users
                .get(&user_id)
                .filter(|(_, hash)| !hash.is_empty())
                .map(|(_, hash)| Credentials { user_id, password_hash: hash.clone() }))
        }

        async fn usernames(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, AuthError> {
            let users = self.users.read().await;
            Ok(ids
                .iter()
                .filter_map(|id| users.get(id).map(|(u, _)| (*id, u.username.clone())))
                .collect())
        }
    }
}
