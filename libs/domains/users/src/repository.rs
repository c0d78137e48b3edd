use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; the email must be unique
    async fn create(&self, user: User) -> UserResult<User>;

    async fn get_by_id(&self, id: ObjectId) -> UserResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// User holding `token_hash` whose reset window is still open at `now`
    async fn get_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> UserResult<Option<User>>;

    /// Replace the stored document; `None` when the user is gone
    async fn update(&self, user: User) -> UserResult<Option<User>>;

    /// Delete and return the removed user
    async fn delete(&self, id: ObjectId) -> UserResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> UserResult<bool>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<ObjectId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateKey(user.email));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: ObjectId) -> UserResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                u.reset_password_token.as_deref() == Some(token_hash)
                    && u.reset_password_expire
                        .is_some_and(|expire| expire.to_chrono() > now)
            })
            .cloned())
    }

    async fn update(&self, user: User) -> UserResult<Option<User>> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Ok(None);
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(UserError::DuplicateKey(user.email));
        }

        users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn delete(&self, id: ObjectId) -> UserResult<Option<User>> {
        Ok(self.users.write().await.remove(&id))
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.email == email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_helpers::Role;
    use chrono::Duration;
    use mongodb::bson;

    fn user(email: &str) -> User {
        User::new("Ann".into(), email.into(), "hash".into(), Role::User)
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(user("ann@example.com")).await.unwrap();

        let err = repo.create(user("ann@example.com")).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateKey(_)));
        assert!(repo.email_exists("ann@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_token_lookup_respects_expiry() {
        let repo = InMemoryUserRepository::new();
        let mut ann = user("ann@example.com");
        ann.reset_password_token = Some("digest".into());
        ann.reset_password_expire = Some(bson::DateTime::from_chrono(Utc::now() + Duration::minutes(10)));
        repo.create(ann.clone()).await.unwrap();

        let found = repo.get_by_reset_token("digest", Utc::now()).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(ann.id));

        let later = Utc::now() + Duration::minutes(11);
        assert!(repo.get_by_reset_token("digest", later).await.unwrap().is_none());
        assert!(repo.get_by_reset_token("other", Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_user() {
        let repo = InMemoryUserRepository::new();
        let ghost = user("ghost@example.com");

        assert!(repo.update(ghost.clone()).await.unwrap().is_none());
        assert!(repo.delete(ghost.id).await.unwrap().is_none());
    }
}
