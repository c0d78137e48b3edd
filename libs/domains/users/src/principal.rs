use async_trait::async_trait;
use axum_helpers::{AppError, CurrentUser, PrincipalStore};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use crate::repository::UserRepository;

/// Resolves token subjects to the current state of the user record, so a
/// deleted account or a changed role takes effect on the next request.
pub struct UserPrincipals<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserPrincipals<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: UserRepository> PrincipalStore for UserPrincipals<R> {
    async fn find_principal(&self, id: &ObjectId) -> Result<Option<CurrentUser>, AppError> {
        let user = self.repository.get_by_id(*id).await.map_err(AppError::from)?;

        Ok(user.map(|user| CurrentUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }))
    }
}
