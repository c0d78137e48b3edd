//! The authenticated caller.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::NOT_AUTHORIZED;
use crate::errors::AppError;

/// Account role. Stored and rendered lowercase.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Publisher,
    Admin,
}

/// User loaded by the auth middleware and stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner of the resource, or an admin.
    pub fn can_modify(&self, owner: &ObjectId) -> bool {
        self.is_admin() || &self.id == owner
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Forbidden(NOT_AUTHORIZED.to_string()))
    }
}

/// Resolves a token subject to a live user.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_principal(&self, id: &ObjectId) -> Result<Option<CurrentUser>, AppError>;
}
