//! Shared fixtures for handler tests.

use async_trait::async_trait;
use axum::{http::StatusCode, response::Response};
use axum_helpers::{AppError, AuthState, CurrentUser, JwtAuth, JwtConfig, PrincipalStore, Role};
use http_body_util::BodyExt;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

struct FixedPrincipals(HashMap<ObjectId, CurrentUser>);

#[async_trait]
impl PrincipalStore for FixedPrincipals {
    async fn find_principal(&self, id: &ObjectId) -> Result<Option<CurrentUser>, AppError> {
        Ok(self.0.get(id).cloned())
    }
}

/// One known user per role, plus a second publisher.
pub struct TestAuth {
    pub state: AuthState,
    pub users: HashMap<Role, CurrentUser>,
    pub other_publisher: CurrentUser,
}

impl TestAuth {
    pub fn new() -> Self {
        let person = |name: &str, role| CurrentUser {
            id: ObjectId::new(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
        };
        let users = HashMap::from([
            (Role::User, person("Ann", Role::User)),
            (Role::Publisher, person("Pat", Role::Publisher)),
            (Role::Admin, person("Root", Role::Admin)),
        ]);
        let other_publisher = person("Quinn", Role::Publisher);

        let mut known: HashMap<ObjectId, CurrentUser> =
            users.values().map(|u| (u.id, u.clone())).collect();
        known.insert(other_publisher.id, other_publisher.clone());

        let jwt = JwtAuth::new(&JwtConfig::new("this-is-a-valid-secret-with-32-chars!").unwrap());
        Self {
            state: AuthState::new(jwt, Arc::new(FixedPrincipals(known))),
            users,
            other_publisher,
        }
    }

    pub fn user(&self, role: Role) -> CurrentUser {
        self.users[&role].clone()
    }

    pub fn bearer(&self, role: Role) -> String {
        self.bearer_for(&self.users[&role])
    }

    pub fn bearer_for(&self, user: &CurrentUser) -> String {
        format!("Bearer {}", self.state.jwt.issue(&user.id.to_hex()).unwrap())
    }
}

pub async fn read(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
