//! Users API routes
//!
//! This module wires up the users domain to HTTP routes and builds the
//! [`AuthState`] every other router checks tokens against.

use axum::Router;
use axum_helpers::{AuthState, ImageStore, JwtAuth};
use domain_users::{MongoUserRepository, UserService, auth_handlers, handlers, list_schema};
use mongodb::Database;
use std::sync::Arc;

use crate::state::AppState;

/// `/auth` and `/users`, plus the auth state shared with the catalog.
pub fn routes(state: &AppState) -> (Router, AuthState) {
    let jwt = Arc::new(JwtAuth::new(&state.config.jwt));
    let service = Arc::new(UserService::new(
        MongoUserRepository::new(&state.db),
        jwt.clone(),
        super::listing(&state.db, list_schema()),
        ImageStore::new(state.config.uploads.clone()),
    ));

    let auth = AuthState {
        jwt,
        principals: Arc::new(service.principals()),
    };

    let router = Router::new()
        .nest("/auth", auth_handlers::auth_router(service.clone(), &auth))
        .nest("/users", handlers::router(service, &auth));

    (router, auth)
}

pub async fn init_indexes(db: &Database) -> eyre::Result<()> {
    MongoUserRepository::new(db).init_indexes().await?;
    Ok(())
}
