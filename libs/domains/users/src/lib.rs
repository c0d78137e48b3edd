//! Users Domain
//!
//! Accounts, authentication and user administration for the catalog.
//!
//! # Features
//!
//! - Registration and login with Argon2 password hashes
//! - Stateless JWTs, also set as the `token` cookie
//! - Password reset with single-use, 10 minute tokens (SHA-256 stored)
//! - Admin CRUD with optional avatar uploads and paginated listing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /auth (public + self) and /users (admin)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Password hashing, tokens, avatar files
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB / in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Documents, DTOs, response payloads
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_users::{MongoUserRepository, UserService, auth_handlers, handlers};
//!
//! let service = Arc::new(UserService::new(repository, jwt, listing, images));
//! let auth = AuthState::new(jwt_auth, Arc::new(service.principals()));
//!
//! let routes = Router::new()
//!     .nest("/auth", auth_handlers::auth_router(service.clone(), &auth))
//!     .nest("/users", handlers::router(service, &auth));
//! ```

pub mod auth_handlers;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod principal;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use auth_handlers::AuthApiDoc;
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateUser, LoginRequest, RegisterUser, UpdateUser, User, UserResponse, list_schema,
};
pub use self::mongodb::MongoUserRepository;
pub use principal::UserPrincipals;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
