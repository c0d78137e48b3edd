use advanced_results::{AdvancedResults, Page, QueryParams};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use axum_helpers::{CurrentUser, ImageStore, JwtAuth, Role, UploadedImage};
use chrono::{Duration, Utc};
use mongodb::bson::{self, oid::ObjectId};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{
    AuthData, CreateUser, LoginRequest, RegisterUser, ResetPassword, SetPassword, UpdatePassword,
    UpdateProfile, UpdateUser, User, UserResponse, UserSummary,
};
use crate::principal::UserPrincipals;
use crate::repository::UserRepository;

/// Lifetime of a password reset token
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Service layer for User business logic
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    jwt: Arc<JwtAuth>,
    listing: AdvancedResults,
    images: ImageStore,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R, jwt: Arc<JwtAuth>, listing: AdvancedResults, images: ImageStore) -> Self {
        Self {
            repository: Arc::new(repository),
            jwt,
            listing,
            images,
        }
    }

    pub fn jwt(&self) -> &JwtAuth {
        &self.jwt
    }

    /// Token subject resolver for the auth middleware
    pub fn principals(&self) -> UserPrincipals<R> {
        UserPrincipals::new(self.repository.clone())
    }

    // Self-service

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterUser) -> UserResult<UserResponse> {
        let role = input.role.unwrap_or_default();
        if role == Role::Admin {
            return Err(UserError::RoleNotAllowed(role));
        }

        let user = User::new(input.name, input.email, hash_password(&input.password)?, role);
        let created = self.repository.create(user).await?;

        tracing::info!(user_id = %created.id, "User registered");
        Ok(created.into())
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<AuthData> {
        let user = self
            .repository
            .get_by_email(&input.email)
            .await?
            .ok_or_else(|| UserError::UnknownEmail(input.email.clone()))?;

        if !verify_password(&input.password, &user.password)? {
            return Err(UserError::IncorrectPassword);
        }

        self.auth_data(&user)
    }

    pub async fn profile(&self, id: ObjectId) -> UserResult<UserResponse> {
        Ok(self.find(id).await?.into())
    }

    #[instrument(skip(self, input))]
    pub async fn update_password(&self, id: ObjectId, input: UpdatePassword) -> UserResult<UserSummary> {
        let mut user = self.find(id).await?;

        if !verify_password(&input.current_password, &user.password)? {
            return Err(UserError::InvalidCurrentPassword);
        }

        user.password = hash_password(&input.new_password)?;
        user.touch();
        let user = self.save(user).await?;
        Ok((&user).into())
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(&self, id: ObjectId, input: UpdateProfile) -> UserResult<UserSummary> {
        let mut user = self.find(id).await?;
        user.name = input.name;
        user.email = input.email;
        user.touch();

        let user = self.save(user).await?;
        Ok((&user).into())
    }

    /// Callers may remove their own account; admins may remove any.
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn delete_profile(&self, caller: &CurrentUser, id: ObjectId) -> UserResult<()> {
        if !caller.can_modify(&id) {
            return Err(UserError::RemoveForbidden(caller.id));
        }
        self.delete_user(id).await
    }

    /// Returns the plain reset token; only its SHA-256 digest is stored.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> UserResult<String> {
        let mut user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or_else(|| UserError::UnknownResetEmail(email.to_string()))?;

        let token = generate_reset_token();
        user.reset_password_token = Some(hash_reset_token(&token));
        user.reset_password_expire = Some(bson::DateTime::from_chrono(
            Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
        ));
        self.save(user).await?;

        Ok(token)
    }

    #[instrument(skip(self, token, input))]
    pub async fn reset_password(&self, token: &str, input: ResetPassword) -> UserResult<AuthData> {
        let mut user = self
            .repository
            .get_by_reset_token(&hash_reset_token(token), Utc::now())
            .await?
            .ok_or(UserError::ResetTokenExpired)?;

        user.password = hash_password(&input.password)?;
        user.clear_reset_token();
        user.touch();
        let user = self.save(user).await?;

        tracing::info!(user_id = %user.id, "Password reset");
        self.auth_data(&user)
    }

    // Administration

    pub async fn list_users(&self, params: &QueryParams) -> UserResult<Page> {
        Ok(self.listing.execute(params).await?)
    }

    pub async fn get_user(&self, id: ObjectId) -> UserResult<UserResponse> {
        self.profile(id).await
    }

    /// The avatar is written only once the request has passed every check.
    #[instrument(skip(self, input, avatar), fields(email = %input.email))]
    pub async fn create_user(
        &self,
        input: CreateUser,
        avatar: Option<UploadedImage>,
    ) -> UserResult<UserResponse> {
        if let Some(image) = &avatar {
            self.images.validate(image)?;
        }
        if self.repository.email_exists(&input.email).await? {
            return Err(UserError::EmailTaken(input.email));
        }

        let mut user = User::new(
            input.name,
            input.email,
            hash_password(&input.password)?,
            input.role.unwrap_or_default(),
        );

        let stored = match &avatar {
            Some(image) => Some(self.images.save(image).await?),
            None => None,
        };
        if let Some(name) = &stored {
            user.avatar = name.clone();
        }

        match self.repository.create(user).await {
            Ok(created) => Ok(created.into()),
            Err(e) => {
                if let Some(name) = stored {
                    self.images.remove(&name).await;
                }
                Err(e)
            }
        }
    }

    /// A new avatar replaces the old file; otherwise the avatar is kept.
    #[instrument(skip(self, input, avatar))]
    pub async fn update_user(
        &self,
        id: ObjectId,
        input: UpdateUser,
        avatar: Option<UploadedImage>,
    ) -> UserResult<UserResponse> {
        let mut user = self.find(id).await?;
        if let Some(image) = &avatar {
            self.images.validate(image)?;
        }

        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(email) = input.email {
            user.email = email;
        }
        if let Some(role) = input.role {
            user.role = role;
        }

        let previous = user.avatar.clone();
        let stored = match &avatar {
            Some(image) => Some(self.images.save(image).await?),
            None => None,
        };
        if let Some(name) = &stored {
            user.avatar = name.clone();
        }
        user.touch();

        match self.save(user).await {
            Ok(updated) => {
                if stored.is_some() {
                    self.images.remove(&previous).await;
                }
                Ok(updated.into())
            }
            Err(e) => {
                if let Some(name) = stored {
                    self.images.remove(&name).await;
                }
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: ObjectId) -> UserResult<()> {
        let removed = self
            .repository
            .delete(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        self.images.remove(&removed.avatar).await;
        tracing::info!(user_id = %id, "User removed");
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn set_password(&self, id: ObjectId, input: SetPassword) -> UserResult<UserResponse> {
        let mut user = self.find(id).await?;
        user.password = hash_password(&input.password)?;
        user.touch();
        Ok(self.save(user).await?.into())
    }

    // Helpers

    async fn find(&self, id: ObjectId) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn save(&self, user: User) -> UserResult<User> {
        let id = user.id;
        self.repository
            .update(user)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    fn auth_data(&self, user: &User) -> UserResult<AuthData> {
        Ok(AuthData {
            token: self.jwt.issue(&user.id.to_hex())?,
            user: user.into(),
        })
    }
}

// Password helpers

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 20 random bytes, hex encoded
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    const_hex::encode(bytes)
}

/// Digest stored in `resetPasswordToken`
pub fn hash_reset_token(token: &str) -> String {
    const_hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::list_schema;
    use crate::repository::{InMemoryUserRepository, MockUserRepository};
    use advanced_results::MemoryDocumentSource;
    use axum_helpers::{JwtConfig, UploadConfig};

    fn png(name: &str) -> UploadedImage {
        UploadedImage {
            field: "avatar".into(),
            file_name: name.into(),
            content_type: "image/png".into(),
            bytes: vec![1u8; 16].into(),
        }
    }

    fn jwt() -> Arc<JwtAuth> {
        Arc::new(JwtAuth::new(
            &JwtConfig::new("this-is-a-valid-secret-with-32-chars!").unwrap(),
        ))
    }

    fn service_with<R: UserRepository>(repo: R, dir: &tempfile::TempDir) -> UserService<R> {
        let listing = AdvancedResults::new(Arc::new(MemoryDocumentSource::new(vec![])), list_schema());
        let images = ImageStore::new(UploadConfig::new(dir.path()));
        UserService::new(repo, jwt(), listing, images)
    }

    fn register_input(email: &str) -> RegisterUser {
        RegisterUser {
            name: "Ann".into(),
            email: email.into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            role: Some(Role::Publisher),
        }
    }

    fn login_input(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 40);
        assert_ne!(token, generate_reset_token());
        assert_eq!(hash_reset_token(&token).len(), 64);
        assert_eq!(
            hash_reset_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(InMemoryUserRepository::new(), &dir);

        let user = service.register(register_input("ann@example.com")).await.unwrap();
        assert_eq!(user.role, Role::Publisher);
        assert_eq!(user.avatar, "nopic.png");

        let auth = service
            .login(login_input("ann@example.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(auth.user.id, user.id);
        assert_eq!(service.jwt.verify(&auth.token).unwrap().sub, user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_admin_role() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(InMemoryUserRepository::new(), &dir);

        let mut input = register_input("ann@example.com");
        input.role = Some(Role::Admin);
        assert!(matches!(
            service.register(input).await,
            Err(UserError::RoleNotAllowed(Role::Admin))
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_email().times(1).returning(|_| Ok(None));

        let err = service_with(repo, &dir)
            .login(login_input("nobody@example.com", "secret1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "There is no user with email: nobody@example.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(InMemoryUserRepository::new(), &dir);
        service.register(register_input("ann@example.com")).await.unwrap();

        let err = service
            .login(login_input("ann@example.com", "wrong-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::IncorrectPassword));
    }

    #[tokio::test]
    async fn test_update_password_checks_current() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(InMemoryUserRepository::new(), &dir);
        let user = service.register(register_input("ann@example.com")).await.unwrap();
        let id = ObjectId::parse_str(&user.id).unwrap();

        let err = service
            .update_password(
                id,
                UpdatePassword {
                    current_password: "nope".into(),
                    new_password: "another1".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidCurrentPassword));

        service
            .update_password(
                id,
                UpdatePassword {
                    current_password: "secret1".into(),
                    new_password: "another1".into(),
                },
            )
            .await
            .unwrap();
        assert!(service.login(login_input("ann@example.com", "another1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_forgot_and_reset_password() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(InMemoryUserRepository::new(), &dir);
        service.register(register_input("ann@example.com")).await.unwrap();

        let token = service.forgot_password("ann@example.com").await.unwrap();
        let auth = service
            .reset_password(&token, ResetPassword { password: "brandnew".into() })
            .await
            .unwrap();
        assert_eq!(auth.user.email, "ann@example.com");
        assert!(service.login(login_input("ann@example.com", "brandnew")).await.is_ok());

        // Single use
        let err = service
            .reset_password(&token, ResetPassword { password: "again12".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::ResetTokenExpired));
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(InMemoryUserRepository::new(), &dir);

        let err = service.forgot_password("x@example.com").await.unwrap_err();
        assert_eq!(err.to_string(), "There is no user with that email: x@example.com");
    }

    #[tokio::test]
    async fn test_delete_profile_requires_owner_or_admin() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(InMemoryUserRepository::new(), &dir);
        let ann = service.register(register_input("ann@example.com")).await.unwrap();
        let ann_id = ObjectId::parse_str(&ann.id).unwrap();

        let stranger = CurrentUser {
            id: ObjectId::new(),
            name: "Bob".into(),
            email: "bob@example.com".into(),
            role: Role::Publisher,
        };
        assert!(matches!(
            service.delete_profile(&stranger, ann_id).await,
            Err(UserError::RemoveForbidden(_))
        ));

        let admin = CurrentUser {
            role: Role::Admin,
            ..stranger
        };
        service.delete_profile(&admin, ann_id).await.unwrap();
        assert!(matches!(
            service.profile(ann_id).await,
            Err(UserError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(InMemoryUserRepository::new(), &dir);
        service.register(register_input("ann@example.com")).await.unwrap();

        let input = CreateUser {
            name: "Ann".into(),
            email: "ann@example.com".into(),
            password: "secret1".into(),
            role: None,
        };
        let err = service
            .create_user(input, Some(png("me.png")))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "This an email: ann@example.com exitst already");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_update_user_replaces_avatar() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(InMemoryUserRepository::new(), &dir);

        let input = CreateUser {
            name: "Ann".into(),
            email: "ann@example.com".into(),
            password: "secret1".into(),
            role: Some(Role::Publisher),
        };
        let created = service.create_user(input, Some(png("old.png"))).await.unwrap();
        assert!(dir.path().join(&created.avatar).exists());

        let id = ObjectId::parse_str(&created.id).unwrap();
        let updated = service
            .update_user(
                id,
                UpdateUser {
                    name: Some("Ann B".into()),
                    ..Default::default()
                },
                Some(png("new.png")),
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ann B");
        assert!(updated.avatar.ends_with("-new.png"));
        assert!(!dir.path().join(&created.avatar).exists());
        assert!(dir.path().join(&updated.avatar).exists());

        service.delete_user(id).await.unwrap();
        assert!(!dir.path().join(&updated.avatar).exists());
    }

    #[tokio::test]
    async fn test_set_password_missing_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));
        repo.expect_update().never();

        let err = service_with(repo, &dir)
            .set_password(ObjectId::new(), SetPassword { password: "secret1".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::NotFound(_)));
    }
}
