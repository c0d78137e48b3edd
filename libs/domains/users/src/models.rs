use advanced_results::{CollectionSchema, FieldKind};
use axum_helpers::Role;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Avatar assigned when none is uploaded
pub const DEFAULT_AVATAR: &str = "nopic.png";

/// Collection holding [`User`] documents
pub const USERS_COLLECTION: &str = "users";

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

/// User document as stored in MongoDB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never rendered
    pub password: String,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default)]
    pub role: Role,
    /// SHA-256 hex of the outstanding reset token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_expire: Option<bson::DateTime>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            name,
            email,
            password: password_hash,
            avatar: default_avatar(),
            role,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn clear_reset_token(&mut self) {
        self.reset_password_token = None;
        self.reset_password_expire = None;
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name,
            email: user.email,
            avatar: user.avatar,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Identity fields returned alongside tokens
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

// Request bodies. String fields default to empty so a missing field reports
// its validation message instead of a parse error.

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid type of email")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, max = 16, message = "Password must be between 6-16 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(
        other = "password",
        message = "Password confirmation does not match password"
    ))]
    pub confirm_password: String,
    /// `user` or `publisher`
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid type of email")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, max = 16, message = "Password must be between 6-16 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePassword {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide a current password"))]
    pub current_password: String,
    #[serde(default)]
    #[validate(length(
        min = 6,
        max = 16,
        message = "New password must be at least between 6 to 16 characters"
    ))]
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide a name field"))]
    pub name: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Please provide an email field"),
        email(message = "Invalid type of email field")
    )]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ForgotPassword {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Please provide an email"),
        email(message = "Invalid type of email")
    )]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ResetPassword {
    #[serde(default)]
    #[validate(length(min = 6, max = 16, message = "Password must be at least 6 to 16 characters"))]
    pub password: String,
}

/// Admin create, JSON or multipart with an `avatar` file
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid type of email")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, max = 16, message = "Password must be between 6-16 characters"))]
    pub password: String,
    pub role: Option<Role>,
}

/// Admin profile update; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid type of email"))]
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct SetPassword {
    #[serde(default)]
    #[validate(length(min = 6, max = 16, message = "Password must long between 6-16 characters"))]
    pub password: String,
}

// Response payloads

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserData {
    pub user: UserResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SummaryData {
    pub user: UserSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthData {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetTokenData {
    pub reset_token: String,
}

/// Filterable fields of the user listing; credentials never leave storage.
pub fn list_schema() -> CollectionSchema {
    CollectionSchema::new(USERS_COLLECTION)
        .field("_id", FieldKind::ObjectId)
        .field("name", FieldKind::Text)
        .field("email", FieldKind::Text)
        .field("role", FieldKind::Text)
        .field("avatar", FieldKind::Text)
        .field("createdAt", FieldKind::DateTime)
        .field("updatedAt", FieldKind::DateTime)
        .hidden("password")
        .hidden("resetPasswordToken")
        .hidden("resetPasswordExpire")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(password: &str, confirm: &str) -> RegisterUser {
        RegisterUser {
            name: "Ann".into(),
            email: "ann@example.com".into(),
            password: password.into(),
            confirm_password: confirm.into(),
            role: None,
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(register("secret1", "secret1").validate().is_ok());

        let errors = register("secret1", "secret2").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));

        let errors = register("123", "123").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_missing_fields_report_messages() {
        let login: LoginRequest = serde_json::from_str("{}").unwrap();
        let errors = login.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_user_document_round_trip() {
        let mut user = User::new(
            "Ann".into(),
            "ann@example.com".into(),
            "$argon2id$hash".into(),
            Role::Publisher,
        );
        user.reset_password_token = Some("abc".into());

        let document = bson::to_document(&user).unwrap();
        assert_eq!(document.get_str("role").unwrap(), "publisher");
        assert!(document.get_datetime("createdAt").is_ok());

        let back: User = bson::from_document(document).unwrap();
        assert_eq!(back.reset_password_token.as_deref(), Some("abc"));
        assert_eq!(back.created_at.timestamp_millis(), user.created_at.timestamp_millis());
    }

    #[test]
    fn test_response_hides_credentials() {
        let user = User::new("Ann".into(), "a@b.co".into(), "hash".into(), Role::User);
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["avatar"], "nopic.png");
        assert_eq!(json["role"], "user");
        assert!(json["_id"].is_string());
    }

    #[test]
    fn test_list_schema_hides_password() {
        let schema = list_schema();
        assert!(schema.is_hidden("password"));
        assert_eq!(schema.kind_of("createdAt"), FieldKind::DateTime);
    }

    #[tokio::test]
    async fn test_listing_ignores_credentials_in_filter_and_sort() {
        use advanced_results::{AdvancedResults, MemoryDocumentSource, QueryParams};
        use std::sync::Arc;

        let documents = [("a", "$argon2id$AAAA"), ("b", "$argon2id$ZZZZ")]
            .into_iter()
            .map(|(name, hash)| {
                let user = User::new(name.into(), format!("{name}@example.com"), hash.into(), Role::User);
                bson::to_document(&user).unwrap()
            })
            .collect();
        let listing =
            AdvancedResults::new(Arc::new(MemoryDocumentSource::new(documents)), list_schema());

        let page = listing
            .execute(&QueryParams::from_pairs([("password[gte]", "$argon2id$M")]))
            .await
            .unwrap();
        assert_eq!(page.count, 2);

        let page = listing
            .execute(&QueryParams::from_pairs([("resetPasswordToken", "abc"), ("sort", "-password,name")]))
            .await
            .unwrap();
        let names: Vec<_> = page.data.iter().map(|user| user["name"].clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(page.data.iter().all(|user| user.get("password").is_none()));
    }
}
