//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Malformed bodies reject with the JSON extraction error; failed
/// validation rejects with 400 and the joined field messages.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::ValidatedJson;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct Login {
///     #[validate(email(message = "Invalid type of email"))]
///     email: String,
/// }
///
/// async fn login(ValidatedJson(payload): ValidatedJson<Login>) -> String {
///     payload.email
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, routing::post};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Login {
        #[validate(email(message = "Invalid type of email"))]
        email: String,
    }

    async fn send(body: &str) -> (u16, serde_json::Value) {
        let app = Router::new().route(
            "/login",
            post(|ValidatedJson(login): ValidatedJson<Login>| async move { login.email }),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status().as_u16();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let (status, _) = send(r#"{"email":"ann@example.com"}"#).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_invalid_body_is_rejected() {
        let (status, json) = send(r#"{"email":"ann"}"#).await;
        assert_eq!(status, 400);
        assert_eq!(json["success"], false);
        assert_eq!(json["data"]["message"], "Invalid type of email");
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let (status, json) = send("{").await;
        assert_eq!(status, 400);
        assert_eq!(json["error"], "JSON_EXTRACTION");
    }
}
