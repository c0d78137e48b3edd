//! Request body extractor for resources that carry an optional picture.

use crate::errors::AppError;
use crate::uploads::UploadedImage;
use axum::{
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::{StatusCode, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

use super::ValidatedJson;

/// Validated form data plus the first uploaded file, if any.
///
/// `multipart/form-data` requests have their text parts collected into a
/// JSON object of strings before deserializing into `T`; blank text parts
/// are dropped so optional fields stay `None`. Any other content type is
/// read as JSON with no image.
///
/// The image is only captured here. Type and size checks happen when it is
/// saved through [`ImageStore`](crate::uploads::ImageStore).
#[derive(Debug)]
pub struct ImageForm<T> {
    pub data: T,
    pub image: Option<UploadedImage>,
}

impl<T, S> FromRequest<S> for ImageForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let ValidatedJson(data) = ValidatedJson::<T>::from_request(req, state).await?;
            return Ok(Self { data, image: None });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut fields = Map::new();
        let mut image = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;

                if image.is_none() && !file_name.is_empty() && !bytes.is_empty() {
                    image = Some(UploadedImage {
                        field: name,
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                continue;
            }

            let text = field.text().await.map_err(multipart_error)?;
            if !text.trim().is_empty() {
                fields.insert(name, Value::String(text));
            }
        }

        let data: T = serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        data.validate()?;

        Ok(Self { data, image })
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::InvalidUpload("File size over 1.5Mb".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}
