//! Custom extractors for Axum handlers.
//!
//! These extractors reject with [`AppError`](crate::errors::AppError), so
//! every failure renders the standard error body.

pub mod form_values;
pub mod image_form;
pub mod object_id_path;
pub mod validated_json;

pub use image_form::ImageForm;
pub use object_id_path::ObjectIdPath;
pub use validated_json::ValidatedJson;
