//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1005,
        "error": "INTERNAL_ERROR",
        "data": { "message": "Server Error" }
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1001,
        "error": "VALIDATION_ERROR",
        "data": { "message": "Please add a valid email" },
        "details": {
            "email": [{ "code": "email", "message": "Please add a valid email" }]
        }
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Duplicate value",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 2001,
        "error": "DUPLICATE_KEY",
        "data": { "message": "Duplicate entered field value" }
    })
)]
pub struct DuplicateKeyResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Rejected upload",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1012,
        "error": "INVALID_UPLOAD",
        "data": { "message": "File size over 1.5Mb" }
    })
)]
pub struct InvalidUploadResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1004,
        "error": "NOT_FOUND",
        "data": { "message": "Resource not found" }
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Forbidden - Missing token or insufficient role",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1007,
        "error": "FORBIDDEN",
        "data": { "message": "Not authorized to access this route" }
    })
)]
pub struct ForbiddenResponse(pub ErrorResponse);
