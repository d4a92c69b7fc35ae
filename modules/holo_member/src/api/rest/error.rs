use axum::http::StatusCode;
use modkit::api::problem::{from_parts, ProblemResponse};
use modkit::ProblemCtx;

use crate::domain::error::DomainError;

pub const NOT_FOUND_DETAIL: &str = "No holo_member found with that id.";
pub const INVALID_UPDATE_DETAIL: &str = "Invalid update params.";

/// 404 for an id the repository reported as absent.
pub fn not_found(ctx: &ProblemCtx) -> ProblemResponse {
    ctx.decorate(from_parts(
        StatusCode::NOT_FOUND,
        "HOLO_MEMBER_NOT_FOUND",
        "Not Found",
        NOT_FOUND_DETAIL,
        "",
    ))
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, ctx: &ProblemCtx) -> ProblemResponse {
    let resp = match e {
        DomainError::Validation { .. } => from_parts(
            StatusCode::UNPROCESSABLE_ENTITY,
            "HOLO_MEMBER_VALIDATION",
            "Validation error",
            e.to_string(),
            "",
        ),
        DomainError::EmptyGenerationType => from_parts(
            StatusCode::BAD_REQUEST,
            "HOLO_MEMBER_EMPTY_TYPE",
            "Bad Request",
            "holo_member type cannot be empty.",
            "",
        ),
        DomainError::InvalidUpdate { reason } => {
            // The storage message stays in the log only
            tracing::warn!(%reason, "Invalid update");
            from_parts(
                StatusCode::BAD_REQUEST,
                "HOLO_MEMBER_INVALID_UPDATE",
                "Bad Request",
                INVALID_UPDATE_DETAIL,
                "",
            )
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal Server Error",
                "An internal database error occurred",
                "",
            )
        }
    };
    ctx.decorate(resp)
}
