//! Extractors whose rejections are rendered as RFC 9457 problems.
//!
//! Axum's own `Json` and `Path` rejections answer in plain text with a mix of
//! 400/415/422 codes. Handlers in this workspace want one contract instead:
//! anything wrong with the shape of a request is a 422 problem document that
//! carries the request id and the request path.

use std::num::IntErrorKind;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;

use crate::api::problem::{Problem, ProblemResponse, ValidationError};
use crate::http::XRequestId;

/// Error code for requests rejected before reaching a handler.
pub const REQUEST_VALIDATION: &str = "REQUEST_VALIDATION";

/// Trace id from the usual propagation headers, if the caller sent one.
pub fn extract_trace_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-trace-id")
        .or_else(|| headers.get("traceparent"))
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Request coordinates used to decorate problems produced by handlers.
#[derive(Debug, Clone, Default)]
pub struct ProblemCtx {
    pub instance: String,
    pub request_id: Option<String>,
    pub trace_id: Option<String>,
}

impl ProblemCtx {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            instance: parts.uri.path().to_owned(),
            request_id: parts.extensions.get::<XRequestId>().map(|r| r.0.clone()),
            trace_id: extract_trace_id(&parts.headers),
        }
    }

    /// Fill instance and ids that the producer left empty.
    pub fn decorate(&self, mut resp: ProblemResponse) -> ProblemResponse {
        let p = &mut resp.0;
        if p.instance.is_empty() {
            p.instance = self.instance.clone();
        }
        if p.request_id.is_none() {
            p.request_id = self.request_id.clone();
        }
        if p.trace_id.is_none() {
            p.trace_id = self.trace_id.clone();
        }
        resp
    }

    pub fn validation(&self, detail: impl Into<String>, errors: Vec<ValidationError>) -> ProblemResponse {
        let mut p = Problem::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed", detail)
            .with_code(REQUEST_VALIDATION);
        if !errors.is_empty() {
            p = p.with_errors(errors);
        }
        self.decorate(p.into())
    }
}

impl<S> FromRequestParts<S> for ProblemCtx
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// JSON body extractor rejecting with a 422 problem.
///
/// Oversized bodies keep the status chosen by the body limit layer (413).
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let ctx = ProblemCtx::from_parts(&parts);
        let req = Request::from_parts(parts, body);

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected JSON body");
                Err(json_rejection_problem(&ctx, rejection))
            }
        }
    }
}

fn json_rejection_problem(ctx: &ProblemCtx, rejection: JsonRejection) -> ProblemResponse {
    match rejection {
        JsonRejection::BytesRejection(r) => ctx.decorate(
            Problem::new(r.status(), "Invalid Request Body", r.body_text())
                .with_code(REQUEST_VALIDATION)
                .into(),
        ),
        JsonRejection::MissingJsonContentType(_) => ctx.validation(
            "Expected request with `Content-Type: application/json`",
            vec![ValidationError::new("", "body must be a JSON document")],
        ),
        other => ctx.validation(other.body_text(), vec![]),
    }
}

/// `{id}` path segment that must be a positive integer.
///
/// Digits beyond `i64::MAX` saturate: the id is well formed, it just cannot
/// match a row. Narrowing to the column type is left to the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveId(pub i64);

impl PositiveId {
    /// The id as a 32-bit key, `None` when no 32-bit row can carry it.
    pub fn as_i32(self) -> Option<i32> {
        i32::try_from(self.0).ok()
    }
}

impl<S> FromRequestParts<S> for PositiveId
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = ProblemCtx::from_parts(parts);
        let raw = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e: PathRejection| ctx.validation(e.body_text(), vec![]))?;

        match raw.0.parse::<i64>() {
            Ok(id) if id >= 1 => Ok(PositiveId(id)),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(PositiveId(i64::MAX)),
            _ if is_signed_integer(&raw.0) => Err(ctx.validation(
                "id must be greater than or equal to 1",
                vec![ValidationError::new("/id", "must be >= 1")],
            )),
            _ => Err(ctx.validation(
                format!("id '{}' is not a valid integer", raw.0),
                vec![ValidationError::new("/id", "must be an integer")],
            )),
        }
    }
}

fn is_signed_integer(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
