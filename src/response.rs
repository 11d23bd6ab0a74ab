//! Render strategies and the standard response envelopes.

use crate::code::Code;
use crate::failure::Failure;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Number of stack frames logged for uncategorized failures.
pub const BACKTRACE_LIMIT: usize = 50;

/// What an error renderer gets. Renderers read only the fields they need.
#[derive(Debug)]
pub struct ErrorContext<'a> {
    /// Localized message for the code.
    pub text: &'a str,
    pub sub_code: Option<u16>,
    pub pure_code: Option<u16>,
    /// `None` when no map classified the failure.
    pub code: Option<Code>,
    pub failure: &'a Failure,
}

/// Produces the response for a classified failure.
pub trait ErrorRenderer: Send + Sync {
    fn render(&self, ctx: &ErrorContext<'_>) -> Response;
}

impl<F> ErrorRenderer for F
where
    F: Fn(&ErrorContext<'_>) -> Response + Send + Sync,
{
    fn render(&self, ctx: &ErrorContext<'_>) -> Response {
        self(ctx)
    }
}

/// What a success renderer gets.
#[derive(Debug)]
pub struct SuccessContext {
    pub payload: Value,
    pub status: StatusCode,
}

/// Produces the response for a successful action.
pub trait SuccessRenderer: Send + Sync {
    fn render(&self, ctx: SuccessContext) -> Response;
}

impl<F> SuccessRenderer for F
where
    F: Fn(SuccessContext) -> Response + Send + Sync,
{
    fn render(&self, ctx: SuccessContext) -> Response {
        self(ctx)
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

impl ErrorBody {
    pub fn from_failure(failure: &Failure, error_code: Option<u16>) -> Self {
        ErrorBody {
            message: failure.message().to_string(),
            kind: failure.category().name().to_string(),
            error_code,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SuccessBody<T> {
    pub data: T,
}

/// Logs the failure and renders `{message, type[, error_code]}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultErrorRenderer;

impl ErrorRenderer for DefaultErrorRenderer {
    fn render(&self, ctx: &ErrorContext<'_>) -> Response {
        let failure = ctx.failure;
        let category = failure.category().name();
        let (status, body) = match ctx.code {
            Some(code @ Code::Range(_, sub)) => {
                tracing::error!("{}: {}", category, failure.message());
                (code.status(), ErrorBody::from_failure(failure, Some(sub)))
            }
            None => {
                let frames = failure.backtrace_frames(BACKTRACE_LIMIT);
                tracing::error!(
                    "{}: {}\n\t{}",
                    category,
                    failure.message(),
                    frames.join("\n\t")
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::from_failure(failure, None),
                )
            }
            Some(code @ Code::Status(_)) => {
                tracing::error!("{}: {}", category, failure.message());
                (code.status(), ErrorBody::from_failure(failure, None))
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Renders `{"data": payload}` with the requested status.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSuccessRenderer;

impl SuccessRenderer for DefaultSuccessRenderer {
    fn render(&self, ctx: SuccessContext) -> Response {
        (ctx.status, Json(SuccessBody { data: ctx.payload })).into_response()
    }
}
