//! Resource routes built from a controller's composed actions.

use crate::action::Action;
use crate::controller::ResourceController;
use crate::handlers::resource::{create, destroy, list, show, update, SharedController};
use crate::failure::Failure;
use crate::repository::Repository;
use crate::scheme::Scheme;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Request body limit applied by [`resource_routes`].
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone)]
struct BodyLimit {
    scheme: Arc<Scheme>,
    limit: usize,
}

/// Declared lengths over the limit are dispatched before the body is read.
/// Undeclared ones are cut off by the limit layer and surface as a body rejection.
async fn reject_oversized(State(guard): State<BodyLimit>, req: Request, next: Next) -> Response {
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok()?.parse::<usize>().ok());
    match declared {
        Some(len) if len > guard.limit => guard.scheme.dispatch(&Failure::payload_too_large(format!(
            "request body of {} bytes exceeds the limit of {} bytes",
            len, guard.limit
        ))),
        _ => next.run(req).await,
    }
}

/// `GET /` list, `POST /` create, `GET /:id` show, `PATCH|PUT /:id` update,
/// `DELETE /:id` destroy. Only composed actions are mounted. Nest the result
/// under the resource path.
pub fn resource_routes<R: Repository>(controller: ResourceController<R>) -> Router {
    resource_routes_with_limit(controller, DEFAULT_BODY_LIMIT)
}

pub fn resource_routes_with_limit<R: Repository>(controller: ResourceController<R>, body_limit: usize) -> Router {
    let actions = controller.actions();
    let mut collection: Option<MethodRouter<SharedController<R>>> = None;
    let mut member: Option<MethodRouter<SharedController<R>>> = None;

    if actions.contains(Action::List) {
        collection = Some(collection.unwrap_or_else(MethodRouter::new).get(list::<R>));
    }
    if actions.contains(Action::Create) {
        collection = Some(collection.unwrap_or_else(MethodRouter::new).post(create::<R>));
    }
    if actions.contains(Action::Show) {
        member = Some(member.unwrap_or_else(MethodRouter::new).get(show::<R>));
    }
    if actions.contains(Action::Update) {
        member = Some(member.unwrap_or_else(MethodRouter::new).patch(update::<R>).put(update::<R>));
    }
    if actions.contains(Action::Destroy) {
        member = Some(member.unwrap_or_else(MethodRouter::new).delete(destroy::<R>));
    }

    let mut router = Router::new();
    if let Some(routes) = collection {
        router = router.route("/", routes);
    }
    if let Some(routes) = member {
        router = router.route("/:id", routes);
    }
    tracing::debug!(
        model = %controller.keys().model,
        actions = ?controller.actions().actions().collect::<Vec<_>>(),
        "mounting resource routes"
    );
    let guard = BodyLimit {
        scheme: controller.scheme().clone(),
        limit: body_limit,
    };
    router
        .with_state(Arc::new(controller))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::from_fn_with_state(guard, reject_oversized))
}
