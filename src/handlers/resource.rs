//! Generic axum handlers for a resource controller. Each one assembles params
//! and hands off to [`ResourceController::process`]. Extractor rejections become
//! `Params` failures and go through the scheme's dispatch like any other.

use crate::action::Action;
use crate::controller::ResourceController;
use crate::extractors::MaybeUser;
use crate::failure::Failure;
use crate::params::Params;
use crate::repository::Repository;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;

pub type SharedController<R> = Arc<ResourceController<R>>;

type QueryPairs = Result<Query<HashMap<String, String>>, QueryRejection>;

fn path_id(path: Result<Path<String>, PathRejection>) -> Result<String, Failure> {
    path.map(|Path(id)| id)
        .map_err(|e| Failure::malformed(e.body_text()))
}

fn query_params(query: QueryPairs) -> Result<Params, Failure> {
    query
        .map(|Query(pairs)| Params::new().merge_query(pairs))
        .map_err(|e| Failure::malformed(e.body_text()))
}

fn body_params(body: Result<Bytes, BytesRejection>, query: QueryPairs) -> Result<Params, Failure> {
    let body = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Failure::payload_too_large(e.body_text())
        } else {
            Failure::malformed(e.body_text())
        }
    })?;
    let query = query.map_err(|e| Failure::malformed(e.body_text()))?;
    Ok(Params::from_body(&body)?.merge_query(query.0))
}

async fn respond<R: Repository>(
    controller: &ResourceController<R>,
    action: Action,
    params: Result<Params, Failure>,
    user: MaybeUser,
) -> Response {
    match params {
        Ok(params) => controller.process(action, params, user.0).await,
        Err(failure) => controller.scheme().dispatch(&failure),
    }
}

pub async fn list<R: Repository>(
    State(controller): State<SharedController<R>>,
    user: MaybeUser,
    query: QueryPairs,
) -> Response {
    respond(&controller, Action::List, query_params(query), user).await
}

pub async fn show<R: Repository>(
    State(controller): State<SharedController<R>>,
    user: MaybeUser,
    path: Result<Path<String>, PathRejection>,
    query: QueryPairs,
) -> Response {
    let params = path_id(path).and_then(|id| Ok(query_params(query)?.with_id(id)));
    respond(&controller, Action::Show, params, user).await
}

pub async fn create<R: Repository>(
    State(controller): State<SharedController<R>>,
    user: MaybeUser,
    query: QueryPairs,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    respond(&controller, Action::Create, body_params(body, query), user).await
}

pub async fn update<R: Repository>(
    State(controller): State<SharedController<R>>,
    user: MaybeUser,
    path: Result<Path<String>, PathRejection>,
    query: QueryPairs,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let params = path_id(path).and_then(|id| Ok(body_params(body, query)?.with_id(id)));
    respond(&controller, Action::Update, params, user).await
}

pub async fn destroy<R: Repository>(
    State(controller): State<SharedController<R>>,
    user: MaybeUser,
    path: Result<Path<String>, PathRejection>,
    query: QueryPairs,
) -> Response {
    let params = path_id(path).and_then(|id| Ok(query_params(query)?.with_id(id)));
    respond(&controller, Action::Destroy, params, user).await
}
