//! Example consumer: a separate Rust project that uses api-scheme as a dependency.
//! Serves an in-memory `notes` resource; requests need an `Authorization` header.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

use api_scheme::category::{ACCESS, PARAMS, RECORD_NOT_FOUND};
use api_scheme::{
    resource_routes, Action, Code, CurrentUser, ErrorMapEntry, Failure, FieldErrors, ModelErrorRule, ParamMap,
    Params, Repository, ResourceController, Scheme,
};
use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Serialize)]
struct Note {
    id: u64,
    title: String,
    body: String,
}

#[derive(Default)]
struct Notes {
    rows: Mutex<(u64, Vec<Note>)>,
}

fn field(attrs: &Params, key: &str) -> Option<String> {
    attrs.get(key).and_then(Value::as_str).map(str::to_string)
}

fn check(note: &Note) -> Result<(), Failure> {
    if note.title.trim().is_empty() {
        return Err(Failure::validation(FieldErrors::new().with("title", "can't be blank")));
    }
    Ok(())
}

impl Notes {
    fn missing(id: &str) -> Failure {
        Failure::not_found(format!("Couldn't find Note with 'id'={}", id))
    }
}

#[async_trait]
impl Repository for Notes {
    type Record = Note;

    async fn all(&self) -> Result<Vec<Note>, Failure> {
        let rows = self.rows.lock().map_err(|_| Failure::internal("store poisoned"))?;
        Ok(rows.1.clone())
    }

    async fn find(&self, id: &str) -> Result<Note, Failure> {
        let n: u64 = id.parse().map_err(|_| Self::missing(id))?;
        let rows = self.rows.lock().map_err(|_| Failure::internal("store poisoned"))?;
        rows.1.iter().find(|note| note.id == n).cloned().ok_or_else(|| Self::missing(id))
    }

    fn build(&self, attrs: Params) -> Result<Note, Failure> {
        Ok(Note {
            id: 0,
            title: field(&attrs, "title").unwrap_or_default(),
            body: field(&attrs, "body").unwrap_or_default(),
        })
    }

    async fn save(&self, record: &mut Note) -> Result<(), Failure> {
        check(record)?;
        let mut rows = self.rows.lock().map_err(|_| Failure::internal("store poisoned"))?;
        rows.0 += 1;
        record.id = rows.0;
        rows.1.push(record.clone());
        Ok(())
    }

    async fn update(&self, record: &mut Note, attrs: Params) -> Result<(), Failure> {
        if let Some(title) = field(&attrs, "title") {
            record.title = title;
        }
        if let Some(body) = field(&attrs, "body") {
            record.body = body;
        }
        check(record)?;
        let mut rows = self.rows.lock().map_err(|_| Failure::internal("store poisoned"))?;
        if let Some(row) = rows.1.iter_mut().find(|n| n.id == record.id) {
            *row = record.clone();
        }
        Ok(())
    }

    async fn destroy(&self, record: &mut Note) -> Result<(), Failure> {
        let mut rows = self.rows.lock().map_err(|_| Failure::internal("store poisoned"))?;
        rows.1.retain(|n| n.id != record.id);
        Ok(())
    }
}

/// Any non-empty `Authorization` header counts as signed in.
async fn authenticate(mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(token) = token {
        req.extensions_mut().insert(CurrentUser(json!({ "token": token })));
    }
    next.run(req).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("api_scheme=debug")),
        )
        .init();

    let scheme = Scheme::builder("notes")
        .error_map(vec![
            ErrorMapEntry::new([RECORD_NOT_FOUND], Code::Status(404)),
            ErrorMapEntry::new([PARAMS], Code::Status(400)),
            ErrorMapEntry::new([ACCESS], Code::Status(401)),
        ])
        .model_error_map(vec![ModelErrorRule::new("blank", Code::range(422, 1))])
        .param_map(ParamMap::permit(["title", "body?"]))
        .build()?;

    let controller = ResourceController::new(Arc::new(scheme), Arc::new(Notes::default()))
        .compose(&Action::ALL)
        .require_user();

    let app = Router::new()
        .nest("/notes", resource_routes(controller))
        .layer(axum::middleware::from_fn(authenticate));

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}/notes", port);
    axum::serve(listener, app).await?;
    Ok(())
}
