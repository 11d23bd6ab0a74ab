//! In-memory repository and request helpers shared by the integration tests.

#![allow(dead_code)]

use api_scheme::{Failure, FieldErrors, Params, Repository};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use tower::ServiceExt;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Users kept in a vector. Names must be present and emails unique.
#[derive(Default)]
pub struct Users {
    rows: Mutex<Vec<User>>,
    next_id: Mutex<u64>,
    fail_all: Option<Failure>,
}

impl Users {
    pub fn seeded(names: &[&str]) -> Self {
        let users = Users::default();
        for name in names {
            let mut user = User {
                id: 0,
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
            };
            users.insert(&mut user);
        }
        users
    }

    /// Every `all` call fails with `failure`.
    pub fn failing_with(mut self, failure: Failure) -> Self {
        self.fail_all = Some(failure);
        self
    }

    fn insert(&self, user: &mut User) {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        user.id = *next;
        self.rows.lock().unwrap().push(user.clone());
    }

    fn check(&self, user: &User) -> Result<(), Failure> {
        let mut errors = FieldErrors::new();
        if user.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
        let taken = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.id != user.id && u.email == user.email);
        if taken {
            errors.add("email", "has already been taken");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Failure::validation(errors))
        }
    }
}

fn text(attrs: &Params, key: &str) -> Option<String> {
    attrs.get(key).and_then(Value::as_str).map(str::to_string)
}

#[async_trait]
impl Repository for Users {
    type Record = User;

    async fn all(&self) -> Result<Vec<User>, Failure> {
        if let Some(f) = &self.fail_all {
            return Err(f.clone());
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find(&self, id: &str) -> Result<User, Failure> {
        let missing = || Failure::not_found(format!("Couldn't find User with 'id'={}", id));
        let id: u64 = id.parse().map_err(|_| missing())?;
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(missing)
    }

    fn build(&self, attrs: Params) -> Result<User, Failure> {
        Ok(User {
            id: 0,
            name: text(&attrs, "name").unwrap_or_default(),
            email: text(&attrs, "email").unwrap_or_default(),
        })
    }

    async fn save(&self, record: &mut User) -> Result<(), Failure> {
        self.check(record)?;
        self.insert(record);
        Ok(())
    }

    async fn update(&self, record: &mut User, attrs: Params) -> Result<(), Failure> {
        if let Some(name) = text(&attrs, "name") {
            record.name = name;
        }
        if let Some(email) = text(&attrs, "email") {
            record.email = email;
        }
        self.check(record)?;
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|u| u.id == record.id) {
            Some(row) => *row = record.clone(),
            None => return Err(Failure::not_found("gone")),
        }
        Ok(())
    }

    async fn destroy(&self, record: &mut User) -> Result<(), Failure> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|u| u.id != record.id);
        if rows.len() == before {
            return Err(Failure::not_found("gone"));
        }
        Ok(())
    }
}

pub async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, json)
}

pub async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn send_json(app: &axum::Router, method: &str, uri: &str, body: &impl Serialize) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, req).await
}
