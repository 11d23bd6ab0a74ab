//! Resource controller: runs composed actions for one resource type and routes
//! every failure through the scheme's dispatch.

use crate::action::{Action, ActionFn, ActionSet, Prerequisite, PrerequisiteFn};
use crate::case::pluralize;
use crate::extractors::CurrentUser;
use crate::failure::Failure;
use crate::params::Params;
use crate::repository::Repository;
use crate::scheme::Scheme;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Response keys derived from the repository's model name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceKeys {
    pub model: String,
    pub models: String,
}

impl ResourceKeys {
    pub fn from_model_name(name: &str) -> Self {
        ResourceKeys {
            model: name.to_string(),
            models: pluralize(name),
        }
    }
}

/// Per-request state: params, principal, current resource and collection.
/// Lives for one request and is never shared.
pub struct Handler<R: Repository> {
    scheme: Arc<Scheme>,
    repository: Arc<R>,
    keys: ResourceKeys,
    params: Params,
    current_user: Option<CurrentUser>,
    instance: Option<R::Record>,
    instances: Vec<R::Record>,
}

impl<R: Repository> Handler<R> {
    pub fn new(
        scheme: Arc<Scheme>,
        repository: Arc<R>,
        keys: ResourceKeys,
        params: Params,
        current_user: Option<CurrentUser>,
    ) -> Self {
        Handler {
            scheme,
            repository,
            keys,
            params,
            current_user,
            instance: None,
            instances: Vec::new(),
        }
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.current_user.as_ref()
    }

    pub fn model_key(&self) -> &str {
        &self.keys.model
    }

    pub fn models_key(&self) -> &str {
        &self.keys.models
    }

    pub fn instance(&self) -> Option<&R::Record> {
        self.instance.as_ref()
    }

    pub fn instances(&self) -> &[R::Record] {
        &self.instances
    }

    pub fn set_instance(&mut self, record: R::Record) {
        self.instance = Some(record);
    }

    pub fn set_instances(&mut self, records: Vec<R::Record>) {
        self.instances = records;
    }

    /// The loaded resource. Missing means no prerequisite loaded it, which is a
    /// wiring defect and renders as an internal failure.
    pub fn require_instance(&self) -> Result<&R::Record, Failure> {
        self.instance
            .as_ref()
            .ok_or_else(|| Failure::internal(format!("no {} loaded", self.keys.model)))
    }

    pub fn require_instance_mut(&mut self) -> Result<&mut R::Record, Failure> {
        let model = &self.keys.model;
        self.instance
            .as_mut()
            .ok_or_else(|| Failure::internal(format!("no {} loaded", model)))
    }

    /// Fails with `Access::InvalidUser` when the request carries no principal.
    pub fn validate_access_token(&self) -> Result<&CurrentUser, Failure> {
        self.current_user.as_ref().ok_or_else(Failure::invalid_user)
    }

    pub fn permitted_params(&self) -> Result<Params, Failure> {
        self.scheme.permitted_params(&self.params)
    }

    /// Render `{key: payload}` through the scheme's success renderer.
    pub fn render_keyed<T: Serialize + ?Sized>(
        &self,
        key: &str,
        payload: &T,
        status: StatusCode,
    ) -> Result<Response, Failure> {
        let mut body = Map::new();
        body.insert(key.to_string(), serde_json::to_value(payload)?);
        Ok(self.render(Value::Object(body), status))
    }

    pub fn render(&self, payload: Value, status: StatusCode) -> Response {
        self.scheme.render_success(payload, status)
    }
}

/// Composed actions for one resource type. Built once at startup, then shared.
pub struct ResourceController<R: Repository> {
    scheme: Arc<Scheme>,
    repository: Arc<R>,
    actions: ActionSet<R>,
    keys: ResourceKeys,
    require_user: bool,
}

impl<R: Repository> ResourceController<R> {
    pub fn new(scheme: Arc<Scheme>, repository: Arc<R>) -> Self {
        let keys = ResourceKeys::from_model_name(&repository.model_name());
        ResourceController {
            scheme,
            repository,
            actions: ActionSet::new(),
            keys,
            require_user: false,
        }
    }

    pub fn compose(mut self, actions: &[Action]) -> Self {
        self.actions.compose(actions);
        self
    }

    pub fn define(mut self, action: Action, body: ActionFn<R>) -> Self {
        self.actions.define(action, body);
        self
    }

    pub fn define_prerequisite(mut self, prerequisite: Prerequisite, body: PrerequisiteFn<R>) -> Self {
        self.actions.define_prerequisite(prerequisite, body);
        self
    }

    /// Run the access guard before every action.
    pub fn require_user(mut self) -> Self {
        self.require_user = true;
        self
    }

    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    pub fn actions(&self) -> &ActionSet<R> {
        &self.actions
    }

    pub fn keys(&self) -> &ResourceKeys {
        &self.keys
    }

    /// Run `action` for one request. Failures never escape: they are rendered
    /// by the scheme's dispatch.
    pub async fn process(&self, action: Action, params: Params, user: Option<CurrentUser>) -> Response {
        tracing::debug!(action = %action, model = %self.keys.model, "processing action");
        let mut handler = Handler::new(
            self.scheme.clone(),
            self.repository.clone(),
            self.keys.clone(),
            params,
            user,
        );
        match self.run(action, &mut handler).await {
            Ok(response) => response,
            Err(failure) => self.scheme.dispatch(&failure),
        }
    }

    async fn run(&self, action: Action, handler: &mut Handler<R>) -> Result<Response, Failure> {
        let body = self
            .actions
            .body(action)
            .ok_or_else(|| Failure::internal(format!("action '{}' is not composed", action)))?;
        if self.require_user {
            handler.validate_access_token()?;
        }
        for hook in self.actions.hooks_for(action) {
            (hook.body)(handler).await?;
        }
        body(handler).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_model_name() {
        let keys = ResourceKeys::from_model_name("blog_category");
        assert_eq!(keys.model, "blog_category");
        assert_eq!(keys.models, "blog_categories");
    }
}
