//! Scheme: the per-handler-type configuration and the failure dispatch engine.
//!
//! A scheme is declared once through [`SchemeBuilder`] and is immutable afterwards.
//! Declarations are write-once: the first error map, model error map, param map or
//! default renderer declared wins and later declarations are ignored. Category names
//! in the error map are resolved when the scheme is built; an unresolvable name fails
//! the build.

use crate::category::CategoryRegistry;
use crate::classify::{ErrorMap, ErrorMapEntry, ModelErrorMap, ModelErrorRule};
use crate::code::{self, Code, ResolvedCode};
use crate::error::ConfigError;
use crate::failure::Failure;
use crate::i18n::{Catalog, Translator, DEFAULT_SCOPE};
use crate::params::{ParamMap, Params};
use crate::response::{
    DefaultErrorRenderer, DefaultSuccessRenderer, ErrorContext, ErrorRenderer, SuccessContext,
    SuccessRenderer,
};
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Handler-type configuration. Share it with `Arc`.
pub struct Scheme {
    identity: String,
    namespace: Option<String>,
    locale_scope: String,
    registry: CategoryRegistry,
    declared_error_map: Vec<ErrorMapEntry>,
    declared_model_error_map: Vec<ModelErrorRule>,
    error_map: ErrorMap,
    model_error_map: ModelErrorMap,
    param_map: Option<ParamMap>,
    translator: Arc<dyn Translator>,
    error_renderer: Arc<dyn ErrorRenderer>,
    error_overrides: HashMap<Option<Code>, Arc<dyn ErrorRenderer>>,
    success_renderer: Arc<dyn SuccessRenderer>,
    success_overrides: HashMap<u16, Arc<dyn SuccessRenderer>>,
}

impl std::fmt::Debug for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheme")
            .field("identity", &self.identity)
            .field("namespace", &self.namespace)
            .field("error_map", &self.declared_error_map)
            .field("model_error_map", &self.declared_model_error_map)
            .field("param_map", &self.param_map)
            .finish_non_exhaustive()
    }
}

impl Scheme {
    /// `identity` keys localized messages, e.g. `"api/v1/users"`.
    pub fn builder(identity: impl Into<String>) -> SchemeBuilder {
        SchemeBuilder::new(identity)
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn param_map(&self) -> Option<&ParamMap> {
        self.param_map.as_ref()
    }

    /// Classify a failure. Validation failures go through the model error map,
    /// everything else through the error map. `None` means uncategorized.
    pub fn classify(&self, failure: &Failure) -> Option<Code> {
        let code = if failure.category().is_validation() {
            self.model_error_map.classify(failure)
        } else {
            self.error_map.classify(failure)
        };
        tracing::debug!(
            category = %failure.category(),
            code = ?code,
            "classified failure"
        );
        code
    }

    pub fn locale_scope(&self) -> &str {
        &self.locale_scope
    }

    pub fn resolve_code(&self, code: Option<Code>) -> ResolvedCode {
        code::resolve(code, self.translator.as_ref(), &self.locale_scope, &self.identity)
    }

    /// Render a raised failure. Every failure of a composed action ends here.
    pub fn dispatch(&self, failure: &Failure) -> Response {
        let resolved = self.resolve_code(self.classify(failure));
        let renderer = self
            .error_overrides
            .get(&resolved.code)
            .unwrap_or(&self.error_renderer);
        renderer.render(&ErrorContext {
            text: &resolved.text,
            sub_code: resolved.sub_code,
            pure_code: resolved.pure_code,
            code: resolved.code,
            failure,
        })
    }

    /// Render a successful result. Never goes through dispatch.
    pub fn render_success(&self, payload: Value, status: StatusCode) -> Response {
        let renderer = self
            .success_overrides
            .get(&status.as_u16())
            .unwrap_or(&self.success_renderer);
        renderer.render(SuccessContext { payload, status })
    }

    /// Attributes allowed through the param map. Without one, everything but the id.
    pub fn permitted_params(&self, params: &Params) -> Result<Params, Failure> {
        match &self.param_map {
            Some(map) => map.permitted(params),
            None => Ok(params.without_id()),
        }
    }
}

/// Declares a [`Scheme`].
pub struct SchemeBuilder {
    identity: String,
    namespace: Option<String>,
    locale_scope: Option<String>,
    registry: Option<CategoryRegistry>,
    local_categories: Vec<(String, String)>,
    error_map: Option<Vec<ErrorMapEntry>>,
    model_error_map: Option<Vec<ModelErrorRule>>,
    param_map: Option<ParamMap>,
    translator: Option<Arc<dyn Translator>>,
    error_renderer: Option<Arc<dyn ErrorRenderer>>,
    error_overrides: HashMap<Option<Code>, Arc<dyn ErrorRenderer>>,
    success_renderer: Option<Arc<dyn SuccessRenderer>>,
    success_overrides: HashMap<u16, Arc<dyn SuccessRenderer>>,
    parent: Option<Inherited>,
}

/// Settings taken from a parent scheme. Applied in `build`, after every
/// declaration of the child, so they only fill gaps.
struct Inherited {
    namespace: Option<String>,
    locale_scope: String,
    registry: CategoryRegistry,
    error_map: Vec<ErrorMapEntry>,
    model_error_map: Vec<ModelErrorRule>,
    param_map: Option<ParamMap>,
    translator: Arc<dyn Translator>,
    error_renderer: Arc<dyn ErrorRenderer>,
    error_overrides: HashMap<Option<Code>, Arc<dyn ErrorRenderer>>,
    success_renderer: Arc<dyn SuccessRenderer>,
    success_overrides: HashMap<u16, Arc<dyn SuccessRenderer>>,
}

impl Inherited {
    fn from_scheme(parent: &Scheme) -> Self {
        Inherited {
            namespace: parent.namespace.clone(),
            locale_scope: parent.locale_scope.clone(),
            registry: parent.registry.clone(),
            error_map: parent.declared_error_map.clone(),
            model_error_map: parent.declared_model_error_map.clone(),
            param_map: parent.param_map.clone(),
            translator: parent.translator.clone(),
            error_renderer: parent.error_renderer.clone(),
            error_overrides: parent.error_overrides.clone(),
            success_renderer: parent.success_renderer.clone(),
            success_overrides: parent.success_overrides.clone(),
        }
    }
}

impl SchemeBuilder {
    pub fn new(identity: impl Into<String>) -> Self {
        SchemeBuilder {
            identity: identity.into(),
            namespace: None,
            locale_scope: None,
            registry: None,
            local_categories: Vec::new(),
            error_map: None,
            model_error_map: None,
            param_map: None,
            translator: None,
            error_renderer: None,
            error_overrides: HashMap::new(),
            success_renderer: None,
            success_overrides: HashMap::new(),
            parent: None,
        }
    }

    /// Namespace for nested category lookup, e.g. `"Users"`.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace.get_or_insert(namespace.into());
        self
    }

    pub fn locale_scope(mut self, scope: impl Into<String>) -> Self {
        self.locale_scope.get_or_insert(scope.into());
        self
    }

    /// Registry to resolve names against. Defaults to the standard taxonomy.
    pub fn registry(mut self, registry: CategoryRegistry) -> Self {
        self.registry.get_or_insert(registry);
        self
    }

    /// Define a category local to this scheme: `name` is nested under the
    /// namespace when one is set. `parent` is resolved like error map names.
    pub fn define_category(mut self, name: impl Into<String>, parent: impl Into<String>) -> Self {
        self.local_categories.push((name.into(), parent.into()));
        self
    }

    pub fn error_map(mut self, entries: Vec<ErrorMapEntry>) -> Self {
        self.error_map.get_or_insert(entries);
        self
    }

    pub fn model_error_map(mut self, rules: Vec<ModelErrorRule>) -> Self {
        self.model_error_map.get_or_insert(rules);
        self
    }

    pub fn param_map(mut self, map: ParamMap) -> Self {
        self.param_map.get_or_insert(map);
        self
    }

    pub fn translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator.get_or_insert(Arc::new(translator));
        self
    }

    /// Default error renderer.
    pub fn render_error_with(mut self, renderer: impl ErrorRenderer + 'static) -> Self {
        self.error_renderer.get_or_insert(Arc::new(renderer));
        self
    }

    /// Renderer used instead of the default for one code.
    pub fn render_code_with(mut self, code: Code, renderer: impl ErrorRenderer + 'static) -> Self {
        let renderer: Arc<dyn ErrorRenderer> = Arc::new(renderer);
        self.error_overrides.entry(Some(code)).or_insert(renderer);
        self
    }

    /// Renderer used instead of the default for failures no map classified.
    pub fn render_uncategorized_with(mut self, renderer: impl ErrorRenderer + 'static) -> Self {
        let renderer: Arc<dyn ErrorRenderer> = Arc::new(renderer);
        self.error_overrides.entry(None).or_insert(renderer);
        self
    }

    /// Default success renderer.
    pub fn render_success_with(mut self, renderer: impl SuccessRenderer + 'static) -> Self {
        self.success_renderer.get_or_insert(Arc::new(renderer));
        self
    }

    /// Success renderer used instead of the default for one status.
    pub fn render_status_with(
        mut self,
        status: StatusCode,
        renderer: impl SuccessRenderer + 'static,
    ) -> Self {
        let renderer: Arc<dyn SuccessRenderer> = Arc::new(renderer);
        self.success_overrides.entry(status.as_u16()).or_insert(renderer);
        self
    }

    /// Take every setting this builder does not declare from `parent`. The
    /// child's declarations win whether they come before or after this call.
    pub fn inherit(mut self, parent: &Scheme) -> Self {
        if self.parent.is_none() {
            self.parent = Some(Inherited::from_scheme(parent));
        }
        self
    }

    fn fill_from(mut self, parent: Inherited) -> Self {
        if self.namespace.is_none() {
            self.namespace = parent.namespace;
        }
        self.locale_scope.get_or_insert(parent.locale_scope);
        self.registry.get_or_insert(parent.registry);
        self.error_map.get_or_insert(parent.error_map);
        self.model_error_map.get_or_insert(parent.model_error_map);
        if self.param_map.is_none() {
            self.param_map = parent.param_map;
        }
        self.translator.get_or_insert(parent.translator);
        self.error_renderer.get_or_insert(parent.error_renderer);
        self.success_renderer.get_or_insert(parent.success_renderer);
        for (code, r) in parent.error_overrides {
            self.error_overrides.entry(code).or_insert(r);
        }
        for (status, r) in parent.success_overrides {
            self.success_overrides.entry(status).or_insert(r);
        }
        self
    }

    /// Resolve and compile everything. Configuration defects surface here.
    pub fn build(mut self) -> Result<Scheme, ConfigError> {
        if let Some(parent) = self.parent.take() {
            self = self.fill_from(parent);
        }
        if self.identity.trim().is_empty() {
            return Err(ConfigError::Validation("scheme identity must not be empty".into()));
        }
        let mut registry = self.registry.unwrap_or_default();
        for (name, parent) in &self.local_categories {
            let qualified = match &self.namespace {
                Some(ns) => format!("{}::{}", ns, name),
                None => name.clone(),
            };
            let parent = registry.resolve(parent, self.namespace.as_deref())?;
            registry.define(&qualified, parent.name())?;
        }

        let declared_error_map = self.error_map.unwrap_or_default();
        let declared_model_error_map = self.model_error_map.unwrap_or_default();
        let error_map = ErrorMap::resolve(&declared_error_map, &registry, self.namespace.as_deref())?;
        let model_error_map = ModelErrorMap::compile(&declared_model_error_map)?;

        tracing::debug!(
            identity = %self.identity,
            error_map = error_map.len(),
            model_error_map = model_error_map.len(),
            "scheme built"
        );

        Ok(Scheme {
            identity: self.identity,
            namespace: self.namespace,
            locale_scope: self.locale_scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            registry,
            declared_error_map,
            declared_model_error_map,
            error_map,
            model_error_map,
            param_map: self.param_map,
            translator: self.translator.unwrap_or_else(|| Arc::new(Catalog::new())),
            error_renderer: self
                .error_renderer
                .unwrap_or_else(|| Arc::new(DefaultErrorRenderer)),
            error_overrides: self.error_overrides,
            success_renderer: self
                .success_renderer
                .unwrap_or_else(|| Arc::new(DefaultSuccessRenderer)),
            success_overrides: self.success_overrides,
        })
    }
}
