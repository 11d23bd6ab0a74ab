//! Standard actions and the composer that attaches them, with their
//! prerequisites, to a resource controller.

pub mod standard;

use crate::controller::Handler;
use crate::error::ConfigError;
use crate::failure::Failure;
use crate::repository::Repository;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = Result<Response, Failure>> + Send + 'a>>;
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Failure>> + Send + 'a>>;

/// Body of an action.
pub type ActionFn<R> = for<'a> fn(&'a mut Handler<R>) -> ActionFuture<'a>;
/// Body of a prerequisite (data loading step).
pub type PrerequisiteFn<R> = for<'a> fn(&'a mut Handler<R>) -> HookFuture<'a>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[serde(alias = "index")]
    List,
    Show,
    Create,
    Update,
    Destroy,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::List,
        Action::Show,
        Action::Create,
        Action::Update,
        Action::Destroy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Show => "show",
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
        }
    }

    pub fn spec(self) -> ActionSpec {
        ActionSpec {
            name: self,
            prerequisite: Some(match self {
                Action::List => Prerequisite::FetchInstances,
                Action::Show | Action::Update | Action::Destroy => Prerequisite::FetchInstance,
                Action::Create => Prerequisite::InitInstance,
            }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" | "index" => Ok(Action::List),
            "show" => Ok(Action::Show),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "destroy" => Ok(Action::Destroy),
            _ => Err(ConfigError::Validation(format!("unknown action: {}", s))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prerequisite {
    FetchInstances,
    FetchInstance,
    InitInstance,
}

impl Prerequisite {
    pub fn name(self) -> &'static str {
        match self {
            Prerequisite::FetchInstances => "fetch_instances",
            Prerequisite::FetchInstance => "fetch_instance",
            Prerequisite::InitInstance => "init_instance",
        }
    }

    /// Actions this step runs before.
    pub fn serves(self) -> &'static [Action] {
        match self {
            Prerequisite::FetchInstances => &[Action::List],
            Prerequisite::FetchInstance => &[Action::Show, Action::Update, Action::Destroy],
            Prerequisite::InitInstance => &[Action::Create],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionSpec {
    pub name: Action,
    pub prerequisite: Option<Prerequisite>,
}

/// A prerequisite registered to run before `only`.
pub struct BeforeHook<R: Repository> {
    pub prerequisite: Prerequisite,
    pub only: Vec<Action>,
    pub body: PrerequisiteFn<R>,
}

impl<R: Repository> Clone for BeforeHook<R> {
    fn clone(&self) -> Self {
        BeforeHook {
            prerequisite: self.prerequisite,
            only: self.only.clone(),
            body: self.body,
        }
    }
}

impl<R: Repository> fmt::Debug for BeforeHook<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeforeHook")
            .field("prerequisite", &self.prerequisite)
            .field("only", &self.only)
            .finish()
    }
}

/// Action bodies and before-hooks owned by one controller. Bodies are copied in
/// from [`standard`]; redefining one here never touches the templates.
pub struct ActionSet<R: Repository> {
    actions: Vec<(Action, ActionFn<R>)>,
    hooks: Vec<BeforeHook<R>>,
}

impl<R: Repository> Default for ActionSet<R> {
    fn default() -> Self {
        ActionSet {
            actions: Vec::new(),
            hooks: Vec::new(),
        }
    }
}

impl<R: Repository> Clone for ActionSet<R> {
    fn clone(&self) -> Self {
        ActionSet {
            actions: self.actions.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl<R: Repository> ActionSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the standard bodies of `requested` and one before-hook per distinct
    /// prerequisite. Already attached actions and hooks are kept; a hook's action
    /// list grows to cover newly requested actions.
    pub fn compose(&mut self, requested: &[Action]) -> &mut Self {
        for &action in requested {
            if self.body(action).is_none() {
                self.actions.push((action, standard::action_body::<R>(action)));
            }
        }

        let mut prerequisites: Vec<Prerequisite> = Vec::new();
        for spec in requested.iter().map(|a| a.spec()) {
            if let Some(p) = spec.prerequisite {
                if !prerequisites.contains(&p) {
                    prerequisites.push(p);
                }
            }
        }

        for prerequisite in prerequisites {
            let only = prerequisite
                .serves()
                .iter()
                .copied()
                .filter(|a| requested.contains(a));
            match self.hooks.iter_mut().find(|h| h.prerequisite == prerequisite) {
                Some(hook) => {
                    for action in only {
                        if !hook.only.contains(&action) {
                            hook.only.push(action);
                        }
                    }
                }
                None => self.hooks.push(BeforeHook {
                    prerequisite,
                    only: only.collect(),
                    body: standard::prerequisite_body::<R>(prerequisite),
                }),
            }
        }
        self
    }

    /// Replace (or add) one action body on this set.
    pub fn define(&mut self, action: Action, body: ActionFn<R>) -> &mut Self {
        match self.actions.iter_mut().find(|(a, _)| *a == action) {
            Some(slot) => slot.1 = body,
            None => self.actions.push((action, body)),
        }
        self
    }

    /// Replace one prerequisite body. Registered with no actions when not yet
    /// composed; a later compose attaches it.
    pub fn define_prerequisite(&mut self, prerequisite: Prerequisite, body: PrerequisiteFn<R>) -> &mut Self {
        match self.hooks.iter_mut().find(|h| h.prerequisite == prerequisite) {
            Some(hook) => hook.body = body,
            None => self.hooks.push(BeforeHook {
                prerequisite,
                only: Vec::new(),
                body,
            }),
        }
        self
    }

    pub fn body(&self, action: Action) -> Option<ActionFn<R>> {
        self.actions
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, body)| *body)
    }

    pub fn contains(&self, action: Action) -> bool {
        self.body(action).is_some()
    }

    /// Attached actions in attachment order.
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.actions.iter().map(|(a, _)| *a)
    }

    pub fn hooks(&self) -> &[BeforeHook<R>] {
        &self.hooks
    }

    /// Hooks to run before `action`, in registration order.
    pub fn hooks_for(&self, action: Action) -> impl Iterator<Item = &BeforeHook<R>> + '_ {
        self.hooks.iter().filter(move |h| h.only.contains(&action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;
    use async_trait::async_trait;

    struct Nothing;

    #[async_trait]
    impl Repository for Nothing {
        type Record = ();

        async fn all(&self) -> Result<Vec<()>, Failure> {
            Ok(vec![])
        }
        async fn find(&self, _id: &str) -> Result<(), Failure> {
            Ok(())
        }
        fn build(&self, _attrs: Params) -> Result<(), Failure> {
            Ok(())
        }
        async fn save(&self, _record: &mut ()) -> Result<(), Failure> {
            Ok(())
        }
        async fn update(&self, _record: &mut (), _attrs: Params) -> Result<(), Failure> {
            Ok(())
        }
        async fn destroy(&self, _record: &mut ()) -> Result<(), Failure> {
            Ok(())
        }
    }

    fn noop(_: &mut Handler<Nothing>) -> HookFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn catalog_matches_prerequisites() {
        for action in Action::ALL {
            let prerequisite = action.spec().prerequisite.unwrap();
            assert!(prerequisite.serves().contains(&action));
        }
        assert_eq!("index".parse::<Action>().unwrap(), Action::List);
        assert!("purge".parse::<Action>().is_err());
        let parsed: Vec<Action> = serde_json::from_str(r#"["index", "destroy"]"#).unwrap();
        assert_eq!(parsed, vec![Action::List, Action::Destroy]);
    }

    #[test]
    fn compose_twice_is_idempotent() {
        let mut set = ActionSet::<Nothing>::new();
        set.compose(&[Action::Show, Action::Update]);
        set.compose(&[Action::Show, Action::Update]);
        assert_eq!(set.actions().collect::<Vec<_>>(), vec![Action::Show, Action::Update]);
        assert_eq!(set.hooks().len(), 1);
        assert_eq!(set.hooks()[0].prerequisite, Prerequisite::FetchInstance);
        assert_eq!(set.hooks()[0].only, vec![Action::Show, Action::Update]);
    }

    #[test]
    fn overlapping_compose_merges_hook_actions() {
        let mut set = ActionSet::<Nothing>::new();
        set.compose(&[Action::Show]).compose(&[Action::Destroy, Action::List]);
        let hooks = set.hooks();
        assert_eq!(hooks.len(), 2);
        assert_eq!(hooks[0].only, vec![Action::Show, Action::Destroy]);
        assert_eq!(hooks[1].prerequisite, Prerequisite::FetchInstances);
        assert_eq!(set.hooks_for(Action::Destroy).count(), 1);
        assert_eq!(set.hooks_for(Action::Create).count(), 0);
    }

    #[test]
    fn redefinitions_survive_recompose() {
        let mut set = ActionSet::<Nothing>::new();
        set.define_prerequisite(Prerequisite::InitInstance, noop);
        set.compose(&[Action::Create]);
        set.compose(&[Action::Create]);
        assert_eq!(set.hooks().len(), 1);
        assert_eq!(set.hooks()[0].only, vec![Action::Create]);
    }
}
