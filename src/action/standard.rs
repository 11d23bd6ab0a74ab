//! Template bodies for the standard actions and their prerequisites.

use super::{Action, ActionFn, ActionFuture, HookFuture, Prerequisite, PrerequisiteFn};
use crate::controller::Handler;
use crate::failure::Failure;
use crate::repository::Repository;
use axum::http::StatusCode;

pub fn action_body<R: Repository>(action: Action) -> ActionFn<R> {
    match action {
        Action::List => list::<R>,
        Action::Show => show::<R>,
        Action::Create => create::<R>,
        Action::Update => update::<R>,
        Action::Destroy => destroy::<R>,
    }
}

pub fn prerequisite_body<R: Repository>(prerequisite: Prerequisite) -> PrerequisiteFn<R> {
    match prerequisite {
        Prerequisite::FetchInstances => fetch_instances::<R>,
        Prerequisite::FetchInstance => fetch_instance::<R>,
        Prerequisite::InitInstance => init_instance::<R>,
    }
}

/// Renders the loaded collection under the plural key.
pub fn list<R: Repository>(h: &mut Handler<R>) -> ActionFuture<'_> {
    Box::pin(async move { h.render_keyed(h.models_key(), h.instances(), StatusCode::OK) })
}

pub fn show<R: Repository>(h: &mut Handler<R>) -> ActionFuture<'_> {
    Box::pin(async move {
        let record = h.require_instance()?;
        h.render_keyed(h.model_key(), record, StatusCode::OK)
    })
}

pub fn create<R: Repository>(h: &mut Handler<R>) -> ActionFuture<'_> {
    Box::pin(async move {
        let repository = h.repository().clone();
        repository.save(h.require_instance_mut()?).await?;
        h.render_keyed(h.model_key(), h.require_instance()?, StatusCode::CREATED)
    })
}

pub fn update<R: Repository>(h: &mut Handler<R>) -> ActionFuture<'_> {
    Box::pin(async move {
        let attrs = h.permitted_params()?;
        let repository = h.repository().clone();
        repository.update(h.require_instance_mut()?, attrs).await?;
        h.render_keyed(h.model_key(), h.require_instance()?, StatusCode::OK)
    })
}

/// Renders the destroyed record as confirmation.
pub fn destroy<R: Repository>(h: &mut Handler<R>) -> ActionFuture<'_> {
    Box::pin(async move {
        let repository = h.repository().clone();
        repository.destroy(h.require_instance_mut()?).await?;
        h.render_keyed(h.model_key(), h.require_instance()?, StatusCode::OK)
    })
}

pub fn fetch_instances<R: Repository>(h: &mut Handler<R>) -> HookFuture<'_> {
    Box::pin(async move {
        let records = h.repository().all().await?;
        h.set_instances(records);
        Ok(())
    })
}

pub fn fetch_instance<R: Repository>(h: &mut Handler<R>) -> HookFuture<'_> {
    Box::pin(async move {
        let id = h.params().id().ok_or_else(|| Failure::param_missing("id"))?;
        let record = h.repository().find(&id).await?;
        h.set_instance(record);
        Ok(())
    })
}

/// Builds, without saving, a record from the permitted params.
pub fn init_instance<R: Repository>(h: &mut Handler<R>) -> HookFuture<'_> {
    Box::pin(async move {
        let attrs = h.permitted_params()?;
        let record = h.repository().build(attrs)?;
        h.set_instance(record);
        Ok(())
    })
}
