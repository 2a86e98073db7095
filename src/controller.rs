// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Infinispan` controller driving the config listener operations.
//!
//! Each event picks one operation:
//!
//! - a parent scaled to zero with the listener enabled scales the listener to
//!   zero as well (a missing listener Deployment is fine, there is nothing to scale)
//! - otherwise the bundle is reconciled, which also tears it down when the
//!   listener is disabled
//!
//! Listener Deployments are owned by their parent, so edits to them re-trigger
//! the parent's reconcile.

use crate::constants::{
    ERROR_REQUEUE_DURATION_SECS, SUCCESS_REQUEUE_DURATION_SECS,
    TRANSIENT_ERROR_REQUEUE_DURATION_SECS,
};
use crate::context::Context;
use crate::crd::Infinispan;
use crate::errors::ListenerError;
use crate::metrics::{record_error, record_reconciliation};
use crate::reconcilers::config_listener::image::{ImageResolver, OperatorImageSource};
use crate::reconcilers::config_listener::{
    reconcile_config_listener, scale_config_listener, ListenerAction,
};
use crate::reconcilers::store::ResourceStore;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::runtime::{controller::Action, watcher::Config, Controller};
use kube::{Api, ResourceExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Outcome of handling one `Infinispan` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The bundle was reconciled.
    Reconciled(ListenerAction),
    /// The parent has no replicas; the listener was scaled to zero.
    ScaledDown,
}

impl Outcome {
    /// Label used for logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reconciled(action) => action.as_str(),
            Self::ScaledDown => "scaled_down",
        }
    }
}

/// Handle one event for `parent` against `store`.
///
/// # Errors
///
/// Returns the error of the chosen operation. A missing Deployment while scaling
/// down is not an error.
pub async fn handle_infinispan<S, I>(
    parent: &Infinispan,
    store: &S,
    images: &ImageResolver<I>,
) -> Result<Outcome, ListenerError>
where
    S: ResourceStore,
    I: OperatorImageSource,
{
    if parent.spec.replicas == 0 && parent.is_config_listener_enabled() {
        return match scale_config_listener(parent, store, 0).await {
            Ok(()) => Ok(Outcome::ScaledDown),
            Err(e) if e.is_not_found() => {
                debug!(cluster = %parent.name_any(), "No config listener deployment to scale down");
                Ok(Outcome::ScaledDown)
            }
            Err(e) => Err(e),
        };
    }

    reconcile_config_listener(parent, store, images)
        .await
        .map(Outcome::Reconciled)
}

/// Requeue delay after a failed event.
#[must_use]
pub fn requeue_after_error(err: &ListenerError) -> Duration {
    if err.is_transient() {
        Duration::from_secs(TRANSIENT_ERROR_REQUEUE_DURATION_SECS)
    } else {
        Duration::from_secs(ERROR_REQUEUE_DURATION_SECS)
    }
}

/// Run the `Infinispan` controller until the watch stream ends.
///
/// # Errors
///
/// Currently never fails; the signature leaves room for startup checks.
pub async fn run_controller(ctx: Arc<Context>) -> anyhow::Result<()> {
    let (infinispans, deployments): (Api<Infinispan>, Api<Deployment>) =
        match ctx.config.watch_namespace() {
            Some(namespace) => {
                info!(namespace = %namespace, "Starting Infinispan controller for one namespace");
                (
                    Api::namespaced(ctx.client.clone(), namespace),
                    Api::namespaced(ctx.client.clone(), namespace),
                )
            }
            None => {
                info!("Starting Infinispan controller for all namespaces");
                (Api::all(ctx.client.clone()), Api::all(ctx.client.clone()))
            }
        };

    Controller::new(infinispans, Config::default())
        .owns(deployments, Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| {
            if let Err(e) = result {
                debug!(error = %e, "Controller event failed");
            }
            futures::future::ready(())
        })
        .await;

    warn!("Infinispan controller stopped");
    Ok(())
}

async fn reconcile(parent: Arc<Infinispan>, ctx: Arc<Context>) -> Result<Action, ListenerError> {
    let start = Instant::now();
    debug!(
        cluster = %parent.name_any(),
        namespace = ?parent.namespace(),
        "Reconcile wrapper called for Infinispan"
    );

    let result = match ctx.store_for(&parent) {
        Ok(store) => handle_infinispan(&parent, &store, &ctx.images).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            info!(
                cluster = %parent.name_any(),
                outcome = outcome.as_str(),
                "Successfully reconciled config listener"
            );
            record_reconciliation(outcome.as_str(), start.elapsed());
            Ok(Action::requeue(Duration::from_secs(
                SUCCESS_REQUEUE_DURATION_SECS,
            )))
        }
        Err(e) => {
            error!(cluster = %parent.name_any(), error = %e, "Failed to reconcile config listener");
            record_reconciliation("error", start.elapsed());
            record_error(e.category());
            Err(e)
        }
    }
}

fn error_policy(_parent: Arc<Infinispan>, err: &ListenerError, _ctx: Arc<Context>) -> Action {
    Action::requeue(requeue_after_error(err))
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
