// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Config listener reconciliation.
//!
//! An `Infinispan` with the config listener enabled gets a bundle of four objects
//! (see [`bundle`]). This module brings that bundle in line with the parent:
//!
//! | enabled | Deployment | image matches | replicas | action               |
//! |---------|------------|---------------|----------|----------------------|
//! | no      | any        | any           | any      | tear the bundle down |
//! | yes     | absent     | -             | -        | create the bundle    |
//! | yes     | present    | yes           | 0        | scale to 1           |
//! | yes     | present    | yes           | > 0      | nothing              |
//! | yes     | present    | no            | any      | update the bundle    |
//!
//! Bundle writes happen in the order `ServiceAccount`, `Role`, `RoleBinding`,
//! `Deployment` and stop at the first failure. Nothing is rolled back; the next
//! reconcile picks up where this one stopped.

pub mod bundle;
pub mod image;
pub mod scale;
pub mod teardown;

use crate::constants::DEFAULT_LISTENER_REPLICAS;
use crate::crd::Infinispan;
use crate::errors::{ListenerError, StoreError};
use crate::metrics::record_bundle_object;
use crate::reconcilers::store::{kind_of, ResourceStore, StoredResource};
use bundle::{deployment_replicas, listener_image, BundleKey, ConfigListenerBundle};
use image::{ImageResolver, OperatorImageSource};
use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;
use tracing::{debug, error, info};

pub use scale::scale_config_listener;
pub use teardown::remove_config_listener;

/// Branch taken by [`reconcile_config_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerAction {
    /// The listener is disabled and the bundle was torn down.
    Removed,
    /// No Deployment existed; the bundle was created.
    Created,
    /// The Deployment ran another image; the whole bundle was updated.
    Updated,
    /// The Deployment was scaled to zero and has been scaled back up.
    ScaledUp,
    /// The bundle already matches the parent.
    Unchanged,
}

impl ListenerAction {
    /// Label used for logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Removed => "removed",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::ScaledUp => "scaled_up",
            Self::Unchanged => "unchanged",
        }
    }
}

/// How bundle objects are written during a full sync.
///
/// The mode is chosen from the Deployment's presence, but each object falls back
/// to the other write on its own, so any surviving subset of the bundle heals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncMode {
    /// Create, updating instead when the object already exists.
    Create,
    /// Update, creating instead when the object is missing.
    Update,
}

/// Bring the config listener bundle of `parent` in line with its spec.
///
/// # Errors
///
/// Returns an error when the image cannot be resolved (nothing is written in that
/// case) or when a store operation fails. Objects written before the failure are
/// left in place.
pub async fn reconcile_config_listener<S, I>(
    parent: &Infinispan,
    store: &S,
    images: &ImageResolver<I>,
) -> Result<ListenerAction, ListenerError>
where
    S: ResourceStore,
    I: OperatorImageSource,
{
    let key = BundleKey::for_parent(parent)?;

    if !parent.is_config_listener_enabled() {
        debug!(cluster = %parent.name_any(), "Config listener disabled, removing bundle");
        remove_config_listener(&key, store).await?;
        return Ok(ListenerAction::Removed);
    }

    let image = images.resolve().await.map_err(|e| {
        error!(
            cluster = %parent.name_any(),
            namespace = %key.namespace(),
            error = %e,
            "Unable to create config listener deployment"
        );
        e
    })?;

    let existing = match store.load::<Deployment>(key.name()).await {
        Ok(deployment) => Some(deployment),
        Err(e) if e.is_not_found() => None,
        Err(e) => {
            error!(name = %key.name(), namespace = %key.namespace(), error = %e, "Failed to load config listener deployment");
            return Err(e.into());
        }
    };

    let mode = match &existing {
        Some(deployment) if listener_image(deployment) == Some(image.as_str()) => {
            if deployment_replicas(deployment) == Some(0) {
                info!(name = %key.name(), "Config listener deployment scaled to zero, scaling up");
                scale_config_listener(parent, store, DEFAULT_LISTENER_REPLICAS).await?;
                return Ok(ListenerAction::ScaledUp);
            }
            debug!(name = %key.name(), image = %image, "Config listener deployment up to date");
            return Ok(ListenerAction::Unchanged);
        }
        Some(_) => SyncMode::Update,
        None => SyncMode::Create,
    };

    info!(
        name = %key.name(),
        namespace = %key.namespace(),
        image = %image,
        mode = ?mode,
        "Syncing config listener bundle"
    );
    let bundle = ConfigListenerBundle::build(&key, parent, &image);
    sync_bundle(store, &bundle, mode).await?;

    Ok(match mode {
        SyncMode::Create => ListenerAction::Created,
        SyncMode::Update => ListenerAction::Updated,
    })
}

/// Write every bundle object in dependency order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first failing store operation.
pub async fn sync_bundle<S: ResourceStore>(
    store: &S,
    bundle: &ConfigListenerBundle,
    mode: SyncMode,
) -> Result<(), StoreError> {
    write_object(store, &bundle.service_account, mode).await?;
    write_object(store, &bundle.role, mode).await?;
    write_object(store, &bundle.role_binding, mode).await?;
    write_object(store, &bundle.deployment, mode).await
}

async fn write_object<S, K>(store: &S, resource: &K, mode: SyncMode) -> Result<(), StoreError>
where
    S: ResourceStore,
    K: StoredResource,
{
    let kind = kind_of::<K>();
    let result = match mode {
        SyncMode::Create => match store.create(resource, true).await {
            Err(e) if e.is_already_exists() => {
                debug!(kind = %kind, name = ?resource.meta().name, "Already exists, updating instead");
                store.update(resource).await.map(|()| "updated")
            }
            other => other.map(|()| "created"),
        },
        SyncMode::Update => match store.update(resource).await {
            Err(e) if e.is_not_found() => {
                debug!(kind = %kind, name = ?resource.meta().name, "Missing, creating instead");
                store.create(resource, true).await.map(|()| "created")
            }
            other => other.map(|()| "updated"),
        },
    };

    match result {
        Ok(operation) => {
            record_bundle_object(&kind, operation);
            Ok(())
        }
        Err(e) => {
            error!(kind = %kind, name = ?resource.meta().name, error = %e, "Failed to write config listener object");
            Err(e)
        }
    }
}
