// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Scaling of the listener Deployment outside the full reconcile.
//!
//! Only `spec.replicas` is touched, through an optimistic patch. Scaling never
//! creates the Deployment.

use super::bundle::BundleKey;
use crate::crd::Infinispan;
use crate::errors::{ListenerError, StoreError};
use crate::metrics::record_scale;
use crate::reconcilers::store::{kind_of, ResourceStore};
use k8s_openapi::api::apps::v1::Deployment;
use tracing::{error, info};

/// Set the replica count of the listener Deployment of `parent` to `replicas`.
///
/// Does nothing when the listener is disabled.
///
/// # Errors
///
/// Returns [`ListenerError::InvalidReplicas`] for a negative count, a not-found
/// error when the Deployment does not exist, and any store failure.
pub async fn scale_config_listener<S: ResourceStore>(
    parent: &Infinispan,
    store: &S,
    replicas: i32,
) -> Result<(), ListenerError> {
    if !parent.is_config_listener_enabled() {
        return Ok(());
    }
    if replicas < 0 {
        return Err(ListenerError::InvalidReplicas { replicas });
    }

    let key = BundleKey::for_parent(parent)?;
    info!(name = %key.name(), namespace = %key.namespace(), replicas = replicas, "Scaling config listener deployment");

    let seed = Deployment {
        metadata: key.object_meta(),
        ..Default::default()
    };
    let name = key.name().to_string();
    let result = store
        .create_or_patch(seed, false, move |deployment: &mut Deployment| {
            if deployment.metadata.creation_timestamp.is_none() {
                return Err(StoreError::NotFound {
                    kind: kind_of::<Deployment>(),
                    name: name.clone(),
                });
            }
            deployment.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
            Ok(())
        })
        .await;

    match result {
        Ok(()) => {
            record_scale(replicas);
            Ok(())
        }
        Err(e) => {
            error!(name = %key.name(), namespace = %key.namespace(), error = %e, "Unable to scale config listener deployment");
            Err(e.into())
        }
    }
}
