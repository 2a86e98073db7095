// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Removal of the config listener bundle.

use super::bundle::BundleKey;
use crate::errors::StoreError;
use crate::metrics::record_bundle_object;
use crate::reconcilers::store::{kind_of, ResourceStore, StoredResource};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use tracing::{debug, error};

/// Delete every object of the bundle identified by `key`.
///
/// Objects that are already gone count as deleted. The first other failure stops
/// the teardown; running it again only touches what is still there.
///
/// # Errors
///
/// Returns the first store failure other than a missing object.
pub async fn remove_config_listener<S: ResourceStore>(
    key: &BundleKey,
    store: &S,
) -> Result<(), StoreError> {
    delete_if_present::<S, Deployment>(store, key).await?;
    delete_if_present::<S, Role>(store, key).await?;
    delete_if_present::<S, RoleBinding>(store, key).await?;
    delete_if_present::<S, ServiceAccount>(store, key).await
}

async fn delete_if_present<S, K>(store: &S, key: &BundleKey) -> Result<(), StoreError>
where
    S: ResourceStore,
    K: StoredResource,
{
    match store.delete::<K>(key.name()).await {
        Ok(()) => {
            record_bundle_object(&kind_of::<K>(), "deleted");
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            debug!(kind = %kind_of::<K>(), name = %key.name(), "Already deleted");
            Ok(())
        }
        Err(e) => {
            error!(
                kind = %kind_of::<K>(),
                name = %key.name(),
                namespace = %key.namespace(),
                error = %e,
                "Failed to delete config listener object"
            );
            Err(e)
        }
    }
}
