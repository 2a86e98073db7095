// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource store used by the config listener reconciler.
//!
//! The reconciler never talks to the API server directly. It goes through the
//! [`ResourceStore`] trait, which loads, creates, updates, deletes and patches
//! namespaced objects on behalf of one owning `Infinispan`. [`KubeStore`] is the
//! implementation backed by a [`kube::Client`].
//!
//! # Write Strategies
//!
//! - **Create**: plain create, optionally adding the owner as controller reference
//! - **Update**: read the live object, carry over `resourceVersion` and owner
//!   references, then replace; conflicts re-read and try again
//! - **Create or patch**: load (or seed), mutate through a closure, then either
//!   create or send a JSON merge patch holding only the changed fields plus the
//!   observed `resourceVersion`, so concurrent writers are never overwritten
//!
//! Every API call goes through [`retry_api_call`], which absorbs rate limiting,
//! server errors and transport failures.
//!
//! # Example
//!
//! ```rust,no_run
//! use config_listener::reconcilers::store::{KubeStore, ResourceStore};
//! use k8s_openapi::api::core::v1::ServiceAccount;
//! use kube::Client;
//!
//! async fn example(client: Client, sa: ServiceAccount) -> anyhow::Result<()> {
//!     let store = KubeStore::new(client, "caches", None);
//!     store.create(&sa, false).await?;
//!     Ok(())
//! }
//! ```

use crate::constants::{FIELD_MANAGER, MAX_CONFLICT_ATTEMPTS};
use crate::errors::StoreError;
use crate::reconcilers::retry::retry_api_call;
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Debug;
use tracing::{debug, info, warn};

/// Namespaced object that can be kept in a [`ResourceStore`].
pub trait StoredResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<T> StoredResource for T where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Kind name of a stored resource type, e.g. `Deployment`.
#[must_use]
pub fn kind_of<K: StoredResource>() -> String {
    K::kind(&()).into_owned()
}

/// Name of a stored resource.
///
/// # Errors
///
/// Returns [`StoreError::MissingName`] when `metadata.name` is unset.
pub fn resource_name<K: StoredResource>(resource: &K) -> Result<String, StoreError> {
    resource
        .meta()
        .name
        .clone()
        .ok_or_else(|| StoreError::MissingName {
            kind: kind_of::<K>(),
        })
}

/// Load, create, update, delete and patch objects in one namespace.
///
/// Implementations report a missing object as [`StoreError::NotFound`] and a name
/// collision on create as [`StoreError::AlreadyExists`], so callers can branch on
/// them. Transient failures are retried inside the store.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Load the object called `name`.
    async fn load<K: StoredResource>(&self, name: &str) -> Result<K, StoreError>;

    /// Create `resource`. When `set_controller_owner` is set the store's owner is
    /// added as controller reference so the object is garbage collected with it.
    async fn create<K: StoredResource>(
        &self,
        resource: &K,
        set_controller_owner: bool,
    ) -> Result<(), StoreError>;

    /// Replace the live object with `resource`.
    ///
    /// Returns [`StoreError::NotFound`] when there is nothing to replace.
    async fn update<K: StoredResource>(&self, resource: &K) -> Result<(), StoreError>;

    /// Delete the object called `name`.
    ///
    /// Returns [`StoreError::NotFound`] when it does not exist.
    async fn delete<K: StoredResource>(&self, name: &str) -> Result<(), StoreError>;

    /// Load the object named like `seed` (or start from `seed` when it does not
    /// exist), run `mutate` on it and persist the result.
    ///
    /// An object that does not exist yet has no `creationTimestamp` when handed to
    /// `mutate`. Any error returned by `mutate` aborts the operation before
    /// anything is written.
    async fn create_or_patch<K, F>(
        &self,
        seed: K,
        set_controller_owner: bool,
        mutate: F,
    ) -> Result<(), StoreError>
    where
        K: StoredResource,
        F: Fn(&mut K) -> Result<(), StoreError> + Send + Sync;
}

/// [`ResourceStore`] backed by the Kubernetes API.
///
/// A store is bound to the namespace of one owning resource, and to that owner's
/// controller reference when one is supplied.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    namespace: String,
    owner: Option<OwnerReference>,
}

impl KubeStore {
    /// Create a store for `namespace`, adding `owner` to created objects on request.
    #[must_use]
    pub fn new(client: Client, namespace: impl Into<String>, owner: Option<OwnerReference>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            owner,
        }
    }

    /// Namespace all operations are scoped to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn api<K: StoredResource>(&self) -> Api<K> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }

    /// Send the difference between `current` and `desired` as a merge patch.
    ///
    /// Returns `false` when there was nothing to send.
    async fn patch_changes<K: StoredResource>(
        &self,
        current: &K,
        desired: &K,
    ) -> Result<bool, StoreError> {
        let name = resource_name(current)?;
        let kind = kind_of::<K>();

        let mut changes = merge_patch(&serde_json::to_value(current)?, &serde_json::to_value(desired)?);
        if changes.as_object().is_some_and(Map::is_empty) {
            debug!(namespace = %self.namespace, name = %name, kind = %kind, "Nothing to patch");
            return Ok(false);
        }
        if let (Some(version), Value::Object(fields)) =
            (current.meta().resource_version.as_ref(), &mut changes)
        {
            let metadata = fields
                .entry("metadata")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(metadata) = metadata {
                metadata.insert("resourceVersion".into(), Value::String(version.clone()));
            }
        }

        let api = self.api::<K>();
        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        let patch = Patch::Merge(changes);
        let operation = format!("patch {kind} {}/{name}", self.namespace);
        retry_api_call(|| api.patch(&name, &params, &patch), &operation)
            .await
            .map_err(|e| StoreError::from_kube("patch", &kind, &name, e))?;

        info!("Patched {} {}/{}", kind, self.namespace, name);
        Ok(true)
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn load<K: StoredResource>(&self, name: &str) -> Result<K, StoreError> {
        let api = self.api::<K>();
        let kind = kind_of::<K>();
        debug!(namespace = %self.namespace, name = %name, kind = %kind, "Loading resource");

        let operation = format!("get {kind} {}/{name}", self.namespace);
        retry_api_call(|| api.get(name), &operation)
            .await
            .map_err(|e| StoreError::from_kube("get", &kind, name, e))
    }

    async fn create<K: StoredResource>(
        &self,
        resource: &K,
        set_controller_owner: bool,
    ) -> Result<(), StoreError> {
        let name = resource_name(resource)?;
        let kind = kind_of::<K>();

        let mut object = resource.clone();
        if set_controller_owner {
            if let Some(owner) = &self.owner {
                let references = object.meta_mut().owner_references.get_or_insert_with(Vec::new);
                if !references.iter().any(|reference| reference.uid == owner.uid) {
                    references.push(owner.clone());
                }
            }
        }

        let api = self.api::<K>();
        let params = Self::post_params();
        let operation = format!("create {kind} {}/{name}", self.namespace);
        retry_api_call(|| api.create(&params, &object), &operation)
            .await
            .map_err(|e| StoreError::from_kube("create", &kind, &name, e))?;

        info!("Created {} {}/{}", kind, self.namespace, name);
        Ok(())
    }

    async fn update<K: StoredResource>(&self, resource: &K) -> Result<(), StoreError> {
        let name = resource_name(resource)?;
        let kind = kind_of::<K>();
        let api = self.api::<K>();
        let params = Self::post_params();
        let operation = format!("replace {kind} {}/{name}", self.namespace);

        let mut attempt = 0;
        loop {
            attempt += 1;

            let current: K = self.load(&name).await?;
            let mut desired = resource.clone();
            desired.meta_mut().resource_version = current.meta().resource_version.clone();
            if desired.meta().owner_references.is_none() {
                desired.meta_mut().owner_references = current.meta().owner_references.clone();
            }

            match retry_api_call(|| api.replace(&name, &params, &desired), &operation)
                .await
                .map_err(|e| StoreError::from_kube("update", &kind, &name, e))
            {
                Ok(_) => {
                    info!("Updated {} {}/{}", kind, self.namespace, name);
                    return Ok(());
                }
                Err(StoreError::Conflict { .. }) if attempt < MAX_CONFLICT_ATTEMPTS => {
                    warn!(
                        namespace = %self.namespace,
                        name = %name,
                        kind = %kind,
                        attempt = attempt,
                        "Conflict while updating resource, reloading"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn delete<K: StoredResource>(&self, name: &str) -> Result<(), StoreError> {
        let api = self.api::<K>();
        let kind = kind_of::<K>();
        let params = DeleteParams::background();
        let operation = format!("delete {kind} {}/{name}", self.namespace);

        retry_api_call(|| api.delete(name, &params), &operation)
            .await
            .map_err(|e| StoreError::from_kube("delete", &kind, name, e))?;

        info!("Deleted {} {}/{}", kind, self.namespace, name);
        Ok(())
    }

    async fn create_or_patch<K, F>(
        &self,
        seed: K,
        set_controller_owner: bool,
        mutate: F,
    ) -> Result<(), StoreError>
    where
        K: StoredResource,
        F: Fn(&mut K) -> Result<(), StoreError> + Send + Sync,
    {
        let name = resource_name(&seed)?;
        let kind = kind_of::<K>();

        let mut attempt = 0;
        loop {
            attempt += 1;

            let current = match self.load::<K>(&name).await {
                Ok(current) => Some(current),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            };

            let mut desired = current.clone().unwrap_or_else(|| seed.clone());
            mutate(&mut desired)?;

            let result = match &current {
                Some(current) => self.patch_changes(current, &desired).await.map(|_| ()),
                None => self.create(&desired, set_controller_owner).await,
            };

            match result {
                Err(e)
                    if (matches!(e, StoreError::Conflict { .. }) || e.is_already_exists())
                        && attempt < MAX_CONFLICT_ATTEMPTS =>
                {
                    warn!(
                        namespace = %self.namespace,
                        name = %name,
                        kind = %kind,
                        attempt = attempt,
                        error = %e,
                        "Resource changed while patching, reloading"
                    );
                }
                other => return other,
            }
        }
    }
}

/// Compute a JSON merge patch (RFC 7386) turning `current` into `desired`.
///
/// Objects are compared key by key, anything else is replaced wholesale. Keys
/// missing from `desired` are removed with `null`. Equal documents yield `{}`.
#[must_use]
pub fn merge_patch(current: &Value, desired: &Value) -> Value {
    match (current, desired) {
        (Value::Object(current), Value::Object(desired)) => {
            let mut patch = Map::new();
            for (key, value) in desired {
                match current.get(key) {
                    Some(existing) if existing == value => {}
                    Some(existing @ Value::Object(_)) if value.is_object() => {
                        patch.insert(key.clone(), merge_patch(existing, value));
                    }
                    _ => {
                        patch.insert(key.clone(), value.clone());
                    }
                }
            }
            for key in current.keys() {
                if !desired.contains_key(key) {
                    patch.insert(key.clone(), Value::Null);
                }
            }
            Value::Object(patch)
        }
        _ => desired.clone(),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
