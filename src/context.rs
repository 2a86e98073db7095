// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context passed to the controller.

use crate::config::OperatorConfig;
use crate::crd::Infinispan;
use crate::errors::ListenerError;
use crate::reconcilers::config_listener::image::{ImageResolver, PodImageSource};
use crate::reconcilers::store::KubeStore;
use kube::{Client, Resource, ResourceExt};

/// Shared context for the `Infinispan` controller.
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Operator configuration
    pub config: OperatorConfig,

    /// Resolves the listener image, built once from the configuration
    pub images: ImageResolver<PodImageSource>,
}

impl Context {
    #[must_use]
    pub fn new(client: Client, config: OperatorConfig) -> Self {
        let source = PodImageSource::new(
            client.clone(),
            config.pod_name.clone(),
            config.pod_namespace.clone(),
            config.operator_container.clone(),
        );
        let images = ImageResolver::new(config.image_override(), source);
        Self {
            client,
            config,
            images,
        }
    }

    /// Store scoped to the namespace of `parent`, owning what it creates through
    /// `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::MissingNamespace`] for a parent without namespace.
    pub fn store_for(&self, parent: &Infinispan) -> Result<KubeStore, ListenerError> {
        let namespace = parent
            .namespace()
            .ok_or_else(|| ListenerError::MissingNamespace {
                parent: parent.name_any(),
            })?;
        Ok(KubeStore::new(
            self.client.clone(),
            &namespace,
            parent.controller_owner_ref(&()),
        ))
    }
}
