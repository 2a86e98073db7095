// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resolution of the image the listener Deployment runs.
//!
//! Precedence: an explicit, non-empty override wins; otherwise the operator's
//! own running image is looked up. The result is resolved once per reconcile.

use crate::errors::ListenerError;
use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use tracing::debug;

/// Source of the operator's own image.
#[async_trait]
pub trait OperatorImageSource: Send + Sync {
    /// Image reference the operator itself runs.
    async fn operator_image(&self) -> anyhow::Result<String>;
}

/// Reads the operator image from the operator's own Pod.
///
/// The Pod name and namespace are normally injected through the downward API.
pub struct PodImageSource {
    client: Client,
    pod_name: Option<String>,
    pod_namespace: Option<String>,
    container: Option<String>,
}

impl PodImageSource {
    /// Look up `pod_name` in `pod_namespace`, reading the image of `container`,
    /// or of the first container when `container` is `None`.
    #[must_use]
    pub fn new(
        client: Client,
        pod_name: Option<String>,
        pod_namespace: Option<String>,
        container: Option<String>,
    ) -> Self {
        Self {
            client,
            pod_name,
            pod_namespace,
            container,
        }
    }
}

#[async_trait]
impl OperatorImageSource for PodImageSource {
    async fn operator_image(&self) -> anyhow::Result<String> {
        let pod_name = self
            .pod_name
            .as_deref()
            .ok_or_else(|| anyhow!("operator pod name is not configured (POD_NAME)"))?;
        let namespace = self
            .pod_namespace
            .clone()
            .unwrap_or_else(|| self.client.default_namespace().to_string());

        debug!(pod = %pod_name, namespace = %namespace, "Looking up operator image");
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &namespace);
        let pod = api
            .get(pod_name)
            .await
            .with_context(|| format!("failed to get operator pod {namespace}/{pod_name}"))?;

        container_image(&pod, self.container.as_deref())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("operator pod {namespace}/{pod_name} has no matching container image"))
    }
}

/// Image of the container called `container` in `pod`, or of the first
/// container when no name is given.
#[must_use]
pub fn container_image<'a>(pod: &'a Pod, container: Option<&str>) -> Option<&'a str> {
    let containers = &pod.spec.as_ref()?.containers;
    let found = match container {
        Some(name) => containers.iter().find(|c| c.name == name),
        None => containers.first(),
    };
    found?.image.as_deref()
}

/// Resolves the listener image from an override and an [`OperatorImageSource`].
pub struct ImageResolver<I> {
    image_override: Option<String>,
    source: I,
}

impl<I: OperatorImageSource> ImageResolver<I> {
    #[must_use]
    pub fn new(image_override: Option<String>, source: I) -> Self {
        Self {
            image_override,
            source,
        }
    }

    /// The environment lookup used when there is no override.
    #[must_use]
    pub fn source(&self) -> &I {
        &self.source
    }

    /// Resolve the listener image.
    ///
    /// A non-empty override is returned verbatim, without validation.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ImageResolution`] when there is no override and the
    /// operator image cannot be looked up.
    pub async fn resolve(&self) -> Result<String, ListenerError> {
        if let Some(image) = self.image_override.as_deref().filter(|i| !i.is_empty()) {
            return Ok(image.to_string());
        }

        self.source
            .operator_image()
            .await
            .map_err(|source| ListenerError::ImageResolution { source })
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod image_tests;
