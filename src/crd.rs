// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) consumed by the operator.
//!
//! The operator does not own the `Infinispan` resource; it reads it to decide
//! whether the config listener bundle should exist and how it is named.
//!
//! # Example
//!
//! ```rust,no_run
//! use config_listener::crd::{ConfigListenerSpec, Infinispan, InfinispanSpec};
//!
//! let cluster = Infinispan::new(
//!     "example",
//!     InfinispanSpec {
//!         replicas: 3,
//!         image: None,
//!         config_listener: Some(ConfigListenerSpec { enabled: true }),
//!     },
//! );
//! assert_eq!(cluster.config_listener_name(), "example-config-listener");
//! ```

use crate::constants::CONFIG_LISTENER_NAME_SUFFIX;
use crate::labels::{
    APP_INFINISPAN_POD, APP_LABEL, CLUSTER_NAME_LABEL, INFINISPAN_CR_LABEL,
};
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `Infinispan` describes a clustered Infinispan deployment.
///
/// Only the fields the config listener depends on are modelled here.
///
/// # Example
///
/// ```yaml
/// apiVersion: infinispan.org/v1
/// kind: Infinispan
/// metadata:
///   name: example
///   namespace: caches
/// spec:
///   replicas: 3
///   configListener:
///     enabled: true
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "infinispan.org",
    version = "v1",
    kind = "Infinispan",
    namespaced,
    shortname = "ispn",
    doc = "Infinispan represents a clustered Infinispan service. When the config listener is enabled the operator runs a listener Deployment alongside it."
)]
#[serde(rename_all = "camelCase")]
pub struct InfinispanSpec {
    /// Number of Infinispan server pods.
    ///
    /// When this drops to zero the listener Deployment is scaled down as well.
    #[schemars(range(min = 0))]
    pub replicas: i32,

    /// Container image of the Infinispan server.
    ///
    /// Owned by the Infinispan operator and kept so stored objects round-trip;
    /// the listener image is resolved independently of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Config listener settings. The listener is disabled when this is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_listener: Option<ConfigListenerSpec>,
}

/// Settings of the config listener that mirrors server-side cache changes into
/// `Cache` resources.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigListenerSpec {
    /// Whether the listener bundle should exist.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Infinispan {
    /// Returns `true` when the config listener bundle should be present.
    #[must_use]
    pub fn is_config_listener_enabled(&self) -> bool {
        self.spec
            .config_listener
            .as_ref()
            .is_some_and(|listener| listener.enabled)
    }

    /// Name shared by every object of the config listener bundle.
    #[must_use]
    pub fn config_listener_name(&self) -> String {
        format!("{}-{CONFIG_LISTENER_NAME_SUFFIX}", self.name_any())
    }

    /// Labels stamped on the Infinispan server pods.
    #[must_use]
    pub fn pod_labels(&self) -> BTreeMap<String, String> {
        let name = self.name_any();
        let mut labels = BTreeMap::new();
        labels.insert(APP_LABEL.into(), APP_INFINISPAN_POD.into());
        labels.insert(CLUSTER_NAME_LABEL.into(), name.clone());
        labels.insert(INFINISPAN_CR_LABEL.into(), name);
        labels
    }
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
