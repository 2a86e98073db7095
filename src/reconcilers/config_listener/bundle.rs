// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired state of the config listener bundle.
//!
//! The bundle is four objects sharing one name and namespace: a `ServiceAccount`,
//! a `Role`, a `RoleBinding` attaching the role to the account, and the listener
//! `Deployment` running as that account.

use crate::constants::{
    API_GROUP, DEFAULT_LISTENER_REPLICAS, KIND_ROLE, KIND_SERVICE_ACCOUNT, LISTENER_CLUSTER_FLAG,
    LISTENER_COMMAND, LISTENER_CONTAINER, LISTENER_NAMESPACE_FLAG, RBAC_API_GROUP,
};
use crate::crd::Infinispan;
use crate::errors::ListenerError;
use crate::labels::{
    APP_CONFIG_LISTENER_POD, APP_LABEL, COMPONENT_CONFIG_LISTENER, K8S_COMPONENT, K8S_INSTANCE,
    K8S_MANAGED_BY, K8S_PART_OF, MANAGED_BY_OPERATOR, PART_OF_INFINISPAN,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec, ServiceAccount};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Identity shared by every object of one bundle.
///
/// Computed once from the parent so that all four objects, and every lookup made
/// while reconciling them, agree on name and namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleKey {
    name: String,
    namespace: String,
    cluster: String,
}

impl BundleKey {
    /// Derive the key of the bundle owned by `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::MissingNamespace`] when the parent is not namespaced.
    pub fn for_parent(parent: &Infinispan) -> Result<Self, ListenerError> {
        let namespace = parent
            .namespace()
            .ok_or_else(|| ListenerError::MissingNamespace {
                parent: parent.name_any(),
            })?;

        Ok(Self {
            name: parent.config_listener_name(),
            namespace,
            cluster: parent.name_any(),
        })
    }

    /// Shared name of the bundle objects.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace of the bundle objects (the parent's namespace).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the owning `Infinispan`.
    #[must_use]
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Metadata carried by every bundle object.
    #[must_use]
    pub fn object_meta(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name.clone()),
            namespace: Some(self.namespace.clone()),
            labels: Some(self.labels()),
            ..Default::default()
        }
    }

    fn labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(K8S_INSTANCE.into(), self.cluster.clone());
        labels.insert(K8S_COMPONENT.into(), COMPONENT_CONFIG_LISTENER.into());
        labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_OPERATOR.into());
        labels.insert(K8S_PART_OF.into(), PART_OF_INFINISPAN.into());
        labels
    }
}

/// The four objects of a config listener bundle, in creation order.
#[derive(Clone, Debug)]
pub struct ConfigListenerBundle {
    pub service_account: ServiceAccount,
    pub role: Role,
    pub role_binding: RoleBinding,
    pub deployment: Deployment,
}

impl ConfigListenerBundle {
    /// Build the desired bundle for `parent`, running `image`.
    #[must_use]
    pub fn build(key: &BundleKey, parent: &Infinispan, image: &str) -> Self {
        Self {
            service_account: build_service_account(key),
            role: build_role(key),
            role_binding: build_role_binding(key),
            deployment: build_deployment(key, parent, image),
        }
    }
}

/// Build the `ServiceAccount` the listener authenticates as.
#[must_use]
pub fn build_service_account(key: &BundleKey) -> ServiceAccount {
    ServiceAccount {
        metadata: key.object_meta(),
        ..Default::default()
    }
}

/// Build the `Role` granting the listener its API permissions.
///
/// The rules are fixed: they do not depend on the parent.
#[must_use]
pub fn build_role(key: &BundleKey) -> Role {
    Role {
        metadata: key.object_meta(),
        rules: Some(vec![
            policy_rule(
                API_GROUP,
                "caches",
                &["create", "delete", "get", "list", "patch", "update", "watch"],
            ),
            policy_rule(API_GROUP, "infinispans", &["get"]),
            policy_rule("", "pods", &["list"]),
            policy_rule("", "pods/exec", &["create"]),
            policy_rule("", "secrets", &["get"]),
        ]),
    }
}

fn policy_rule(api_group: &str, resource: &str, verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![api_group.to_string()]),
        resources: Some(vec![resource.to_string()]),
        verbs: verbs.iter().map(ToString::to_string).collect(),
        ..Default::default()
    }
}

/// Build the `RoleBinding` attaching the role to the listener's account.
#[must_use]
pub fn build_role_binding(key: &BundleKey) -> RoleBinding {
    RoleBinding {
        metadata: key.object_meta(),
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.into(),
            kind: KIND_ROLE.into(),
            name: key.name().into(),
        },
        subjects: Some(vec![Subject {
            kind: KIND_SERVICE_ACCOUNT.into(),
            name: key.name().into(),
            namespace: Some(key.namespace().into()),
            ..Default::default()
        }]),
    }
}

/// Build the listener `Deployment`.
///
/// Pods carry the parent's pod labels with `app` replaced by the listener
/// discriminator, and the selector matches exactly those labels. The container
/// arguments are a stable contract with the listener binary.
#[must_use]
pub fn build_deployment(key: &BundleKey, parent: &Infinispan, image: &str) -> Deployment {
    let mut pod_labels = parent.pod_labels();
    pod_labels.insert(APP_LABEL.into(), APP_CONFIG_LISTENER_POD.into());

    Deployment {
        metadata: key.object_meta(),
        spec: Some(DeploymentSpec {
            replicas: Some(DEFAULT_LISTENER_REPLICAS),
            selector: LabelSelector {
                match_labels: Some(pod_labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: LISTENER_CONTAINER.into(),
                        image: Some(image.into()),
                        args: Some(listener_args(key)),
                        ..Default::default()
                    }],
                    service_account_name: Some(key.name().into()),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Positional arguments of the listener process.
#[must_use]
pub fn listener_args(key: &BundleKey) -> Vec<String> {
    vec![
        LISTENER_COMMAND.into(),
        LISTENER_NAMESPACE_FLAG.into(),
        key.namespace().into(),
        LISTENER_CLUSTER_FLAG.into(),
        key.cluster().into(),
    ]
}

/// Image of the listener container in `deployment`, if the container exists.
#[must_use]
pub fn listener_image(deployment: &Deployment) -> Option<&str> {
    deployment
        .spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .containers
        .iter()
        .find(|container| container.name == LISTENER_CONTAINER)?
        .image
        .as_deref()
}

/// Replica count requested by `deployment`, if set.
#[must_use]
pub fn deployment_replicas(deployment: &Deployment) -> Option<i32> {
    deployment.spec.as_ref()?.replicas
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod bundle_tests;
