// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants used across all reconcilers.
//!
//! This module defines standard Kubernetes labels and the Infinispan-specific labels
//! to ensure consistency across all resources created by the controller.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for a unique name identifying the instance of an application
pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Kubernetes Standard Label Values
// ============================================================================

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_INFINISPAN: &str = "infinispan";

/// Component value for the config listener bundle
pub const COMPONENT_CONFIG_LISTENER: &str = "config-listener";

/// Value for `app.kubernetes.io/managed-by`
pub const MANAGED_BY_OPERATOR: &str = "config-listener-operator";

// ============================================================================
// Infinispan Pod Labels
// ============================================================================

/// Label identifying the kind of pod
pub const APP_LABEL: &str = "app";

/// Label carrying the `Infinispan` cluster name
pub const CLUSTER_NAME_LABEL: &str = "clusterName";

/// Label carrying the owning `Infinispan` resource name
pub const INFINISPAN_CR_LABEL: &str = "infinispan_cr";

/// `app` value on Infinispan server pods
pub const APP_INFINISPAN_POD: &str = "infinispan-pod";

/// `app` value on config listener pods, overriding [`APP_INFINISPAN_POD`]
pub const APP_CONFIG_LISTENER_POD: &str = "infinispan-config-listener-pod";
