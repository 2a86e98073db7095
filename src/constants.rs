// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the config listener operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the Infinispan CRDs (both `infinispans` and `caches`)
pub const API_GROUP: &str = "infinispan.org";

/// API version of the `Infinispan` CRD
pub const API_VERSION: &str = "v1";

/// Kind name for the `Infinispan` resource
pub const KIND_INFINISPAN: &str = "Infinispan";

/// API group of the Kubernetes RBAC resources
pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Kind name for `Role`, used in `RoleBinding.roleRef`
pub const KIND_ROLE: &str = "Role";

/// Kind name for `ServiceAccount`, used in `RoleBinding.subjects`
pub const KIND_SERVICE_ACCOUNT: &str = "ServiceAccount";

/// Field manager recorded on every write made by the operator
pub const FIELD_MANAGER: &str = "config-listener-operator";

// ============================================================================
// Config Listener Constants
// ============================================================================

/// Suffix appended to the `Infinispan` name to derive the bundle name
pub const CONFIG_LISTENER_NAME_SUFFIX: &str = "config-listener";

/// Name of the single worker container inside the listener Deployment
pub const LISTENER_CONTAINER: &str = "infinispan-listener";

/// Subcommand the worker binary runs. Together with the flags below this is a
/// stable contract with the listener process.
pub const LISTENER_COMMAND: &str = "listener";

/// Flag carrying the namespace of the watched cluster
pub const LISTENER_NAMESPACE_FLAG: &str = "-namespace";

/// Flag carrying the name of the watched cluster
pub const LISTENER_CLUSTER_FLAG: &str = "-cluster";

/// Replica count of a freshly created or healed listener Deployment
pub const DEFAULT_LISTENER_REPLICAS: i32 = 1;

/// Maximum number of load/mutate/write rounds when the API reports a conflict
pub const MAX_CONFLICT_ATTEMPTS: u32 = 5;

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration after a successful reconciliation (5 minutes)
pub const SUCCESS_REQUEUE_DURATION_SECS: u64 = 300;

/// Requeue duration after a transient error such as a conflict (5 seconds)
pub const TRANSIENT_ERROR_REQUEUE_DURATION_SECS: u64 = 5;

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
