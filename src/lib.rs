// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Config Listener Operator
//!
//! Kubernetes operator that runs the Infinispan config listener next to every
//! `Infinispan` cluster that enables it.
//!
//! ## Overview
//!
//! For each enabled cluster the operator keeps a bundle of four namespaced
//! objects sharing the name `<cluster>-config-listener`:
//!
//! - a `ServiceAccount` the listener runs as
//! - a `Role` with the permissions the listener needs
//! - a `RoleBinding` attaching the role to the account
//! - a `Deployment` running the listener process
//!
//! Disabling the listener deletes the bundle. Scaling the cluster to zero scales
//! the listener to zero.
//!
//! ## Modules
//!
//! - [`crd`] - The `Infinispan` resource the operator reads
//! - [`reconcilers`] - Reconcile, scale and teardown of the bundle
//! - [`controller`] - The kube-runtime controller loop
//! - [`config`] - Command line and environment configuration
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
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
//! assert!(cluster.is_config_listener_enabled());
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod crd;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
