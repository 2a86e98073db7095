// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for the config listener bundle.
//!
//! # Available Operations
//!
//! - [`reconcile_config_listener`] - Converges the bundle of one `Infinispan`
//! - [`scale_config_listener`] - Sets the replica count of the listener Deployment
//! - [`remove_config_listener`] - Deletes the bundle
//!
//! All operations talk to the cluster through a [`ResourceStore`], so they can be
//! exercised against an in-memory store in tests.
//!
//! # Example: Using a Reconciler
//!
//! ```rust,no_run
//! use config_listener::crd::Infinispan;
//! use config_listener::reconcilers::config_listener::image::{ImageResolver, PodImageSource};
//! use config_listener::reconcilers::{reconcile_config_listener, KubeStore};
//! use kube::{Client, Resource};
//!
//! async fn reconcile(client: Client, parent: Infinispan) -> anyhow::Result<()> {
//!     let store = KubeStore::new(client.clone(), "caches", parent.controller_owner_ref(&()));
//!     let images = ImageResolver::new(None, PodImageSource::new(client, None, None, None));
//!
//!     let action = reconcile_config_listener(&parent, &store, &images).await?;
//!     println!("config listener {}", action.as_str());
//!     Ok(())
//! }
//! ```

pub mod config_listener;
pub mod retry;
pub mod store;

#[cfg(test)]
pub(crate) mod mock_store;

pub use config_listener::{
    reconcile_config_listener, remove_config_listener, scale_config_listener, ListenerAction,
};
pub use store::{KubeStore, ResourceStore};
