// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the config listener reconciler.
//!
//! This module provides:
//! - [`StoreError`] - failures reported by a [`ResourceStore`](crate::reconcilers::store::ResourceStore)
//! - [`ListenerError`] - failures of a reconcile, scale or teardown invocation
//!
//! Both types declare whether a failure is transient (worth a quick requeue) or
//! terminal for the current invocation. Retrying is always left to the caller.

use crate::reconcilers::retry::is_retryable_error;
use thiserror::Error;

/// Errors reported by the resource store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The object does not exist (HTTP 404).
    ///
    /// Treated as success during teardown, and used by the scale operation to
    /// abort without creating anything.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Kind of the missing object
        kind: String,
        /// Name of the missing object
        name: String,
    },

    /// Creation failed because an object with the same name exists (HTTP 409).
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// Kind of the existing object
        kind: String,
        /// Name of the existing object
        name: String,
    },

    /// The object changed since it was read (HTTP 409 `Conflict`).
    #[error("{kind} '{name}' was modified concurrently")]
    Conflict {
        /// Kind of the contended object
        kind: String,
        /// Name of the contended object
        name: String,
    },

    /// Any other failure of a store operation.
    #[error("failed to {verb} {kind} '{name}': {source}")]
    Api {
        /// Operation that failed (`get`, `create`, `update`, `delete`, `patch`)
        verb: &'static str,
        /// Kind of the object
        kind: String,
        /// Name of the object
        name: String,
        /// Underlying error, usually a [`kube::Error`]
        #[source]
        source: anyhow::Error,
    },

    /// The object handed to the store has no `metadata.name`.
    #[error("{kind} has no name in its metadata")]
    MissingName {
        /// Kind of the unnamed object
        kind: String,
    },

    /// The object could not be converted to or from JSON.
    #[error("failed to serialize object: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Build a [`StoreError`] from a Kubernetes API error, keeping 404 and 409
    /// distinguishable from other failures.
    #[must_use]
    pub fn from_kube(verb: &'static str, kind: &str, name: &str, err: kube::Error) -> Self {
        if let kube::Error::Api(response) = &err {
            match (response.code, response.reason.as_str()) {
                (404, _) => {
                    return Self::NotFound {
                        kind: kind.to_string(),
                        name: name.to_string(),
                    }
                }
                (409, "AlreadyExists") => {
                    return Self::AlreadyExists {
                        kind: kind.to_string(),
                        name: name.to_string(),
                    }
                }
                (409, _) => {
                    return Self::Conflict {
                        kind: kind.to_string(),
                        name: name.to_string(),
                    }
                }
                _ => {}
            }
        }
        Self::Api {
            verb,
            kind: kind.to_string(),
            name: name.to_string(),
            source: err.into(),
        }
    }

    /// Returns `true` for a missing object.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for a name collision on create.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns `true` for failures expected to clear on their own: conflicts,
    /// rate limiting, server errors and transport errors.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Api { source, .. } => source
                .downcast_ref::<kube::Error>()
                .is_some_and(is_retryable_error),
            _ => false,
        }
    }
}

/// Errors returned by the config listener operations.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// Neither an image override nor the operator's own image is available.
    ///
    /// Nothing is mutated when this happens.
    #[error("unable to resolve the config listener image: {source}")]
    ImageResolution {
        /// Why the lookup failed
        #[source]
        source: anyhow::Error,
    },

    /// The parent resource has no namespace, so no bundle can be derived.
    #[error("Infinispan '{parent}' has no namespace")]
    MissingNamespace {
        /// Name of the parent resource
        parent: String,
    },

    /// A negative replica count was requested.
    #[error("replica count must not be negative, got {replicas}")]
    InvalidReplicas {
        /// The rejected replica count
        replicas: i32,
    },

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ListenerError {
    /// Returns `true` when the failure is a missing object.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_not_found())
    }

    /// Returns `true` when the failure is expected to clear on its own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_transient())
    }

    /// Short category name used for metrics labels.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::ImageResolution { .. } => "image_resolution",
            Self::MissingNamespace { .. } | Self::InvalidReplicas { .. } => "invalid_input",
            Self::Store(StoreError::NotFound { .. }) => "not_found",
            Self::Store(err) if err.is_transient() => "transient",
            Self::Store(_) => "store",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
