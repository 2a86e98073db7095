// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration.
//!
//! Every setting can be given as a command line flag or through the environment.
//! The pod name and namespace are normally injected with the downward API so the
//! operator can find its own image.

use crate::constants::METRICS_SERVER_PORT;
use clap::{Parser, ValueEnum};

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Runtime configuration of the config listener operator.
#[derive(Clone, Debug, Parser)]
#[command(name = "config-listener-operator", version, about, long_about = None)]
pub struct OperatorConfig {
    /// Image for the listener Deployment. Defaults to the operator's own image.
    #[arg(long, env = "CONFIG_LISTENER_IMAGE")]
    pub listener_image: Option<String>,

    /// Name of the operator pod, used to look up the operator image
    #[arg(long, env = "POD_NAME")]
    pub pod_name: Option<String>,

    /// Namespace of the operator pod. Defaults to the client's namespace.
    #[arg(long, env = "POD_NAMESPACE")]
    pub pod_namespace: Option<String>,

    /// Container of the operator pod whose image is reused. Defaults to the first.
    #[arg(long, env = "OPERATOR_CONTAINER")]
    pub operator_container: Option<String>,

    /// Only watch `Infinispan` resources in this namespace
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Port of the Prometheus metrics endpoint
    #[arg(long, env = "METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,

    /// Log output format
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, ignore_case = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl OperatorConfig {
    /// Non-empty listener image override, if any.
    #[must_use]
    pub fn image_override(&self) -> Option<String> {
        self.listener_image
            .as_deref()
            .filter(|image| !image.is_empty())
            .map(str::to_string)
    }

    /// Namespace to watch; `None` watches every namespace.
    #[must_use]
    pub fn watch_namespace(&self) -> Option<&str> {
        self.watch_namespace
            .as_deref()
            .filter(|namespace| !namespace.is_empty())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
