// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration from command-line flags and environment variables.

use crate::constants::{
    DEFAULT_METRICS_ADDR, DEFAULT_OPERAND_NAMESPACE, DEFAULT_OPERATOR_NAMESPACE,
    ERROR_REQUEUE_DURATION_SECS,
};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Runtime configuration of the ingress operator.
#[derive(Parser, Debug, Clone)]
#[command(name = "ingress-operator")]
#[command(about = "Reconciles IngressController resources into router deployments")]
pub struct OperatorConfig {
    /// Namespace holding `IngressController` and `DNSRecord` resources
    #[arg(long = "namespace", env = "WATCH_NAMESPACE", default_value = DEFAULT_OPERATOR_NAMESPACE)]
    pub namespace: String,

    /// Namespace the router deployments and services are created in
    #[arg(long, env = "OPERAND_NAMESPACE", default_value = DEFAULT_OPERAND_NAMESPACE)]
    pub operand_namespace: String,

    /// Router image deployed for every `IngressController`
    #[arg(long, env = "IMAGE")]
    pub ingress_controller_image: String,

    /// Listen address of the `/metrics` endpoint
    #[arg(long, env = "METRICS_ADDR", default_value = DEFAULT_METRICS_ADDR)]
    pub metrics_addr: SocketAddr,

    /// Seconds to wait before retrying a failed reconciliation
    #[arg(long, default_value_t = ERROR_REQUEUE_DURATION_SECS)]
    pub error_requeue_secs: u64,
}

impl OperatorConfig {
    /// Configuration with default namespaces and the given router image.
    #[must_use]
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            namespace: DEFAULT_OPERATOR_NAMESPACE.to_string(),
            operand_namespace: DEFAULT_OPERAND_NAMESPACE.to_string(),
            ingress_controller_image: image.into(),
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 60000)),
            error_requeue_secs: ERROR_REQUEUE_DURATION_SECS,
        }
    }

    #[must_use]
    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
