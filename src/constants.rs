// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the ingress operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// Fully qualified API version of the `IngressController` resource
pub const OPERATOR_API_GROUP_VERSION: &str = "operator.openshift.io/v1";

/// Kind name for `IngressController` resource
pub const KIND_INGRESS_CONTROLLER: &str = "IngressController";

/// Kind name for the apps/v1 `Deployment` that runs the router
pub const KIND_DEPLOYMENT: &str = "Deployment";

/// API version for `Deployment`
pub const APPS_API_GROUP_VERSION: &str = "apps/v1";

/// Name of the cluster-scoped configuration singletons (`DNS`, `Infrastructure`, `Ingress`)
pub const CLUSTER_CONFIG_NAME: &str = "cluster";

// ============================================================================
// Namespaces
// ============================================================================

/// Default namespace holding `IngressController` and `DNSRecord` resources
pub const DEFAULT_OPERATOR_NAMESPACE: &str = "openshift-ingress-operator";

/// Default namespace holding the router deployments and their services
pub const DEFAULT_OPERAND_NAMESPACE: &str = "openshift-ingress";

// ============================================================================
// Router Defaults
// ============================================================================

/// Default router replica count when `spec.replicas` is unset
pub const DEFAULT_ROUTER_REPLICAS: i32 = 2;

/// HTTP port served by the router
pub const ROUTER_HTTP_PORT: i32 = 80;

/// HTTPS port served by the router
pub const ROUTER_HTTPS_PORT: i32 = 443;

/// Port exposing router metrics and health checks
pub const ROUTER_METRICS_PORT: i32 = 1936;

/// Upper bound on pods the disruption budget allows to be unavailable
pub const ROUTER_MAX_UNAVAILABLE: &str = "50%";

/// TTL in seconds of the wildcard DNS record
pub const WILDCARD_RECORD_TTL_SECS: i64 = 30;

/// Service account used by router pods
pub const ROUTER_SERVICE_ACCOUNT: &str = "router";

/// Container name of the router in the operand deployment
pub const ROUTER_CONTAINER_NAME: &str = "router";

/// Container name of the rsyslog sidecar
pub const SYSLOG_CONTAINER_NAME: &str = "logs";

// ============================================================================
// Controller Timing
// ============================================================================

/// Requeue interval after a failed reconciliation (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Default listen address for the metrics endpoint
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:60000";

/// Field manager name used for API writes
pub const FIELD_MANAGER: &str = "ingress-operator";

/// Name reported as the event source
pub const CONTROLLER_NAME: &str = "ingress_controller";
