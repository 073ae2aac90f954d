// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions used by the ingress operator.
//!
//! # Resource Types
//!
//! ## Owned by this operator
//!
//! - [`IngressController`] - Desired state of one router deployment and its publishing
//! - [`DNSRecord`] - Wildcard DNS record published by a separate DNS controller
//!
//! ## Read-only cluster configuration
//!
//! - [`DnsConfig`] - Cluster DNS zones (`dns.config.openshift.io/cluster`)
//! - [`Infrastructure`] - Cloud platform metadata (`infrastructure.config.openshift.io/cluster`)
//! - [`IngressConfig`] - Cluster-wide default domain (`ingress.config.openshift.io/cluster`)
//!
//! ## Foreign types written by this operator
//!
//! - [`ServiceMonitor`] - Prometheus operator scrape configuration for router metrics
//!
//! # Example: Creating an IngressController
//!
//! ```rust,no_run
//! use ingress_operator::crd::{
//!     EndpointPublishingStrategy, EndpointPublishingStrategyType, IngressControllerSpec,
//! };
//!
//! let spec = IngressControllerSpec {
//!     domain: Some("apps.example.com".to_string()),
//!     endpoint_publishing_strategy: Some(EndpointPublishingStrategy {
//!         r#type: EndpointPublishingStrategyType::HostNetwork,
//!         load_balancer: None,
//!     }),
//!     replicas: Some(2),
//!     logging: None,
//! };
//! ```

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (Admitted, Available, `LoadBalancerReady`, ...).
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

// ============================================================================
// IngressController
// ============================================================================

/// How the router is exposed outside the cluster.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum EndpointPublishingStrategyType {
    /// A cloud load balancer in front of a `LoadBalancer` service.
    LoadBalancerService,
    /// Router pods bind ports 80/443 on the node network.
    HostNetwork,
    /// Router is only reachable from inside the cluster network.
    Private,
}

/// Reachability of a managed load balancer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum LoadBalancerScope {
    /// Publicly reachable load balancer.
    #[default]
    External,
    /// Load balancer reachable only from the cloud network.
    Internal,
}

/// Parameters of the `LoadBalancerService` strategy.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerStrategy {
    /// Whether the load balancer is external or internal.
    pub scope: LoadBalancerScope,
}

/// Endpoint publishing strategy of an `IngressController`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointPublishingStrategy {
    /// Strategy type.
    pub r#type: EndpointPublishingStrategyType,

    /// Load balancer parameters. Only meaningful for `LoadBalancerService`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancerStrategy>,
}

impl EndpointPublishingStrategy {
    /// Returns `true` when the strategy asks for a managed load balancer.
    #[must_use]
    pub fn wants_load_balancer(&self) -> bool {
        self.r#type == EndpointPublishingStrategyType::LoadBalancerService
    }
}

/// Where router access logs are sent.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum LoggingDestinationType {
    /// An rsyslog sidecar container that writes logs to its stdout.
    Container,
    /// An external syslog endpoint.
    Syslog,
}

/// Parameters for the `Syslog` logging destination.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyslogDestination {
    /// IP address of the syslog endpoint.
    pub address: String,

    /// UDP port of the syslog endpoint.
    pub port: u32,

    /// Syslog facility, defaults to `local1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
}

/// Access log destination.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingDestination {
    /// Destination type.
    pub r#type: LoggingDestinationType,

    /// Syslog parameters, required when `type` is `Syslog`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog: Option<SyslogDestination>,
}

/// Access logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogging {
    /// Where access logs go.
    pub destination: LoggingDestination,

    /// Optional HAProxy log format string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_log_format: Option<String>,
}

/// Router logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct IngressControllerLogging {
    /// Access logging. Disabled when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessLogging>,
}

/// `IngressController` describes a managed router deployment.
///
/// # Example
///
/// ```yaml
/// apiVersion: operator.openshift.io/v1
/// kind: IngressController
/// metadata:
///   name: default
///   namespace: openshift-ingress-operator
/// spec:
///   domain: apps.example.com
///   replicas: 2
///   endpointPublishingStrategy:
///     type: LoadBalancerService
///     loadBalancer:
///       scope: Internal
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "operator.openshift.io",
    version = "v1",
    kind = "IngressController",
    namespaced,
    doc = "IngressController describes a managed ingress router. The operator defaults and validates it, then deploys and publishes a router for its domain."
)]
#[kube(status = "IngressControllerStatus")]
#[serde(rename_all = "camelCase")]
pub struct IngressControllerSpec {
    /// DNS domain served by this controller. Defaults to the cluster ingress domain.
    ///
    /// Cannot be changed once admitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// How the router is published. Defaults from the cloud platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_publishing_strategy: Option<EndpointPublishingStrategy>,

    /// Desired number of router replicas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0))]
    pub replicas: Option<i32>,

    /// Router logging configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<IngressControllerLogging>,
}

/// `IngressController` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressControllerStatus {
    /// Effective domain. Set once at admission and never changed afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Effective publishing strategy. Set once at admission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_publishing_strategy: Option<EndpointPublishingStrategy>,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Number of router replicas currently available.
    #[serde(default)]
    pub available_replicas: i32,

    /// Label selector of the router pods, in string form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

// ============================================================================
// DNSRecord
// ============================================================================

/// Type of a published DNS record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum DNSRecordType {
    /// Alias to a load balancer hostname.
    CNAME,
    /// Address of a load balancer IP.
    A,
}

/// A hosted DNS zone, identified by provider ID or by tags.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DNSZone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// `DNSRecord` asks the DNS controller to publish one record in every cluster zone.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "ingress.operator.openshift.io",
    version = "v1",
    kind = "DNSRecord",
    namespaced,
    doc = "DNSRecord is a DNS record published into the cluster's hosted zones by the DNS controller."
)]
#[kube(status = "DNSRecordStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSRecordSpec {
    /// Fully qualified record name, ending with a dot.
    pub dns_name: String,

    /// Record targets (hostnames for CNAME, addresses for A).
    pub targets: Vec<String>,

    /// Record type.
    pub record_type: DNSRecordType,

    /// Record TTL in seconds.
    #[serde(rename = "recordTTL")]
    pub record_ttl: i64,
}

/// Publishing state of a `DNSRecord` in one zone.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DNSZoneStatus {
    pub dns_zone: DNSZone,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// `DNSRecord` status
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DNSRecordStatus {
    #[serde(default)]
    pub zones: Vec<DNSZoneStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

// ============================================================================
// Cluster configuration (config.openshift.io/v1)
// ============================================================================

/// Cluster DNS configuration.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "DNS",
    root = "DnsConfig",
    doc = "DNS holds cluster-wide DNS configuration."
)]
#[serde(rename_all = "camelCase")]
pub struct DnsConfigSpec {
    /// Base domain of the cluster.
    #[serde(default)]
    pub base_domain: String,

    /// Zone where public records are published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_zone: Option<DNSZone>,

    /// Zone where private records are published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_zone: Option<DNSZone>,
}

impl DnsConfig {
    /// Returns `true` when the cluster has at least one zone to publish records into.
    #[must_use]
    pub fn has_zones(&self) -> bool {
        self.spec.public_zone.is_some() || self.spec.private_zone.is_some()
    }
}

/// Infrastructure platform the cluster runs on.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum PlatformType {
    AWS,
    Azure,
    GCP,
    Libvirt,
    OpenStack,
    VSphere,
    BareMetal,
    None,
    /// Any platform this operator does not know about.
    #[serde(other)]
    Unknown,
}

/// Infrastructure spec; the operator only reads the status.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "Infrastructure",
    doc = "Infrastructure holds cluster-wide platform information."
)]
#[kube(status = "InfrastructureStatus")]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureSpec {}

/// Infrastructure status
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformType>,
}

impl Infrastructure {
    /// Platform reported in status, if any.
    #[must_use]
    pub fn platform(&self) -> Option<PlatformType> {
        self.status.as_ref().and_then(|s| s.platform)
    }
}

/// Cluster-wide ingress configuration.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "Ingress",
    root = "IngressConfig",
    doc = "Ingress holds cluster-wide ingress configuration."
)]
#[serde(rename_all = "camelCase")]
pub struct IngressConfigSpec {
    /// Default domain for ingress controllers that do not request one.
    #[serde(default)]
    pub domain: String,
}

// ============================================================================
// ServiceMonitor (monitoring.coreos.com/v1)
// ============================================================================

/// TLS settings for a scrape endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EndpointTlsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
}

/// One scrape endpoint of a `ServiceMonitor`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonitorEndpoint {
    pub port: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_config: Option<EndpointTlsConfig>,
}

/// Namespaces a `ServiceMonitor` selects services from.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSelector {
    #[serde(default)]
    pub match_names: Vec<String>,
}

/// Prometheus operator `ServiceMonitor` used to scrape router metrics.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "monitoring.coreos.com",
    version = "v1",
    kind = "ServiceMonitor",
    namespaced,
    doc = "ServiceMonitor declares a set of services to be scraped by Prometheus."
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMonitorSpec {
    pub selector: LabelSelector,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<NamespaceSelector>,

    pub endpoints: Vec<MonitorEndpoint>,
}
