// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition types and reasons for `IngressController` resources.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   domain: apps.example.com
//!   conditions:
//!     - type: Admitted
//!       status: "True"
//!       reason: Valid
//!     - type: Available
//!       status: "True"
//!       reason: DeploymentAvailable
//!       message: "2/2 router replicas are available"
//!     - type: LoadBalancerReady
//!       status: "False"
//!       reason: SyncLoadBalancerFailed
//!       message: "quota exceeded for load balancers"
//! ```

// ============================================================================
// Condition Status Values
// ============================================================================

/// Condition holds.
pub const STATUS_TRUE: &str = "True";

/// Condition does not hold.
pub const STATUS_FALSE: &str = "False";

// ============================================================================
// Condition Types
// ============================================================================

/// The record passed defaulting and validation.
pub const CONDITION_TYPE_ADMITTED: &str = "Admitted";

/// The router deployment has available replicas.
pub const CONDITION_TYPE_AVAILABLE: &str = "Available";

/// The publishing strategy calls for a managed load balancer.
pub const CONDITION_TYPE_LOAD_BALANCER_MANAGED: &str = "LoadBalancerManaged";

/// The managed load balancer has been provisioned.
pub const CONDITION_TYPE_LOAD_BALANCER_READY: &str = "LoadBalancerReady";

/// The operator manages a wildcard DNS record for the domain.
pub const CONDITION_TYPE_DNS_MANAGED: &str = "DNSManaged";

/// The wildcard DNS record is published in every zone.
pub const CONDITION_TYPE_DNS_READY: &str = "DNSReady";

/// One or more of the other conditions report a failure.
pub const CONDITION_TYPE_DEGRADED: &str = "Degraded";

/// Condition type reported on `DNSRecord` zone status when publishing failed.
pub const DNS_ZONE_CONDITION_FAILED: &str = "Failed";

// ============================================================================
// Admission Reasons
// ============================================================================

/// Defaulting and validation succeeded.
pub const REASON_VALID: &str = "Valid";

/// Validation rejected the record.
pub const REASON_INVALID: &str = "Invalid";

// ============================================================================
// Deployment Reasons
// ============================================================================

/// At least one router replica is available.
pub const REASON_DEPLOYMENT_AVAILABLE: &str = "DeploymentAvailable";

/// The router deployment exists but has no available replicas.
pub const REASON_DEPLOYMENT_UNAVAILABLE: &str = "DeploymentUnavailable";

/// The router deployment could not be found.
pub const REASON_DEPLOYMENT_NOT_FOUND: &str = "DeploymentNotFound";

// ============================================================================
// Load Balancer Reasons
// ============================================================================

/// The publishing strategy wants a load balancer.
pub const REASON_WANTED_BY_STRATEGY: &str = "WantedByEndpointPublishingStrategy";

/// The publishing strategy does not use a load balancer.
pub const REASON_STRATEGY_EXCLUDES_LB: &str = "EndpointPublishingStrategyExcludesManagedLoadBalancer";

/// The load balancer service has an ingress point.
pub const REASON_LB_PROVISIONED: &str = "LoadBalancerProvisioned";

/// The load balancer service has no ingress point yet.
pub const REASON_LB_PENDING: &str = "LoadBalancerPending";

/// The load balancer service does not exist.
pub const REASON_SERVICE_NOT_FOUND: &str = "ServiceNotFound";

/// Event reason emitted by the cloud provider when it fails to sync a load balancer.
///
/// Used both to match operand events and as the condition reason.
pub const REASON_SYNC_LB_FAILED: &str = "SyncLoadBalancerFailed";

// ============================================================================
// DNS Reasons
// ============================================================================

/// DNS is managed normally.
pub const REASON_DNS_NORMAL: &str = "Normal";

/// The publishing strategy has no DNS record to manage.
pub const REASON_UNSUPPORTED_STRATEGY: &str = "UnsupportedEndpointPublishingStrategy";

/// The cluster DNS configuration defines no zones.
pub const REASON_NO_DNS_ZONES: &str = "NoDNSZones";

/// The wildcard `DNSRecord` does not exist.
pub const REASON_RECORD_NOT_FOUND: &str = "RecordNotFound";

/// Publishing failed in one or more zones.
pub const REASON_FAILED_ZONES: &str = "FailedZones";

/// Publishing succeeded in every zone.
pub const REASON_NO_FAILED_ZONES: &str = "NoFailedZones";

// ============================================================================
// Degraded Reasons
// ============================================================================

/// One or more conditions report a failure.
pub const REASON_DEGRADED_CONDITIONS: &str = "DegradedConditions";

/// Nothing is failing.
pub const REASON_AS_EXPECTED: &str = "AsExpected";

// ============================================================================
// Event Reasons
// ============================================================================

/// Event emitted when admission rejects a record.
pub const EVENT_REASON_REJECTED: &str = "Rejected";

/// Event emitted when admission accepts a record.
pub const EVENT_REASON_ADMITTED: &str = "Admitted";
