// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status aggregation for `IngressController` resources.
//!
//! The status is computed from independent observations of the router
//! deployment, the load balancer service, operand events, the wildcard
//! `DNSRecord` and the cluster DNS configuration. Computation is pure; the
//! only fallible step is writing the status subresource, which is skipped when
//! nothing changed.

use crate::client::ClusterClient;
use crate::crd::{DNSRecord, DNSZone, DnsConfig, IngressController};
use crate::ingress_resources::{load_balancer_target, pod_selector_string, wants_load_balancer};
use crate::reconcilers::status::{find_condition, IngressControllerStatusUpdater};
use crate::status_reasons::{
    CONDITION_TYPE_AVAILABLE, CONDITION_TYPE_DEGRADED, CONDITION_TYPE_DNS_MANAGED,
    CONDITION_TYPE_DNS_READY, CONDITION_TYPE_LOAD_BALANCER_MANAGED,
    CONDITION_TYPE_LOAD_BALANCER_READY, DNS_ZONE_CONDITION_FAILED, REASON_AS_EXPECTED,
    REASON_DEGRADED_CONDITIONS, REASON_DEPLOYMENT_AVAILABLE, REASON_DEPLOYMENT_NOT_FOUND,
    REASON_DEPLOYMENT_UNAVAILABLE, REASON_DNS_NORMAL, REASON_FAILED_ZONES, REASON_LB_PENDING,
    REASON_LB_PROVISIONED, REASON_NO_DNS_ZONES, REASON_NO_FAILED_ZONES, REASON_RECORD_NOT_FOUND,
    REASON_SERVICE_NOT_FOUND, REASON_STRATEGY_EXCLUDES_LB, REASON_SYNC_LB_FAILED,
    REASON_UNSUPPORTED_STRATEGY, REASON_WANTED_BY_STRATEGY, STATUS_FALSE, STATUS_TRUE,
};
use anyhow::Result;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Event, Service};
use kube::ResourceExt;

/// A computed condition: `(status, reason, message)`.
type ConditionValue = (&'static str, &'static str, String);

/// What one pass observed about the children of an `IngressController`.
#[derive(Clone, Copy)]
pub struct Observations<'a> {
    pub deployment: Option<&'a Deployment>,
    pub load_balancer_service: Option<&'a Service>,
    /// Events in the operand namespace.
    pub events: &'a [Event],
    pub wildcard_record: Option<&'a DNSRecord>,
    pub dns_config: &'a DnsConfig,
}

fn available_replicas(deployment: Option<&Deployment>) -> i32 {
    deployment
        .and_then(|d| d.status.as_ref())
        .and_then(|s| s.available_replicas)
        .unwrap_or(0)
}

/// `Available` from the router deployment.
#[must_use]
pub fn compute_deployment_available(deployment: Option<&Deployment>) -> ConditionValue {
    match deployment {
        None => (
            STATUS_FALSE,
            REASON_DEPLOYMENT_NOT_FOUND,
            "The deployment does not exist".to_string(),
        ),
        Some(d) => match available_replicas(Some(d)) {
            0 => (
                STATUS_FALSE,
                REASON_DEPLOYMENT_UNAVAILABLE,
                "The deployment has no available replicas".to_string(),
            ),
            n => (
                STATUS_TRUE,
                REASON_DEPLOYMENT_AVAILABLE,
                format!("The deployment has {n} available replicas"),
            ),
        },
    }
}

/// `LoadBalancerManaged` from the effective publishing strategy.
#[must_use]
pub fn compute_load_balancer_managed(ic: &IngressController) -> ConditionValue {
    if wants_load_balancer(ic) {
        (
            STATUS_TRUE,
            REASON_WANTED_BY_STRATEGY,
            "The endpoint publishing strategy supports a managed load balancer".to_string(),
        )
    } else {
        (
            STATUS_FALSE,
            REASON_STRATEGY_EXCLUDES_LB,
            "The configured endpoint publishing strategy does not include a managed load balancer"
                .to_string(),
        )
    }
}

/// Newest `SyncLoadBalancerFailed` warning about `service`.
fn newest_sync_failure<'a>(service: &Service, events: &'a [Event]) -> Option<&'a Event> {
    let name = service.name_any();
    let namespace = service.namespace();
    events
        .iter()
        .filter(|e| e.type_.as_deref() == Some("Warning"))
        .filter(|e| e.reason.as_deref() == Some(REASON_SYNC_LB_FAILED))
        .filter(|e| {
            e.involved_object.kind.as_deref() == Some("Service")
                && e.involved_object.name.as_deref() == Some(name.as_str())
                && e.involved_object.namespace == namespace
        })
        .max_by_key(|e| {
            e.last_timestamp
                .as_ref()
                .or(e.metadata.creation_timestamp.as_ref())
                .map(|t| t.0)
        })
}

/// `LoadBalancerReady` from the load balancer service and operand events.
#[must_use]
pub fn compute_load_balancer_ready(
    service: Option<&Service>,
    events: &[Event],
) -> ConditionValue {
    let Some(service) = service else {
        return (
            STATUS_FALSE,
            REASON_SERVICE_NOT_FOUND,
            "The LoadBalancer service resource is missing".to_string(),
        );
    };
    if load_balancer_target(service).is_some() {
        return (
            STATUS_TRUE,
            REASON_LB_PROVISIONED,
            "The LoadBalancer service is provisioned".to_string(),
        );
    }
    match newest_sync_failure(service, events) {
        Some(event) => (
            STATUS_FALSE,
            REASON_SYNC_LB_FAILED,
            format!(
                "The service-controller component is reporting SyncLoadBalancerFailed events like: {}",
                event.message.as_deref().unwrap_or_default()
            ),
        ),
        None => (
            STATUS_FALSE,
            REASON_LB_PENDING,
            "The LoadBalancer service is pending".to_string(),
        ),
    }
}

/// `DNSManaged` from the publishing strategy and the cluster DNS zones.
#[must_use]
pub fn compute_dns_managed(ic: &IngressController, dns_config: &DnsConfig) -> ConditionValue {
    if !wants_load_balancer(ic) {
        return (
            STATUS_FALSE,
            REASON_UNSUPPORTED_STRATEGY,
            "The endpoint publishing strategy doesn't support DNS management".to_string(),
        );
    }
    if !dns_config.has_zones() {
        return (
            STATUS_FALSE,
            REASON_NO_DNS_ZONES,
            "No DNS zones are defined in the cluster dns config".to_string(),
        );
    }
    (
        STATUS_TRUE,
        REASON_DNS_NORMAL,
        "DNS management is supported and zones are specified in the cluster DNS config"
            .to_string(),
    )
}

fn zone_label(zone: &DNSZone) -> String {
    if let Some(id) = zone.id.as_ref() {
        return format!("id={id}");
    }
    let tags = zone
        .tags
        .iter()
        .flatten()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("tags={tags}")
}

/// `DNSReady` from the wildcard record's per-zone status.
#[must_use]
pub fn compute_dns_ready(record: Option<&DNSRecord>) -> ConditionValue {
    let Some(record) = record else {
        return (
            STATUS_FALSE,
            REASON_RECORD_NOT_FOUND,
            "The wildcard record resource was not found".to_string(),
        );
    };
    let failed: Vec<String> = record
        .status
        .iter()
        .flat_map(|s| s.zones.iter())
        .filter(|z| {
            find_condition(&z.conditions, DNS_ZONE_CONDITION_FAILED)
                .is_some_and(|c| c.status == STATUS_TRUE)
        })
        .map(|z| zone_label(&z.dns_zone))
        .collect();

    if failed.is_empty() {
        (
            STATUS_TRUE,
            REASON_NO_FAILED_ZONES,
            "The record is provisioned in all reported zones".to_string(),
        )
    } else {
        (
            STATUS_FALSE,
            REASON_FAILED_ZONES,
            format!(
                "The record failed to provision in some zones: [{}]",
                failed.join(", ")
            ),
        )
    }
}

/// Merge one computed condition, noting it when it counts toward `Degraded`.
fn set_condition(
    updater: &mut IngressControllerStatusUpdater,
    degraded: &mut Vec<String>,
    condition_type: &str,
    (status, reason, message): ConditionValue,
    counts_toward_degraded: bool,
) {
    if counts_toward_degraded && status == STATUS_FALSE {
        degraded.push(format!("{condition_type}=False ({reason})"));
    }
    updater.set_condition(condition_type, status, reason, &message);
}

/// Compute the new status of `ic` from what this pass observed.
///
/// Domain and publishing strategy are carried over unchanged.
#[must_use]
pub fn compute_status_updater(
    ic: &IngressController,
    observed: &Observations<'_>,
) -> IngressControllerStatusUpdater {
    let mut updater = IngressControllerStatusUpdater::new(ic);
    updater.set_available_replicas(available_replicas(observed.deployment));
    updater.set_selector(Some(pod_selector_string(ic)));
    updater.set_observed_generation(ic.metadata.generation);

    let mut degraded = Vec::new();

    set_condition(
        &mut updater,
        &mut degraded,
        CONDITION_TYPE_AVAILABLE,
        compute_deployment_available(observed.deployment),
        true,
    );

    let lb_managed = compute_load_balancer_managed(ic);
    let lb_is_managed = lb_managed.0 == STATUS_TRUE;
    set_condition(
        &mut updater,
        &mut degraded,
        CONDITION_TYPE_LOAD_BALANCER_MANAGED,
        lb_managed,
        false,
    );
    if lb_is_managed {
        set_condition(
            &mut updater,
            &mut degraded,
            CONDITION_TYPE_LOAD_BALANCER_READY,
            compute_load_balancer_ready(observed.load_balancer_service, observed.events),
            true,
        );
    } else {
        updater.remove_condition(CONDITION_TYPE_LOAD_BALANCER_READY);
    }

    let dns_managed = compute_dns_managed(ic, observed.dns_config);
    let dns_is_managed = dns_managed.0 == STATUS_TRUE;
    set_condition(
        &mut updater,
        &mut degraded,
        CONDITION_TYPE_DNS_MANAGED,
        dns_managed,
        false,
    );
    if dns_is_managed {
        set_condition(
            &mut updater,
            &mut degraded,
            CONDITION_TYPE_DNS_READY,
            compute_dns_ready(observed.wildcard_record),
            true,
        );
    } else {
        updater.remove_condition(CONDITION_TYPE_DNS_READY);
    }

    if degraded.is_empty() {
        updater.set_condition(CONDITION_TYPE_DEGRADED, STATUS_FALSE, REASON_AS_EXPECTED, "");
    } else {
        updater.set_condition(
            CONDITION_TYPE_DEGRADED,
            STATUS_TRUE,
            REASON_DEGRADED_CONDITIONS,
            &format!(
                "One or more status conditions indicate a degraded state: {}",
                degraded.join(", ")
            ),
        );
    }

    updater
}

/// Compute and persist the status of `ic`; no write happens when it is unchanged.
///
/// # Errors
///
/// Returns an error only if the status write fails.
pub async fn sync_ingress_controller_status(
    client: &dyn ClusterClient,
    ic: &IngressController,
    observed: &Observations<'_>,
) -> Result<IngressController> {
    compute_status_updater(ic, observed).apply(client).await
}

#[cfg(test)]
#[path = "status_sync_tests.rs"]
mod status_sync_tests;
