// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission of `IngressController` resources.
//!
//! Admission runs once per record, before anything is deployed for it. It
//! fixes the effective domain and publishing strategy in status, validates the
//! result, and records the outcome as the `Admitted` condition.

use crate::client::ClusterClient;
use crate::crd::{
    EndpointPublishingStrategy, EndpointPublishingStrategyType, Infrastructure, IngressConfig,
    IngressController, LoadBalancerScope, LoadBalancerStrategy, PlatformType,
};
use crate::errors::{format_messages, AdmissionError, AdmissionRejection};
use crate::ingress_resources::effective_domain;
use crate::reconcilers::status::{find_condition, IngressControllerStatusUpdater};
use crate::status_reasons::{
    CONDITION_TYPE_ADMITTED, REASON_INVALID, REASON_VALID, STATUS_FALSE, STATUS_TRUE,
};
use anyhow::Context;
use kube::ResourceExt;
use tracing::{debug, info};

/// Returns `true` when the `Admitted` condition is `True`.
#[must_use]
pub fn is_admitted(ic: &IngressController) -> bool {
    ic.status
        .as_ref()
        .and_then(|s| find_condition(&s.conditions, CONDITION_TYPE_ADMITTED))
        .is_some_and(|c| c.status == STATUS_TRUE)
}

/// Requested domain, or the cluster ingress domain when none is requested.
#[must_use]
pub fn requested_domain(ic: &IngressController, ingress_config: &IngressConfig) -> String {
    ic.spec
        .domain
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(&ingress_config.spec.domain)
        .to_string()
}

/// Publishing strategy used when an `IngressController` does not request one.
///
/// Cloud platforms with a load balancer integration get a managed load
/// balancer; everything else publishes on the host network.
#[must_use]
pub fn default_strategy_for_platform(
    platform: Option<PlatformType>,
) -> EndpointPublishingStrategyType {
    match platform {
        Some(PlatformType::AWS | PlatformType::Azure | PlatformType::GCP) => {
            EndpointPublishingStrategyType::LoadBalancerService
        }
        _ => EndpointPublishingStrategyType::HostNetwork,
    }
}

/// Requested strategy, or the platform default, with load balancer parameters filled in.
#[must_use]
pub fn requested_strategy(
    ic: &IngressController,
    infrastructure: &Infrastructure,
) -> EndpointPublishingStrategy {
    let mut strategy = ic
        .spec
        .endpoint_publishing_strategy
        .clone()
        .unwrap_or_else(|| EndpointPublishingStrategy {
            r#type: default_strategy_for_platform(infrastructure.platform()),
            load_balancer: None,
        });

    if strategy.r#type == EndpointPublishingStrategyType::LoadBalancerService
        && strategy.load_balancer.is_none()
    {
        strategy.load_balancer = Some(LoadBalancerStrategy {
            scope: LoadBalancerScope::External,
        });
    }
    strategy
}

/// Fix the effective domain in status unless it is already set.
pub fn set_default_domain(
    updater: &mut IngressControllerStatusUpdater,
    ic: &IngressController,
    ingress_config: &IngressConfig,
) {
    updater.set_domain_if_unset(&requested_domain(ic, ingress_config));
}

/// Fix the effective publishing strategy in status unless it is already set.
pub fn set_default_publishing_strategy(
    updater: &mut IngressControllerStatusUpdater,
    ic: &IngressController,
    infrastructure: &Infrastructure,
) {
    updater.set_strategy_if_unset(requested_strategy(ic, infrastructure));
}

/// Reject an empty effective domain.
///
/// # Errors
///
/// Returns the rejection message when `domain` is empty.
pub fn validate_domain(domain: Option<&str>) -> Result<(), String> {
    match domain {
        Some(d) if !d.is_empty() => Ok(()),
        _ => Err("domain is required".to_string()),
    }
}

/// Reject a domain already held by another admitted `IngressController`.
///
/// Records being deleted do not hold their domain. Identity is compared by UID.
///
/// # Errors
///
/// Returns `conflicts with: <name>` naming the first conflicting record.
pub fn validate_domain_uniqueness(
    ic: &IngressController,
    domain: Option<&str>,
    existing: &[IngressController],
) -> Result<(), String> {
    let Some(domain) = domain.filter(|d| !d.is_empty()) else {
        return Ok(());
    };
    let conflict = existing.iter().find(|other| {
        other.metadata.uid != ic.metadata.uid
            && other.metadata.deletion_timestamp.is_none()
            && is_admitted(other)
            && effective_domain(other) == Some(domain)
    });
    match conflict {
        Some(other) => Err(format!("conflicts with: {}", other.name_any())),
        None => Ok(()),
    }
}

/// Default and validate an `IngressController`.
///
/// Status is written only when the merged result differs from what is stored.
/// Returns the stored object after admission.
///
/// # Errors
///
/// - [`AdmissionError::Rejected`] when validation fails (status records the reason)
/// - [`AdmissionError::Failed`] when records cannot be listed or status cannot be written
pub async fn admit(
    client: &dyn ClusterClient,
    namespace: &str,
    ic: &IngressController,
    ingress_config: &IngressConfig,
    infrastructure: &Infrastructure,
) -> Result<IngressController, AdmissionError> {
    let mut updater = IngressControllerStatusUpdater::new(ic);
    set_default_domain(&mut updater, ic, ingress_config);
    set_default_publishing_strategy(&mut updater, ic, infrastructure);

    let existing = client
        .list_ingress_controllers(namespace)
        .await
        .context("failed to list ingresscontrollers")?;

    let domain = updater.status().domain.clone();
    let mut problems = Vec::new();
    if let Err(problem) = validate_domain(domain.as_deref()) {
        problems.push(problem);
    }
    if let Err(problem) = validate_domain_uniqueness(ic, domain.as_deref(), &existing) {
        problems.push(problem);
    }

    if !problems.is_empty() {
        let rejection = AdmissionRejection {
            reason: format_messages(&problems),
        };
        info!(
            "IngressController {}/{} rejected: {}",
            ic.namespace().unwrap_or_default(),
            ic.name_any(),
            rejection.reason
        );
        updater.set_condition(
            CONDITION_TYPE_ADMITTED,
            STATUS_FALSE,
            REASON_INVALID,
            &rejection.reason,
        );
        updater.apply(client).await?;
        return Err(AdmissionError::Rejected(rejection));
    }

    updater.set_condition(CONDITION_TYPE_ADMITTED, STATUS_TRUE, REASON_VALID, "");
    debug!(
        domain = ?domain,
        "Admitting IngressController {}/{}",
        ic.namespace().unwrap_or_default(),
        ic.name_any()
    );
    Ok(updater.apply(client).await?)
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod admission_tests;
