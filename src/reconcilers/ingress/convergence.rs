// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Convergence of an admitted `IngressController`.
//!
//! Ensures the finalizer, then every owned resource, then the status. Sibling
//! steps are independent: a failure is recorded and the next step still runs.
//! Steps that need the router deployment are skipped when it could not be
//! ensured, and each skip is reported as its own error.

use crate::client::{ClusterClient, OwnedKind, OwnedResource};
use crate::config::OperatorConfig;
use crate::crd::{DNSRecord, IngressController, PlatformType};
use crate::errors::AggregateError;
use crate::ingress_resources::{
    build_deployment_owner_reference, build_internal_service, build_load_balancer_service,
    build_pod_disruption_budget, build_router_deployment, build_rsyslog_configmap,
    build_service_monitor, build_wildcard_dns_record, load_balancer_service_key, logs_to_container,
    rsyslog_configmap_key, wants_load_balancer, wildcard_record_key,
};
use crate::labels::FINALIZER_INGRESS_CONTROLLER;
use crate::reconcilers::finalizers::ensure_finalizer;
use crate::reconcilers::ingress::status_sync::{sync_ingress_controller_status, Observations};
use crate::reconcilers::ingress::ClusterSettings;
use crate::reconcilers::resources::{delete_owned_if_present, ensure_owned};
use anyhow::{anyhow, Context, Result};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;
use tracing::{debug, warn};

/// Ensure every resource an admitted `IngressController` needs, then sync its status.
///
/// # Errors
///
/// Returns the aggregate of every step that failed or was skipped. A failure
/// to add the finalizer aborts the pass before any child is touched.
pub async fn ensure_ingress_controller(
    client: &dyn ClusterClient,
    config: &OperatorConfig,
    ic: &IngressController,
    settings: &ClusterSettings,
) -> Result<(), AggregateError> {
    let ic = ensure_finalizer(client, ic, FINALIZER_INGRESS_CONTROLLER)
        .await
        .context("failed to update finalizers")
        .map_err(|e| AggregateError::new(vec![e]))?;
    let name = ic.name_any();
    let operand_namespace = config.operand_namespace.as_str();
    let mut errors = Vec::new();

    let deployment = match ensure_router_deployment(client, config, &ic).await {
        Ok(deployment) => Some(deployment),
        Err(e) => {
            errors.push(e.context(format!("failed to ensure deployment for {name}")));
            None
        }
    };

    let mut lb_service = None;
    let mut wildcard_record = None;

    if let Some(deployment) = deployment.as_ref() {
        let deployment_ref = build_deployment_owner_reference(deployment);
        let platform = settings.infrastructure.platform();

        let lb = ensure_load_balancer_service(
            client,
            operand_namespace,
            &ic,
            &deployment_ref,
            platform,
        )
        .await;
        match lb {
            Ok(service) => {
                match ensure_wildcard_dns_record(client, &ic, service.as_ref()).await {
                    Ok(record) => wildcard_record = record,
                    Err(e) => errors.push(
                        e.context(format!("failed to ensure wildcard dnsrecord for {name}")),
                    ),
                }
                lb_service = service;
            }
            Err(e) => errors.push(
                e.context(format!("failed to ensure load balancer service for {name}")),
            ),
        }

        match ensure_owned(
            client,
            OwnedResource::InternalService(build_internal_service(
                &ic,
                &deployment_ref,
                operand_namespace,
            )),
        )
        .await
        .and_then(into_service)
        {
            Ok(internal) => {
                let monitor = OwnedResource::MetricsMonitor(build_service_monitor(
                    &ic,
                    &internal,
                    &deployment_ref,
                    operand_namespace,
                ));
                if let Err(e) = ensure_owned(client, monitor).await {
                    errors.push(e.context(format!(
                        "failed to integrate metrics with openshift-monitoring for ingresscontroller {name}"
                    )));
                }
            }
            Err(e) => errors.push(e.context(format!(
                "failed to create internal router service for ingresscontroller {name}"
            ))),
        }

        if let Err(e) =
            ensure_rsyslog_configmap(client, operand_namespace, &ic, &deployment_ref).await
        {
            errors.push(e.context(format!("failed to ensure rsyslog configmap for {name}")));
        }

        let pdb = OwnedResource::DisruptionBudget(build_pod_disruption_budget(
            &ic,
            &deployment_ref,
            operand_namespace,
        ));
        if let Err(e) = ensure_owned(client, pdb).await {
            errors.push(e.context(format!(
                "failed to ensure pod disruption budget for {name}"
            )));
        }
    } else {
        for kind in skipped_without_deployment(&ic) {
            errors.push(anyhow!(
                "failed to ensure {kind} for {name}: router deployment is unavailable"
            ));
        }
    }

    let events = match client.list_events(operand_namespace).await {
        Ok(events) => events,
        Err(e) => {
            errors.push(anyhow::Error::new(e).context(format!(
                "failed to list events in namespace \"{operand_namespace}\""
            )));
            Vec::new()
        }
    };

    let observed = Observations {
        deployment: deployment.as_ref(),
        load_balancer_service: lb_service.as_ref(),
        events: &events,
        wildcard_record: wildcard_record.as_ref(),
        dns_config: &settings.dns,
    };
    if let Err(e) = sync_ingress_controller_status(client, &ic, &observed).await {
        errors.push(e.context("failed to sync ingresscontroller status"));
    }

    if !errors.is_empty() {
        warn!(
            "IngressController {} converged with {} error(s)",
            name,
            errors.len()
        );
    }
    AggregateError::into_result(errors)
}

/// Deployment-dependent variants skipped when the deployment could not be ensured.
///
/// Variants only reached through another one (the wildcard record behind the
/// load balancer, the monitor behind the internal service) are covered by
/// their parent's skip.
fn skipped_without_deployment(ic: &IngressController) -> Vec<OwnedKind> {
    let mut kinds = Vec::new();
    if wants_load_balancer(ic) {
        kinds.push(OwnedKind::LoadBalancerService);
    }
    kinds.push(OwnedKind::InternalService);
    if logs_to_container(ic) {
        kinds.push(OwnedKind::LoggingConfig);
    }
    kinds.push(OwnedKind::DisruptionBudget);
    kinds
}

fn into_service(resource: OwnedResource) -> Result<Service> {
    let kind = resource.kind();
    resource
        .into_service()
        .ok_or_else(|| anyhow!("unexpected {kind} returned for a service"))
}

async fn ensure_router_deployment(
    client: &dyn ClusterClient,
    config: &OperatorConfig,
    ic: &IngressController,
) -> Result<Deployment> {
    let desired = build_router_deployment(
        ic,
        &config.ingress_controller_image,
        &config.operand_namespace,
    );
    let stored = ensure_owned(client, OwnedResource::Workload(desired)).await?;
    let kind = stored.kind();
    stored
        .into_deployment()
        .ok_or_else(|| anyhow!("unexpected {kind} returned for the router deployment"))
}

/// Ensure the load balancer service when the strategy wants one, otherwise delete a stale one.
async fn ensure_load_balancer_service(
    client: &dyn ClusterClient,
    operand_namespace: &str,
    ic: &IngressController,
    deployment_ref: &OwnerReference,
    platform: Option<PlatformType>,
) -> Result<Option<Service>> {
    if !wants_load_balancer(ic) {
        let key = load_balancer_service_key(ic, operand_namespace);
        if delete_owned_if_present(client, OwnedKind::LoadBalancerService, &key).await? {
            debug!("Deleted load balancer service {} no longer wanted", key);
        }
        return Ok(None);
    }
    let desired = build_load_balancer_service(ic, deployment_ref, operand_namespace, platform);
    let stored = ensure_owned(client, OwnedResource::LoadBalancerService(desired)).await?;
    into_service(stored).map(Some)
}

/// Ensure the wildcard record once the load balancer has an ingress point,
/// otherwise delete a stale one.
async fn ensure_wildcard_dns_record(
    client: &dyn ClusterClient,
    ic: &IngressController,
    lb_service: Option<&Service>,
) -> Result<Option<DNSRecord>> {
    let Some(desired) = lb_service.and_then(|svc| build_wildcard_dns_record(ic, svc)) else {
        delete_owned_if_present(client, OwnedKind::DnsRecord, &wildcard_record_key(ic)).await?;
        return Ok(None);
    };
    let stored = ensure_owned(client, OwnedResource::DnsRecord(desired)).await?;
    let kind = stored.kind();
    stored
        .into_dns_record()
        .map(Some)
        .ok_or_else(|| anyhow!("unexpected {kind} returned for the wildcard dnsrecord"))
}

/// Ensure the rsyslog config map when logging to a container, otherwise delete a stale one.
async fn ensure_rsyslog_configmap(
    client: &dyn ClusterClient,
    operand_namespace: &str,
    ic: &IngressController,
    deployment_ref: &OwnerReference,
) -> Result<()> {
    match build_rsyslog_configmap(ic, deployment_ref, operand_namespace) {
        Some(desired) => {
            ensure_owned(client, OwnedResource::LoggingConfig(desired)).await?;
        }
        None => {
            let key = rsyslog_configmap_key(ic, operand_namespace);
            delete_owned_if_present(client, OwnedKind::LoggingConfig, &key).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "convergence_tests.rs"]
mod convergence_tests;
