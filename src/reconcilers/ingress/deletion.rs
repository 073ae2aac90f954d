// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer-gated teardown of an `IngressController`.
//!
//! The wildcard `DNSRecord` lives in the operator namespace and is deleted
//! asynchronously by the DNS controller, so the finalizer stays on the
//! `IngressController` until the record can no longer be read. Everything in
//! the operand namespace hangs off the router deployment and is garbage
//! collected with it.

use crate::client::{ClusterClient, OwnedKind};
use crate::config::OperatorConfig;
use crate::crd::IngressController;
use crate::errors::AggregateError;
use crate::ingress_resources::{
    load_balancer_service_key, router_deployment_key, wildcard_record_key,
};
use crate::labels::FINALIZER_INGRESS_CONTROLLER;
use crate::reconcilers::finalizers::remove_finalizer;
use crate::reconcilers::resources::delete_owned_if_present;
use anyhow::Context;
use kube::ResourceExt;
use tracing::{debug, info};

/// Where a deletion pass stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletionProgress {
    /// The wildcard record is still observable; the finalizer was kept.
    AwaitingDnsRecord,
    /// Children are gone and the finalizer was removed.
    Finalized,
}

/// Run one pass of the deletion protocol for `ic`.
///
/// # Errors
///
/// Returns the aggregate of every failed step. The finalizer is only removed
/// when no step failed and the wildcard record is gone.
pub async fn ensure_ingress_deleted(
    client: &dyn ClusterClient,
    config: &OperatorConfig,
    ic: &IngressController,
) -> Result<DeletionProgress, AggregateError> {
    let name = ic.name_any();
    let mut errors = Vec::new();

    let lb_key = load_balancer_service_key(ic, &config.operand_namespace);
    if let Err(e) = delete_owned_if_present(client, OwnedKind::LoadBalancerService, &lb_key).await
    {
        errors.push(e.context(format!("failed to finalize load balancer service for {lb_key}")));
    }

    let record_key = wildcard_record_key(ic);
    if let Err(e) = client.delete_owned(OwnedKind::DnsRecord, &record_key).await {
        errors.push(anyhow::Error::new(e).context("failed to delete wildcard dnsrecord"));
    }
    match client.get_owned(OwnedKind::DnsRecord, &record_key).await {
        Ok(Some(_)) => {
            if errors.is_empty() {
                debug!(
                    "Wildcard dnsrecord {} still exists; keeping finalizer on {}",
                    record_key, name
                );
                return Ok(DeletionProgress::AwaitingDnsRecord);
            }
            return Err(AggregateError::new(errors));
        }
        Ok(None) => {}
        // Unknown record state still tears down compute; the error keeps the finalizer.
        Err(e) => {
            errors.push(anyhow::Error::new(e).context("failed to get current wildcard dnsrecord"));
        }
    }

    let deployment_key = router_deployment_key(ic, &config.operand_namespace);
    if let Err(e) = delete_owned_if_present(client, OwnedKind::Workload, &deployment_key).await {
        errors.push(e.context(format!("failed to delete deployment for ingress {name}")));
    }

    if !errors.is_empty() {
        return Err(AggregateError::new(errors));
    }

    remove_finalizer(client, ic, FINALIZER_INGRESS_CONTROLLER)
        .await
        .with_context(|| format!("failed to remove finalizer from ingresscontroller {name}"))
        .map_err(|e| AggregateError::new(vec![e]))?;

    info!("Finalized IngressController {}", name);
    Ok(DeletionProgress::Finalized)
}

#[cfg(test)]
#[path = "deletion_tests.rs"]
mod deletion_tests;
