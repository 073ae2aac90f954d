// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `IngressController` reconciliation.
//!
//! One pass drives one `IngressController` toward its desired state:
//!
//! ```text
//! NotFound          -> Done
//! DeletionRequested -> deletion protocol -> Done
//! NotAdmitted       -> admission
//!                        rejected -> Warning event, Done
//!                        admitted -> Normal event, RequeueImmediately
//! Admitted          -> convergence -> Done
//! ```
//!
//! Passes are level-triggered and safe to repeat: every step reads current
//! state, writes only what differs, and leaves enough persisted state behind
//! (finalizer, conditions, fixed-once status fields) for the next pass.

pub mod admission;
pub mod convergence;
pub mod deletion;
pub mod status_sync;

use crate::client::{ClusterClient, ObjectKey};
use crate::config::OperatorConfig;
use crate::constants::CLUSTER_CONFIG_NAME;
use crate::crd::{DnsConfig, Infrastructure, IngressConfig};
use crate::errors::{AdmissionError, ReconcileError};
use crate::events::{EventRecorder, EventType};
use crate::metrics;
use crate::status_reasons::{EVENT_REASON_ADMITTED, EVENT_REASON_REJECTED};
use deletion::DeletionProgress;
use std::sync::Arc;
use tracing::{debug, info};

/// What the controller runtime should do after a successful pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing left to do until the next trigger.
    Done,
    /// Run another pass right away (used after admission).
    RequeueImmediately,
}

/// Cluster-wide configuration read once at the top of every pass.
#[derive(Clone, Debug)]
pub struct ClusterSettings {
    pub dns: DnsConfig,
    pub infrastructure: Infrastructure,
    pub ingress: IngressConfig,
}

/// Reconciles `IngressController` resources.
///
/// All collaborators are handed in at construction; the reconciler keeps no
/// state between passes.
pub struct IngressReconciler {
    client: Arc<dyn ClusterClient>,
    recorder: Arc<dyn EventRecorder>,
    config: OperatorConfig,
}

impl IngressReconciler {
    #[must_use]
    pub fn new(
        client: Arc<dyn ClusterClient>,
        recorder: Arc<dyn EventRecorder>,
        config: OperatorConfig,
    ) -> Self {
        Self {
            client,
            recorder,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// Run one reconciliation pass for the `IngressController` at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the record or the cluster configuration cannot be
    /// read, when admission cannot complete, or when deletion or convergence
    /// collected failures. Admission rejections are not errors.
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<ReconcileOutcome, ReconcileError> {
        info!("Reconciling IngressController {}", key);
        let client = self.client.as_ref();

        let Some(ic) = client
            .get_ingress_controller(key)
            .await
            .map_err(|error| ReconcileError::Fetch {
                key: key.to_string(),
                error,
            })?
        else {
            // Already finalized, or a stale trigger from a related object.
            info!(
                "IngressController {} not found; reconciliation will be skipped",
                key
            );
            return Ok(ReconcileOutcome::Done);
        };

        if ic.metadata.deletion_timestamp.is_some() {
            let progress = deletion::ensure_ingress_deleted(client, &self.config, &ic)
                .await
                .map_err(ReconcileError::Deletion)?;
            match progress {
                DeletionProgress::AwaitingDnsRecord => {
                    debug!("IngressController {} is waiting for its dnsrecord", key);
                }
                DeletionProgress::Finalized => {
                    info!("IngressController {} was successfully deleted", key);
                }
            }
            return Ok(ReconcileOutcome::Done);
        }

        let settings = self.fetch_cluster_settings().await?;

        if !admission::is_admitted(&ic) {
            return match admission::admit(
                client,
                &self.config.namespace,
                &ic,
                &settings.ingress,
                &settings.infrastructure,
            )
            .await
            {
                Ok(_) => {
                    metrics::record_admission("admitted");
                    self.recorder
                        .record(
                            &ic,
                            EventType::Normal,
                            EVENT_REASON_ADMITTED,
                            "ingresscontroller passed validation",
                        )
                        .await;
                    Ok(ReconcileOutcome::RequeueImmediately)
                }
                Err(AdmissionError::Rejected(rejection)) => {
                    metrics::record_admission("rejected");
                    self.recorder
                        .record(
                            &ic,
                            EventType::Warning,
                            EVENT_REASON_REJECTED,
                            &rejection.reason,
                        )
                        .await;
                    Ok(ReconcileOutcome::Done)
                }
                Err(AdmissionError::Failed(error)) => Err(ReconcileError::Admission(error)),
            };
        }

        convergence::ensure_ingress_controller(client, &self.config, &ic, &settings)
            .await
            .map_err(ReconcileError::Convergence)?;

        Ok(ReconcileOutcome::Done)
    }

    async fn fetch_cluster_settings(&self) -> Result<ClusterSettings, ReconcileError> {
        let client = self.client.as_ref();
        let dns = client
            .get_dns_config()
            .await
            .map_err(|error| ReconcileError::ClusterConfig {
                kind: "dns",
                name: CLUSTER_CONFIG_NAME,
                error,
            })?;
        let infrastructure =
            client
                .get_infrastructure()
                .await
                .map_err(|error| ReconcileError::ClusterConfig {
                    kind: "infrastructure",
                    name: CLUSTER_CONFIG_NAME,
                    error,
                })?;
        let ingress = client
            .get_ingress_config()
            .await
            .map_err(|error| ReconcileError::ClusterConfig {
                kind: "ingress",
                name: CLUSTER_CONFIG_NAME,
                error,
            })?;
        Ok(ClusterSettings {
            dns,
            infrastructure,
            ingress,
        })
    }
}
