// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for the ingress operator.
//!
//! # Reconciliation Architecture
//!
//! The operator follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor `IngressController` changes and the children they own
//! 2. **Reconcile** - Compare the desired state with what exists in the cluster
//! 3. **Update** - Create, update or delete children to close the gap
//! 4. **Status** - Report the observed state back on the `IngressController`
//!
//! # Modules
//!
//! - [`ingress`] - The `IngressController` reconcile driver and its phases
//! - [`finalizers`] - Adding and removing finalizers
//! - [`resources`] - Create-or-update helpers for owned children
//! - [`status`] - Condition helpers and the batched status updater
//!
//! # Example
//!
//! ```rust,no_run
//! use ingress_operator::client::{KubeClusterClient, ObjectKey};
//! use ingress_operator::config::OperatorConfig;
//! use ingress_operator::events::KubeEventRecorder;
//! use ingress_operator::reconcilers::ingress::IngressReconciler;
//! use std::sync::Arc;
//!
//! async fn reconcile_default(client: kube::Client) -> anyhow::Result<()> {
//!     let reconciler = IngressReconciler::new(
//!         Arc::new(KubeClusterClient::new(client.clone())),
//!         Arc::new(KubeEventRecorder::new(client)),
//!         OperatorConfig::with_image("quay.io/openshift/router:latest"),
//!     );
//!     let key = ObjectKey::new("openshift-ingress-operator", "default");
//!     reconciler.reconcile(&key).await?;
//!     Ok(())
//! }
//! ```

pub mod finalizers;
pub mod ingress;
pub mod resources;
pub mod status;
