// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Mapping of watched operand resources back to their `IngressController`.
//!
//! Router deployments and services live in the operand namespace and cannot
//! carry an owner reference to the `IngressController`. They are labelled with
//! the owning controller's name instead, and this label is what the watch
//! mapper reads to decide which `IngressController` to reconcile.

use crate::crd::IngressController;
use crate::labels::OWNING_INGRESS_CONTROLLER_LABEL;
use kube::runtime::reflector::ObjectRef;
use kube::ResourceExt;
use tracing::debug;

/// Reference to the `IngressController` named by the owning label of `obj`.
///
/// Returns `None` for objects without the label, so unrelated deployments and
/// services in the operand namespace never trigger a reconciliation.
pub fn owning_ingress_controller<K: ResourceExt>(
    obj: &K,
    operator_namespace: &str,
) -> Option<ObjectRef<IngressController>> {
    let name = obj.labels().get(OWNING_INGRESS_CONTROLLER_LABEL)?;
    debug!(
        ingress_controller = %name,
        related = %obj.name_any(),
        "Queueing ingresscontroller for related object"
    );
    Some(ObjectRef::new(name).within(operator_namespace))
}

#[cfg(test)]
#[path = "watches_tests.rs"]
mod watches_tests;
