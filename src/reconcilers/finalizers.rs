// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for `IngressController` resources.
//!
//! The finalizer keeps an `IngressController` from disappearing before its
//! wildcard `DNSRecord` has been torn down. It is added before any child is
//! created and removed only by the deletion protocol.
//!
//! # Example
//!
//! ```rust,ignore
//! use ingress_operator::labels::FINALIZER_INGRESS_CONTROLLER;
//! use ingress_operator::reconcilers::finalizers::ensure_finalizer;
//!
//! let ic = ensure_finalizer(client.as_ref(), &ic, FINALIZER_INGRESS_CONTROLLER).await?;
//! ```

use crate::client::{ClusterClient, ObjectKey};
use crate::crd::IngressController;
use anyhow::{anyhow, Context, Result};
use kube::ResourceExt;
use tracing::{debug, info};

/// Returns `true` if `finalizer` is present on the resource.
#[must_use]
pub fn has_finalizer(ic: &IngressController, finalizer: &str) -> bool {
    ic.finalizers().iter().any(|f| f == finalizer)
}

/// Add a finalizer to an `IngressController` if not already present.
///
/// After a write the object is read back so the caller continues with the
/// stored version (fresh `resourceVersion`). Idempotent: no write happens
/// when the finalizer is already there.
///
/// # Errors
///
/// Returns an error if the update or the subsequent read fails, or if the
/// object vanished in between.
pub async fn ensure_finalizer(
    client: &dyn ClusterClient,
    ic: &IngressController,
    finalizer: &str,
) -> Result<IngressController> {
    let key = ObjectKey::of(ic);
    if has_finalizer(ic, finalizer) {
        debug!("Finalizer {} already present on {}", finalizer, key);
        return Ok(ic.clone());
    }

    info!("Adding finalizer {} to {} IngressController", finalizer, key);

    let mut updated = ic.clone();
    updated.finalizers_mut().push(finalizer.to_string());
    client
        .update_ingress_controller(&updated)
        .await
        .with_context(|| format!("failed to add finalizer {finalizer} to {key}"))?;

    let stored = client
        .get_ingress_controller(&key)
        .await
        .with_context(|| format!("failed to get ingresscontroller {key}"))?
        .ok_or_else(|| anyhow!("ingresscontroller {key} disappeared after adding finalizer"))?;

    info!("Successfully added finalizer {} to {}", finalizer, key);
    Ok(stored)
}

/// Remove a finalizer from an `IngressController`.
///
/// Idempotent: no write happens when the finalizer is already absent.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn remove_finalizer(
    client: &dyn ClusterClient,
    ic: &IngressController,
    finalizer: &str,
) -> Result<()> {
    let key = ObjectKey::of(ic);
    if !has_finalizer(ic, finalizer) {
        debug!("Finalizer {} already absent from {}", finalizer, key);
        return Ok(());
    }

    info!("Removing finalizer {} from {} IngressController", finalizer, key);

    let mut updated = ic.clone();
    updated.finalizers_mut().retain(|f| f != finalizer);
    client
        .update_ingress_controller(&updated)
        .await
        .with_context(|| format!("failed to remove finalizer {finalizer} from {key}"))?;

    info!("Successfully removed finalizer {} from {}", finalizer, key);
    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
