// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Create-or-update and delete helpers for owned resources.
//!
//! Every owned resource goes through [`ensure_owned`]: read the current object,
//! create it if absent, update it in place only when its managed fields have
//! drifted, and otherwise write nothing. Running it twice without external
//! change performs no second write.
//!
//! # Example
//!
//! ```rust,ignore
//! use ingress_operator::client::OwnedResource;
//! use ingress_operator::reconcilers::resources::ensure_owned;
//!
//! let deployment = ensure_owned(client.as_ref(), OwnedResource::Workload(desired)).await?;
//! ```

use crate::client::{ClusterClient, ObjectKey, OwnedKind, OwnedResource};
use crate::ingress_resources::{merge_for_update, owned_changed};
use crate::metrics;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Create or update an owned resource, returning the stored object.
///
/// # Errors
///
/// Returns an error if reading, creating or updating the resource fails.
pub async fn ensure_owned(
    client: &dyn ClusterClient,
    desired: OwnedResource,
) -> Result<OwnedResource> {
    let kind = desired.kind();
    let key = desired.key();

    debug!(
        kind = %kind,
        namespace = %key.namespace,
        name = %key.name,
        "Ensuring owned resource"
    );

    let current = client
        .get_owned(kind, &key)
        .await
        .with_context(|| format!("failed to get {kind} {key}"))?;

    match current {
        None => {
            let created = client
                .create_owned(&desired)
                .await
                .with_context(|| format!("failed to create {kind} {key}"))?;
            metrics::record_resource_created(kind.as_str());
            info!("Created {} {}", kind, key);
            Ok(created)
        }
        Some(current) if owned_changed(&current, &desired) => {
            let merged = merge_for_update(&current, desired);
            let updated = client
                .update_owned(&merged)
                .await
                .with_context(|| format!("failed to update {kind} {key}"))?;
            metrics::record_resource_updated(kind.as_str());
            info!("Updated {} {}", kind, key);
            Ok(updated)
        }
        Some(current) => {
            debug!("{} {} is up to date", kind, key);
            Ok(current)
        }
    }
}

/// Delete an owned resource if it exists.
///
/// Returns `true` when a delete was issued and `false` when there was nothing to delete.
///
/// # Errors
///
/// Returns an error if reading or deleting the resource fails.
pub async fn delete_owned_if_present(
    client: &dyn ClusterClient,
    kind: OwnedKind,
    key: &ObjectKey,
) -> Result<bool> {
    let current = client
        .get_owned(kind, key)
        .await
        .with_context(|| format!("failed to get {kind} {key}"))?;

    let Some(current) = current else {
        debug!("{} {} does not exist, nothing to delete", kind, key);
        return Ok(false);
    };

    if current.meta().deletion_timestamp.is_some() {
        debug!("{} {} is already being deleted", kind, key);
        return Ok(true);
    }

    client
        .delete_owned(kind, key)
        .await
        .with_context(|| format!("failed to delete {kind} {key}"))?;
    metrics::record_resource_deleted(kind.as_str());
    info!("Deleted {} {}", kind, key);
    Ok(true)
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
