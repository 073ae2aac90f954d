// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `IngressController` resources.
//!
//! This module provides utility functions for creating and merging Kubernetes
//! status conditions following the standard conventions, and a status updater
//! that collects changes in memory and writes the status subresource once.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (e.g., "Admitted", "Available")
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the status last changed
//!
//! # Example
//!
//! ```rust,no_run
//! use ingress_operator::reconcilers::status::create_condition;
//!
//! let condition = create_condition(
//!     "Admitted",
//!     "True",
//!     "Valid",
//!     "IngressController is valid"
//! );
//! ```

use crate::client::ClusterClient;
use crate::crd::{Condition, EndpointPublishingStrategy, IngressController, IngressControllerStatus};
use anyhow::{Context, Result};
use chrono::Utc;
use kube::ResourceExt;
use tracing::debug;

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Arguments
///
/// * `condition_type` - The type of condition (e.g., "Admitted", "Available")
/// * `status` - The status: "True", "False", or "Unknown"
/// * `reason` - A programmatic identifier in `CamelCase` (e.g., "`DeploymentAvailable`")
/// * `message` - A human-readable explanation
///
/// # Example
///
/// ```rust,no_run
/// # use ingress_operator::reconcilers::status::create_condition;
/// let condition = create_condition(
///     "Available",
///     "True",
///     "DeploymentAvailable",
///     "The deployment has Available status condition set to True"
/// );
/// assert_eq!(condition.r#type, "Available");
/// assert_eq!(condition.status, "True");
/// ```
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// An existing condition of the same type is updated in place: status, reason
/// and message are overwritten, and `lastTransitionTime` is refreshed only when
/// the status changes. Conditions of other types are left untouched.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        // Preserve lastTransitionTime if status hasn't changed
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Remove every condition of the given type.
pub fn remove_condition(conditions: &mut Vec<Condition>, condition_type: &str) {
    conditions.retain(|c| c.r#type != condition_type);
}

/// Compare two condition lists to check if they are semantically equal.
///
/// Ignores `lastTransitionTime` and ordering; compares type, status, reason and message.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    if current.len() != new.len() {
        return false;
    }

    for new_cond in new {
        match current.iter().find(|c| c.r#type == new_cond.r#type) {
            None => return false,
            Some(curr_cond) => {
                if curr_cond.status != new_cond.status
                    || curr_cond.reason != new_cond.reason
                    || curr_cond.message != new_cond.message
                {
                    return false;
                }
            }
        }
    }

    true
}

/// Compare two `IngressController` statuses, ignoring condition timestamps and order.
#[must_use]
pub fn statuses_equal(current: &IngressControllerStatus, new: &IngressControllerStatus) -> bool {
    current.domain == new.domain
        && current.endpoint_publishing_strategy == new.endpoint_publishing_strategy
        && current.available_replicas == new.available_replicas
        && current.selector == new.selector
        && current.observed_generation == new.observed_generation
        && conditions_equal(&current.conditions, &new.conditions)
}

/// Centralized status updater for `IngressController` resources.
///
/// Collects all status changes of one step in memory and writes the status
/// subresource in a single call, and only when something actually changed.
/// Skipping unchanged writes keeps a converged controller from triggering
/// itself through its own status updates.
///
/// # Example
///
/// ```rust,ignore
/// use ingress_operator::reconcilers::status::IngressControllerStatusUpdater;
///
/// let mut updater = IngressControllerStatusUpdater::new(&ic);
/// updater.set_condition("Admitted", "True", "Valid", "");
/// let updated = updater.apply(client.as_ref()).await?;
/// ```
pub struct IngressControllerStatusUpdater {
    ingress_controller: IngressController,
    current_status: IngressControllerStatus,
    new_status: IngressControllerStatus,
}

impl IngressControllerStatusUpdater {
    #[must_use]
    pub fn new(ic: &IngressController) -> Self {
        let current_status = ic.status.clone().unwrap_or_default();
        Self {
            ingress_controller: ic.clone(),
            new_status: current_status.clone(),
            current_status,
        }
    }

    /// Set or update a condition (in-memory only).
    pub fn set_condition(
        &mut self,
        condition_type: &str,
        status: &str,
        reason: &str,
        message: &str,
    ) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            condition_type,
            status,
            reason,
            message,
        );
    }

    pub fn remove_condition(&mut self, condition_type: &str) {
        remove_condition(&mut self.new_status.conditions, condition_type);
    }

    /// Set the effective domain unless one is already recorded.
    ///
    /// The effective domain is fixed on first assignment.
    pub fn set_domain_if_unset(&mut self, domain: &str) {
        if self
            .new_status
            .domain
            .as_deref()
            .is_none_or(str::is_empty)
        {
            self.new_status.domain = Some(domain.to_string());
        }
    }

    /// Set the effective publishing strategy unless one is already recorded.
    pub fn set_strategy_if_unset(&mut self, strategy: EndpointPublishingStrategy) {
        if self.new_status.endpoint_publishing_strategy.is_none() {
            self.new_status.endpoint_publishing_strategy = Some(strategy);
        }
    }

    pub fn set_available_replicas(&mut self, replicas: i32) {
        self.new_status.available_replicas = replicas;
    }

    pub fn set_selector(&mut self, selector: Option<String>) {
        self.new_status.selector = selector;
    }

    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.new_status.observed_generation = generation;
    }

    /// The status as it will be written.
    #[must_use]
    pub fn status(&self) -> &IngressControllerStatus {
        &self.new_status
    }

    /// Check if the collected status differs from the current one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !statuses_equal(&self.current_status, &self.new_status)
    }

    /// Write the collected status if it changed.
    ///
    /// Returns the updated object, or the unchanged input when no write was needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the status write fails (including conflicts).
    pub async fn apply(self, client: &dyn ClusterClient) -> Result<IngressController> {
        let name = self.ingress_controller.name_any();
        let namespace = self.ingress_controller.namespace().unwrap_or_default();

        if !self.has_changes() {
            debug!(
                "Status unchanged for IngressController {}/{}, skipping update",
                namespace, name
            );
            return Ok(self.ingress_controller);
        }

        let mut updated = self.ingress_controller;
        updated.status = Some(self.new_status);
        let written = client
            .update_ingress_controller_status(&updated)
            .await
            .with_context(|| {
                format!("failed to update status of ingresscontroller {namespace}/{name}")
            })?;

        debug!("Updated status for IngressController {}/{}", namespace, name);
        Ok(written)
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
