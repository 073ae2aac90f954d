// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Ingress Operator - IngressController reconciler for Kubernetes
//!
//! A level-triggered operator that turns `IngressController` resources into
//! running, published routers.
//!
//! ## Overview
//!
//! For every `IngressController` the operator:
//!
//! - Admits it once: defaults the domain and publishing strategy, and rejects
//!   empty or duplicate domains
//! - Converges the router deployment, its services, the wildcard `DNSRecord`,
//!   metrics integration, access logging and the disruption budget
//! - Aggregates the observed state into status conditions
//! - Tears everything down in order when the controller is deleted, holding a
//!   finalizer until the wildcard record is gone
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`client`] - The [`client::ClusterClient`] seam over the Kubernetes API
//! - [`ingress_resources`] - Desired-state builders for every owned resource
//! - [`reconcilers`] - The reconcile driver and its phases
//! - [`events`] - Kubernetes event recording
//! - [`watches`] - Mapping watched children back to their `IngressController`
//! - [`metrics`] - Prometheus metrics
//! - [`config`] - Command-line and environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use ingress_operator::crd::{IngressController, IngressControllerSpec};
//!
//! let ic = IngressController::new(
//!     "default",
//!     IngressControllerSpec {
//!         domain: Some("apps.example.com".to_string()),
//!         ..Default::default()
//!     },
//! );
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod crd;
pub mod errors;
pub mod events;
pub mod ingress_resources;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod status_reasons;
pub mod watches;

#[cfg(test)]
pub mod testing;
