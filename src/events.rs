// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes event recording for `IngressController` resources.
//!
//! Events are an audit trail for operators. Recording is fire-and-forget: a
//! failure to create an event is logged and never fails a reconciliation.

use crate::constants::CONTROLLER_NAME;
use crate::crd::IngressController;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Event, EventSource, ObjectReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::api::PostParams;
use kube::{Api, Client, Resource, ResourceExt};
use std::fmt;
use tracing::{debug, warn};

/// Severity of a recorded event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    Normal,
    Warning,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Normal => "Normal",
            EventType::Warning => "Warning",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records events against an `IngressController`.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    async fn record(
        &self,
        ic: &IngressController,
        event_type: EventType,
        reason: &str,
        message: &str,
    );
}

/// [`EventRecorder`] that creates core/v1 `Event` objects.
#[derive(Clone)]
pub struct KubeEventRecorder {
    client: Client,
}

impl KubeEventRecorder {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Build the `Event` for an `IngressController`.
#[must_use]
pub fn build_event(
    ic: &IngressController,
    event_type: EventType,
    reason: &str,
    message: &str,
) -> Event {
    let namespace = ic.namespace().unwrap_or_default();
    let name = ic.name_any();
    let now = Time(k8s_openapi::jiff::Timestamp::now());

    Event {
        metadata: ObjectMeta {
            generate_name: Some(format!("{name}.")),
            namespace: Some(namespace.clone()),
            ..Default::default()
        },
        involved_object: ObjectReference {
            api_version: Some(IngressController::api_version(&()).to_string()),
            kind: Some(IngressController::kind(&()).to_string()),
            name: Some(name),
            namespace: Some(namespace),
            uid: ic.meta().uid.clone(),
            resource_version: ic.meta().resource_version.clone(),
            ..Default::default()
        },
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        type_: Some(event_type.as_str().to_string()),
        source: Some(EventSource {
            component: Some(CONTROLLER_NAME.to_string()),
            ..Default::default()
        }),
        reporting_component: Some(CONTROLLER_NAME.to_string()),
        first_timestamp: Some(now.clone()),
        last_timestamp: Some(now),
        count: Some(1),
        ..Default::default()
    }
}

#[async_trait]
impl EventRecorder for KubeEventRecorder {
    async fn record(
        &self,
        ic: &IngressController,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        let event = build_event(ic, event_type, reason, message);
        let namespace = ic.namespace().unwrap_or_default();
        let api: Api<Event> = Api::namespaced(self.client.clone(), &namespace);

        match api.create(&PostParams::default(), &event).await {
            Ok(_) => debug!(
                "Recorded {} event {} for {}/{}",
                event_type,
                reason,
                namespace,
                ic.name_any()
            ),
            Err(e) => warn!("Failed to create event for {}: {}", ic.name_any(), e),
        }
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod events_tests;
