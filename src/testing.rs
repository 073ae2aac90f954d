// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory cluster and event recorder used by the reconciler unit tests.
//!
//! [`FakeClusterClient`] behaves like a small API server: it assigns `uid`s and
//! `resourceVersion`s, rejects stale updates with a 409, finalizes an
//! `IngressController` once its deletion timestamp is set and its finalizers are
//! gone, and counts every write. Failures can be injected per owned variant and
//! the deletion of `DNSRecord`s can be delayed by a number of reads.

use crate::client::{ClusterClient, ObjectKey, OwnedKind, OwnedResource};
use crate::constants::{CLUSTER_CONFIG_NAME, DEFAULT_OPERATOR_NAMESPACE};
use crate::crd::{
    DNSZone, DnsConfig, DnsConfigSpec, Infrastructure, InfrastructureSpec, InfrastructureStatus,
    IngressConfig, IngressConfigSpec, IngressController, IngressControllerSpec, PlatformType,
};
use crate::errors::StoreError;
use crate::events::{EventRecorder, EventType};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::DeploymentStatus;
use k8s_openapi::api::core::v1::{
    Event, LoadBalancerIngress, LoadBalancerStatus, ObjectReference, ServiceStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::ResourceExt;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Build a kube API error with the given HTTP status code.
pub fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
    kube::Error::Api(
        kube::core::Status::failure(message, reason)
            .with_code(code)
            .boxed(),
    )
}

fn injected(what: &str) -> StoreError {
    StoreError::from(api_error(500, "InternalError", &format!("injected {what} failure")))
}

/// An `IngressController` in the operator namespace with an optional requested domain.
pub fn ingress_controller(name: &str, domain: Option<&str>) -> IngressController {
    let mut ic = IngressController::new(
        name,
        IngressControllerSpec {
            domain: domain.map(str::to_string),
            ..Default::default()
        },
    );
    ic.metadata.namespace = Some(DEFAULT_OPERATOR_NAMESPACE.to_string());
    ic
}

pub fn dns_config(with_zones: bool) -> DnsConfig {
    let zone = with_zones.then(|| DNSZone {
        id: Some("Z123".into()),
        tags: None,
    });
    DnsConfig::new(
        CLUSTER_CONFIG_NAME,
        DnsConfigSpec {
            base_domain: "example.com".into(),
            public_zone: zone.clone(),
            private_zone: zone,
        },
    )
}

pub fn infrastructure(platform: Option<PlatformType>) -> Infrastructure {
    let mut infra = Infrastructure::new(CLUSTER_CONFIG_NAME, InfrastructureSpec {});
    infra.status = Some(InfrastructureStatus { platform });
    infra
}

pub fn ingress_config(domain: &str) -> IngressConfig {
    IngressConfig::new(
        CLUSTER_CONFIG_NAME,
        IngressConfigSpec {
            domain: domain.into(),
        },
    )
}

#[derive(Default)]
struct State {
    ingress_controllers: BTreeMap<ObjectKey, IngressController>,
    owned: BTreeMap<(OwnedKind, ObjectKey), OwnedResource>,
    events: Vec<Event>,
    dns_config: Option<DnsConfig>,
    infrastructure: Option<Infrastructure>,
    ingress_config: Option<IngressConfig>,

    next_version: u64,
    /// Remaining reads for which a deleted `DNSRecord` stays observable.
    dns_pending_reads: BTreeMap<ObjectKey, u32>,
    dns_delete_latency: u32,

    failing_writes: BTreeSet<OwnedKind>,
    failing_deletes: BTreeSet<OwnedKind>,
    failing_reads: BTreeSet<OwnedKind>,
    fail_ic_updates: bool,
    fail_status_updates: bool,
    fail_list: bool,
    fail_dns_config: bool,

    ic_writes: usize,
    status_writes: usize,
    owned_creates: usize,
    owned_updates: usize,
    owned_deletes: usize,
}

impl State {
    fn stamp(&mut self, meta: &mut ObjectMeta) {
        self.next_version += 1;
        meta.resource_version = Some(self.next_version.to_string());
        if meta.uid.is_none() {
            meta.uid = Some(format!("uid-{}", meta.name.clone().unwrap_or_default()));
        }
    }
}

/// In-memory [`ClusterClient`].
pub struct FakeClusterClient {
    state: Mutex<State>,
}

impl Default for FakeClusterClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClusterClient {
    /// A cluster on AWS with DNS zones and `apps.example.com` as default ingress domain.
    pub fn new() -> Self {
        let state = State {
            dns_config: Some(dns_config(true)),
            infrastructure: Some(infrastructure(Some(PlatformType::AWS))),
            ingress_config: Some(ingress_config("apps.example.com")),
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_dns_config(&self, dns: DnsConfig) {
        self.state().dns_config = Some(dns);
    }

    pub fn set_platform(&self, platform: Option<PlatformType>) {
        self.state().infrastructure = Some(infrastructure(platform));
    }

    pub fn set_ingress_domain(&self, domain: &str) {
        self.state().ingress_config = Some(ingress_config(domain));
    }

    /// Store an `IngressController` as-is (status included), assigning identity.
    pub fn insert_ingress_controller(&self, mut ic: IngressController) -> IngressController {
        let mut state = self.state();
        if ic.metadata.generation.is_none() {
            ic.metadata.generation = Some(1);
        }
        state.stamp(&mut ic.metadata);
        state
            .ingress_controllers
            .insert(ObjectKey::of(&ic), ic.clone());
        ic
    }

    pub fn ingress_controller(&self, key: &ObjectKey) -> Option<IngressController> {
        self.state().ingress_controllers.get(key).cloned()
    }

    /// Set the deletion timestamp of a stored `IngressController`.
    pub fn mark_for_deletion(&self, key: &ObjectKey) {
        let mut state = self.state();
        if let Some(ic) = state.ingress_controllers.get_mut(key) {
            ic.metadata.deletion_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
        }
    }

    /// Store an owned resource as-is, assigning identity.
    pub fn insert_owned(&self, mut resource: OwnedResource) -> OwnedResource {
        let mut state = self.state();
        state.stamp(resource.meta_mut());
        state
            .owned
            .insert((resource.kind(), resource.key()), resource.clone());
        resource
    }

    pub fn owned(&self, kind: OwnedKind, key: &ObjectKey) -> Option<OwnedResource> {
        self.state().owned.get(&(kind, key.clone())).cloned()
    }

    /// Give the load balancer service an ingress point.
    pub fn set_load_balancer_ingress(
        &self,
        key: &ObjectKey,
        hostname: Option<&str>,
        ip: Option<&str>,
    ) {
        let mut state = self.state();
        if let Some(OwnedResource::LoadBalancerService(svc)) = state
            .owned
            .get_mut(&(OwnedKind::LoadBalancerService, key.clone()))
        {
            svc.status = Some(ServiceStatus {
                load_balancer: Some(LoadBalancerStatus {
                    ingress: Some(vec![LoadBalancerIngress {
                        hostname: hostname.map(str::to_string),
                        ip: ip.map(str::to_string),
                        ..Default::default()
                    }]),
                }),
                ..Default::default()
            });
        }
    }

    /// Report `available` ready replicas on the router deployment.
    pub fn set_deployment_available(&self, key: &ObjectKey, available: i32) {
        let mut state = self.state();
        if let Some(OwnedResource::Workload(deployment)) =
            state.owned.get_mut(&(OwnedKind::Workload, key.clone()))
        {
            deployment.status = Some(DeploymentStatus {
                available_replicas: Some(available),
                ..Default::default()
            });
        }
    }

    /// Add a core/v1 `Event` about an object in `namespace`.
    pub fn add_event(
        &self,
        namespace: &str,
        involved_kind: &str,
        involved_name: &str,
        event_type: &str,
        reason: &str,
        message: &str,
        age_secs: i64,
    ) {
        let when = Time(k8s_openapi::jiff::Timestamp::now() - k8s_openapi::jiff::SignedDuration::from_secs(age_secs));
        self.state().events.push(Event {
            metadata: ObjectMeta {
                name: Some(format!("{involved_name}.{reason}.{age_secs}")),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            involved_object: ObjectReference {
                kind: Some(involved_kind.to_string()),
                name: Some(involved_name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            type_: Some(event_type.to_string()),
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            last_timestamp: Some(when),
            ..Default::default()
        });
    }

    /// Deleted `DNSRecord`s remain readable for `reads` further reads.
    pub fn set_dns_delete_latency(&self, reads: u32) {
        self.state().dns_delete_latency = reads;
    }

    /// Creates and updates of `kind` fail.
    pub fn fail_writes(&self, kind: OwnedKind) {
        self.state().failing_writes.insert(kind);
    }

    pub fn fail_deletes(&self, kind: OwnedKind) {
        self.state().failing_deletes.insert(kind);
    }

    pub fn fail_reads(&self, kind: OwnedKind) {
        self.state().failing_reads.insert(kind);
    }

    pub fn fail_ingress_controller_updates(&self) {
        self.state().fail_ic_updates = true;
    }

    pub fn fail_status_updates(&self) {
        self.state().fail_status_updates = true;
    }

    pub fn fail_list_ingress_controllers(&self) {
        self.state().fail_list = true;
    }

    pub fn fail_dns_config(&self) {
        self.state().fail_dns_config = true;
    }

    pub fn ingress_controller_writes(&self) -> usize {
        self.state().ic_writes
    }

    pub fn status_writes(&self) -> usize {
        self.state().status_writes
    }

    pub fn owned_creates(&self) -> usize {
        self.state().owned_creates
    }

    pub fn owned_updates(&self) -> usize {
        self.state().owned_updates
    }

    pub fn owned_deletes(&self) -> usize {
        self.state().owned_deletes
    }

    /// Every successful write of any kind.
    pub fn total_writes(&self) -> usize {
        let state = self.state();
        state.ic_writes
            + state.status_writes
            + state.owned_creates
            + state.owned_updates
            + state.owned_deletes
    }
}

fn check_version(current: &ObjectMeta, incoming: &ObjectMeta) -> Result<(), StoreError> {
    match incoming.resource_version.as_ref() {
        Some(v) if current.resource_version.as_ref() != Some(v) => Err(StoreError::from(
            api_error(409, "Conflict", "the object has been modified"),
        )),
        _ => Ok(()),
    }
}

#[async_trait]
impl ClusterClient for FakeClusterClient {
    async fn get_ingress_controller(
        &self,
        key: &ObjectKey,
    ) -> Result<Option<IngressController>, StoreError> {
        Ok(self.state().ingress_controllers.get(key).cloned())
    }

    async fn list_ingress_controllers(
        &self,
        namespace: &str,
    ) -> Result<Vec<IngressController>, StoreError> {
        let state = self.state();
        if state.fail_list {
            return Err(injected("list"));
        }
        Ok(state
            .ingress_controllers
            .values()
            .filter(|ic| ic.namespace().as_deref() == Some(namespace))
            .cloned()
            .collect())
    }

    async fn update_ingress_controller(
        &self,
        ic: &IngressController,
    ) -> Result<IngressController, StoreError> {
        let mut state = self.state();
        if state.fail_ic_updates {
            return Err(injected("ingresscontroller update"));
        }
        let key = ObjectKey::of(ic);
        let current = state
            .ingress_controllers
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::from(api_error(404, "NotFound", "not found")))?;
        check_version(&current.metadata, &ic.metadata)?;

        let mut updated = ic.clone();
        updated.status = current.status.clone();
        updated.metadata.uid = current.metadata.uid.clone();
        updated.metadata.deletion_timestamp = current.metadata.deletion_timestamp.clone();
        state.stamp(&mut updated.metadata);
        state.ic_writes += 1;

        let finalized = updated.metadata.deletion_timestamp.is_some()
            && updated.finalizers().is_empty();
        if finalized {
            state.ingress_controllers.remove(&key);
        } else {
            state.ingress_controllers.insert(key, updated.clone());
        }
        Ok(updated)
    }

    async fn update_ingress_controller_status(
        &self,
        ic: &IngressController,
    ) -> Result<IngressController, StoreError> {
        let mut state = self.state();
        if state.fail_status_updates {
            return Err(injected("status update"));
        }
        let key = ObjectKey::of(ic);
        let mut current = state
            .ingress_controllers
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::from(api_error(404, "NotFound", "not found")))?;
        check_version(&current.metadata, &ic.metadata)?;

        current.status = ic.status.clone();
        state.stamp(&mut current.metadata);
        state.status_writes += 1;
        state.ingress_controllers.insert(key, current.clone());
        Ok(current)
    }

    async fn get_dns_config(&self) -> Result<DnsConfig, StoreError> {
        let state = self.state();
        if state.fail_dns_config {
            return Err(injected("dns config"));
        }
        state
            .dns_config
            .clone()
            .ok_or_else(|| StoreError::from(api_error(404, "NotFound", "dns not found")))
    }

    async fn get_infrastructure(&self) -> Result<Infrastructure, StoreError> {
        self.state()
            .infrastructure
            .clone()
            .ok_or_else(|| StoreError::from(api_error(404, "NotFound", "infrastructure not found")))
    }

    async fn get_ingress_config(&self) -> Result<IngressConfig, StoreError> {
        self.state()
            .ingress_config
            .clone()
            .ok_or_else(|| StoreError::from(api_error(404, "NotFound", "ingress not found")))
    }

    async fn get_owned(
        &self,
        kind: OwnedKind,
        key: &ObjectKey,
    ) -> Result<Option<OwnedResource>, StoreError> {
        let mut state = self.state();
        if state.failing_reads.contains(&kind) {
            return Err(injected(&format!("{kind} get")));
        }
        if kind == OwnedKind::DnsRecord {
            if let Some(remaining) = state.dns_pending_reads.get(key).copied() {
                if remaining == 0 {
                    state.dns_pending_reads.remove(key);
                    state.owned.remove(&(kind, key.clone()));
                    return Ok(None);
                }
                state.dns_pending_reads.insert(key.clone(), remaining - 1);
            }
        }
        Ok(state.owned.get(&(kind, key.clone())).cloned())
    }

    async fn create_owned(&self, resource: &OwnedResource) -> Result<OwnedResource, StoreError> {
        let mut state = self.state();
        let kind = resource.kind();
        if state.failing_writes.contains(&kind) {
            return Err(injected(&format!("{kind} create")));
        }
        let key = resource.key();
        if state.owned.contains_key(&(kind, key.clone())) {
            return Err(StoreError::from(api_error(
                409,
                "AlreadyExists",
                &format!("{kind} {key} already exists"),
            )));
        }
        let mut created = resource.clone();
        state.stamp(created.meta_mut());
        state.owned_creates += 1;
        state.owned.insert((kind, key), created.clone());
        Ok(created)
    }

    async fn update_owned(&self, resource: &OwnedResource) -> Result<OwnedResource, StoreError> {
        let mut state = self.state();
        let kind = resource.kind();
        if state.failing_writes.contains(&kind) {
            return Err(injected(&format!("{kind} update")));
        }
        let key = resource.key();
        let current = state
            .owned
            .get(&(kind, key.clone()))
            .cloned()
            .ok_or_else(|| StoreError::from(api_error(404, "NotFound", "not found")))?;
        check_version(current.meta(), resource.meta())?;

        let mut updated = resource.clone();
        state.stamp(updated.meta_mut());
        state.owned_updates += 1;
        state.owned.insert((kind, key), updated.clone());
        Ok(updated)
    }

    async fn delete_owned(&self, kind: OwnedKind, key: &ObjectKey) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.failing_deletes.contains(&kind) {
            return Err(injected(&format!("{kind} delete")));
        }
        let slot = (kind, key.clone());
        if !state.owned.contains_key(&slot) {
            return Ok(());
        }
        state.owned_deletes += 1;

        let latency = state.dns_delete_latency;
        if kind == OwnedKind::DnsRecord && latency > 0 {
            if !state.dns_pending_reads.contains_key(key) {
                state.dns_pending_reads.insert(key.clone(), latency);
                if let Some(record) = state.owned.get_mut(&slot) {
                    record.meta_mut().deletion_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
                }
            }
            return Ok(());
        }
        state.owned.remove(&slot);
        Ok(())
    }

    async fn list_events(&self, namespace: &str) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .state()
            .events
            .iter()
            .filter(|e| e.metadata.namespace.as_deref() == Some(namespace))
            .cloned()
            .collect())
    }
}

/// One event captured by [`RecordingEventRecorder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub object: String,
    pub event_type: EventType,
    pub reason: String,
    pub message: String,
}

/// [`EventRecorder`] that keeps every event in memory.
#[derive(Default)]
pub struct RecordingEventRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRecorder for RecordingEventRecorder {
    async fn record(
        &self,
        ic: &IngressController,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        self.events.lock().unwrap().push(RecordedEvent {
            object: ObjectKey::of(ic).to_string(),
            event_type,
            reason: reason.to_string(),
            message: message.to_string(),
        });
    }
}
