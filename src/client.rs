// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Read/write access to the cluster for the ingress reconcilers.
//!
//! The reconcilers never talk to `kube::Api` directly. They go through the
//! [`ClusterClient`] trait, which is implemented by [`KubeClusterClient`] for a
//! live cluster and by an in-memory store in unit tests.
//!
//! Owned resources are addressed through a closed set of variants
//! ([`OwnedKind`] / [`OwnedResource`]) so that each variant gets its own
//! ensure function and dispatch happens by tag.

use crate::constants::{CLUSTER_CONFIG_NAME, FIELD_MANAGER};
use crate::crd::{
    DNSRecord, DnsConfig, Infrastructure, IngressConfig, IngressController, ServiceMonitor,
};
use crate::errors::StoreError;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Event, Service};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use tracing::debug;

/// Namespace and name of a namespaced object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an existing object, from its metadata.
    #[must_use]
    pub fn of<K: ResourceExt>(obj: &K) -> Self {
        Self::new(obj.namespace().unwrap_or_default(), obj.name_any())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Variant tag of a resource owned by an `IngressController`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OwnedKind {
    /// Router `Deployment`.
    Workload,
    /// `LoadBalancer` `Service` publishing the router.
    LoadBalancerService,
    /// `ClusterIP` `Service` in front of the router metrics port.
    InternalService,
    /// Wildcard `DNSRecord` pointing at the load balancer.
    DnsRecord,
    /// `ServiceMonitor` scraping the internal service.
    MetricsMonitor,
    /// rsyslog `ConfigMap` for the access-log sidecar.
    LoggingConfig,
    /// `PodDisruptionBudget` for the router pods.
    DisruptionBudget,
}

impl OwnedKind {
    /// Every variant, in convergence order.
    pub const ALL: [OwnedKind; 7] = [
        OwnedKind::Workload,
        OwnedKind::LoadBalancerService,
        OwnedKind::InternalService,
        OwnedKind::DnsRecord,
        OwnedKind::MetricsMonitor,
        OwnedKind::LoggingConfig,
        OwnedKind::DisruptionBudget,
    ];

    /// Lowercase label used in logs, error messages and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OwnedKind::Workload => "deployment",
            OwnedKind::LoadBalancerService => "load balancer service",
            OwnedKind::InternalService => "internal service",
            OwnedKind::DnsRecord => "dnsrecord",
            OwnedKind::MetricsMonitor => "servicemonitor",
            OwnedKind::LoggingConfig => "rsyslog configmap",
            OwnedKind::DisruptionBudget => "poddisruptionbudget",
        }
    }
}

impl fmt::Display for OwnedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource owned by an `IngressController`, tagged by variant.
#[derive(Clone, Debug)]
pub enum OwnedResource {
    Workload(Deployment),
    LoadBalancerService(Service),
    InternalService(Service),
    DnsRecord(DNSRecord),
    MetricsMonitor(ServiceMonitor),
    LoggingConfig(ConfigMap),
    DisruptionBudget(PodDisruptionBudget),
}

impl OwnedResource {
    #[must_use]
    pub fn kind(&self) -> OwnedKind {
        match self {
            OwnedResource::Workload(_) => OwnedKind::Workload,
            OwnedResource::LoadBalancerService(_) => OwnedKind::LoadBalancerService,
            OwnedResource::InternalService(_) => OwnedKind::InternalService,
            OwnedResource::DnsRecord(_) => OwnedKind::DnsRecord,
            OwnedResource::MetricsMonitor(_) => OwnedKind::MetricsMonitor,
            OwnedResource::LoggingConfig(_) => OwnedKind::LoggingConfig,
            OwnedResource::DisruptionBudget(_) => OwnedKind::DisruptionBudget,
        }
    }

    #[must_use]
    pub fn meta(&self) -> &ObjectMeta {
        match self {
            OwnedResource::Workload(o) => &o.metadata,
            OwnedResource::LoadBalancerService(o) | OwnedResource::InternalService(o) => {
                &o.metadata
            }
            OwnedResource::DnsRecord(o) => &o.metadata,
            OwnedResource::MetricsMonitor(o) => &o.metadata,
            OwnedResource::LoggingConfig(o) => &o.metadata,
            OwnedResource::DisruptionBudget(o) => &o.metadata,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            OwnedResource::Workload(o) => &mut o.metadata,
            OwnedResource::LoadBalancerService(o) | OwnedResource::InternalService(o) => {
                &mut o.metadata
            }
            OwnedResource::DnsRecord(o) => &mut o.metadata,
            OwnedResource::MetricsMonitor(o) => &mut o.metadata,
            OwnedResource::LoggingConfig(o) => &mut o.metadata,
            OwnedResource::DisruptionBudget(o) => &mut o.metadata,
        }
    }

    /// Namespace and name from metadata (empty strings when unset).
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        let meta = self.meta();
        ObjectKey::new(
            meta.namespace.clone().unwrap_or_default(),
            meta.name.clone().unwrap_or_default(),
        )
    }

    #[must_use]
    pub fn into_deployment(self) -> Option<Deployment> {
        match self {
            OwnedResource::Workload(d) => Some(d),
            _ => None,
        }
    }

    /// The wrapped `Service`, for either service variant.
    #[must_use]
    pub fn into_service(self) -> Option<Service> {
        match self {
            OwnedResource::LoadBalancerService(s) | OwnedResource::InternalService(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_dns_record(self) -> Option<DNSRecord> {
        match self {
            OwnedResource::DnsRecord(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_service_monitor(self) -> Option<ServiceMonitor> {
        match self {
            OwnedResource::MetricsMonitor(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_config_map(self) -> Option<ConfigMap> {
        match self {
            OwnedResource::LoggingConfig(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_pod_disruption_budget(self) -> Option<PodDisruptionBudget> {
        match self {
            OwnedResource::DisruptionBudget(p) => Some(p),
            _ => None,
        }
    }
}

/// Cluster access used by the ingress reconcilers.
///
/// Reads are expected to be cheap and may be served from a cache. Writes are
/// single-shot: a conflicting update surfaces as [`StoreError::Conflict`] and is
/// retried on the next pass with fresh state.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch an `IngressController`; `Ok(None)` when it does not exist.
    async fn get_ingress_controller(
        &self,
        key: &ObjectKey,
    ) -> Result<Option<IngressController>, StoreError>;

    /// List the `IngressController`s in a namespace.
    async fn list_ingress_controllers(
        &self,
        namespace: &str,
    ) -> Result<Vec<IngressController>, StoreError>;

    /// Update metadata and spec of an `IngressController` (conflict-checked).
    async fn update_ingress_controller(
        &self,
        ic: &IngressController,
    ) -> Result<IngressController, StoreError>;

    /// Write the status subresource of an `IngressController`.
    async fn update_ingress_controller_status(
        &self,
        ic: &IngressController,
    ) -> Result<IngressController, StoreError>;

    /// The cluster `DNS` configuration singleton.
    async fn get_dns_config(&self) -> Result<DnsConfig, StoreError>;

    /// The cluster `Infrastructure` singleton.
    async fn get_infrastructure(&self) -> Result<Infrastructure, StoreError>;

    /// The cluster `Ingress` configuration singleton.
    async fn get_ingress_config(&self) -> Result<IngressConfig, StoreError>;

    /// Fetch an owned resource by variant; `Ok(None)` when it does not exist.
    async fn get_owned(
        &self,
        kind: OwnedKind,
        key: &ObjectKey,
    ) -> Result<Option<OwnedResource>, StoreError>;

    async fn create_owned(&self, resource: &OwnedResource) -> Result<OwnedResource, StoreError>;

    async fn update_owned(&self, resource: &OwnedResource) -> Result<OwnedResource, StoreError>;

    /// Delete an owned resource. Deleting an absent resource succeeds.
    async fn delete_owned(&self, kind: OwnedKind, key: &ObjectKey) -> Result<(), StoreError>;

    /// List core/v1 `Event`s in a namespace.
    async fn list_events(&self, namespace: &str) -> Result<Vec<Event>, StoreError>;
}

/// [`ClusterClient`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }

    async fn get_opt<K>(&self, key: &ObjectKey) -> Result<Option<K>, StoreError>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + fmt::Debug
            + DeserializeOwned,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get_opt(&key.name).await?)
    }

    async fn create<K>(&self, obj: &K) -> Result<K, StoreError>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + fmt::Debug
            + Serialize
            + DeserializeOwned,
    {
        let namespace = obj
            .meta()
            .namespace
            .clone()
            .ok_or_else(|| {
                StoreError::InvalidObject(format!("{} has no namespace", K::kind(&())))
            })?;
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        Ok(api.create(&Self::post_params(), obj).await?)
    }

    async fn replace<K>(&self, obj: &K) -> Result<K, StoreError>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + fmt::Debug
            + Serialize
            + DeserializeOwned,
    {
        let key = ObjectKey::new(
            obj.meta().namespace.clone().unwrap_or_default(),
            obj.meta()
                .name
                .clone()
                .ok_or_else(|| StoreError::InvalidObject(format!("{} has no name", K::kind(&()))))?,
        );
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.replace(&key.name, &Self::post_params(), obj).await?)
    }

    async fn delete<K>(&self, key: &ObjectKey) -> Result<(), StoreError>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + fmt::Debug
            + DeserializeOwned,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);
        match api.delete(&key.name, &DeleteParams::background()).await {
            Ok(_) => {
                debug!("Requested deletion of {} {}", K::kind(&()), key);
                Ok(())
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                debug!("{} {} already deleted", K::kind(&()), key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_ingress_controller(
        &self,
        key: &ObjectKey,
    ) -> Result<Option<IngressController>, StoreError> {
        self.get_opt(key).await
    }

    async fn list_ingress_controllers(
        &self,
        namespace: &str,
    ) -> Result<Vec<IngressController>, StoreError> {
        let api: Api<IngressController> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn update_ingress_controller(
        &self,
        ic: &IngressController,
    ) -> Result<IngressController, StoreError> {
        self.replace(ic).await
    }

    async fn update_ingress_controller_status(
        &self,
        ic: &IngressController,
    ) -> Result<IngressController, StoreError> {
        let key = ObjectKey::of(ic);
        let api: Api<IngressController> = Api::namespaced(self.client.clone(), &key.namespace);
        let patch = json!({
            "metadata": { "resourceVersion": ic.metadata.resource_version },
            "status": ic.status,
        });
        Ok(api
            .patch_status(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?)
    }

    async fn get_dns_config(&self) -> Result<DnsConfig, StoreError> {
        let api: Api<DnsConfig> = Api::all(self.client.clone());
        Ok(api.get(CLUSTER_CONFIG_NAME).await?)
    }

    async fn get_infrastructure(&self) -> Result<Infrastructure, StoreError> {
        let api: Api<Infrastructure> = Api::all(self.client.clone());
        Ok(api.get(CLUSTER_CONFIG_NAME).await?)
    }

    async fn get_ingress_config(&self) -> Result<IngressConfig, StoreError> {
        let api: Api<IngressConfig> = Api::all(self.client.clone());
        Ok(api.get(CLUSTER_CONFIG_NAME).await?)
    }

    async fn get_owned(
        &self,
        kind: OwnedKind,
        key: &ObjectKey,
    ) -> Result<Option<OwnedResource>, StoreError> {
        Ok(match kind {
            OwnedKind::Workload => self
                .get_opt::<Deployment>(key)
                .await?
                .map(OwnedResource::Workload),
            OwnedKind::LoadBalancerService => self
                .get_opt::<Service>(key)
                .await?
                .map(OwnedResource::LoadBalancerService),
            OwnedKind::InternalService => self
                .get_opt::<Service>(key)
                .await?
                .map(OwnedResource::InternalService),
            OwnedKind::DnsRecord => self
                .get_opt::<DNSRecord>(key)
                .await?
                .map(OwnedResource::DnsRecord),
            OwnedKind::MetricsMonitor => self
                .get_opt::<ServiceMonitor>(key)
                .await?
                .map(OwnedResource::MetricsMonitor),
            OwnedKind::LoggingConfig => self
                .get_opt::<ConfigMap>(key)
                .await?
                .map(OwnedResource::LoggingConfig),
            OwnedKind::DisruptionBudget => self
                .get_opt::<PodDisruptionBudget>(key)
                .await?
                .map(OwnedResource::DisruptionBudget),
        })
    }

    async fn create_owned(&self, resource: &OwnedResource) -> Result<OwnedResource, StoreError> {
        Ok(match resource {
            OwnedResource::Workload(o) => OwnedResource::Workload(self.create(o).await?),
            OwnedResource::LoadBalancerService(o) => {
                OwnedResource::LoadBalancerService(self.create(o).await?)
            }
            OwnedResource::InternalService(o) => {
                OwnedResource::InternalService(self.create(o).await?)
            }
            OwnedResource::DnsRecord(o) => OwnedResource::DnsRecord(self.create(o).await?),
            OwnedResource::MetricsMonitor(o) => {
                OwnedResource::MetricsMonitor(self.create(o).await?)
            }
            OwnedResource::LoggingConfig(o) => OwnedResource::LoggingConfig(self.create(o).await?),
            OwnedResource::DisruptionBudget(o) => {
                OwnedResource::DisruptionBudget(self.create(o).await?)
            }
        })
    }

    async fn update_owned(&self, resource: &OwnedResource) -> Result<OwnedResource, StoreError> {
        Ok(match resource {
            OwnedResource::Workload(o) => OwnedResource::Workload(self.replace(o).await?),
            OwnedResource::LoadBalancerService(o) => {
                OwnedResource::LoadBalancerService(self.replace(o).await?)
            }
            OwnedResource::InternalService(o) => {
                OwnedResource::InternalService(self.replace(o).await?)
            }
            OwnedResource::DnsRecord(o) => OwnedResource::DnsRecord(self.replace(o).await?),
            OwnedResource::MetricsMonitor(o) => {
                OwnedResource::MetricsMonitor(self.replace(o).await?)
            }
            OwnedResource::LoggingConfig(o) => {
                OwnedResource::LoggingConfig(self.replace(o).await?)
            }
            OwnedResource::DisruptionBudget(o) => {
                OwnedResource::DisruptionBudget(self.replace(o).await?)
            }
        })
    }

    async fn delete_owned(&self, kind: OwnedKind, key: &ObjectKey) -> Result<(), StoreError> {
        match kind {
            OwnedKind::Workload => self.delete::<Deployment>(key).await,
            OwnedKind::LoadBalancerService | OwnedKind::InternalService => {
                self.delete::<Service>(key).await
            }
            OwnedKind::DnsRecord => self.delete::<DNSRecord>(key).await,
            OwnedKind::MetricsMonitor => self.delete::<ServiceMonitor>(key).await,
            OwnedKind::LoggingConfig => self.delete::<ConfigMap>(key).await,
            OwnedKind::DisruptionBudget => self.delete::<PodDisruptionBudget>(key).await,
        }
    }

    async fn list_events(&self, namespace: &str) -> Result<Vec<Event>, StoreError> {
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
