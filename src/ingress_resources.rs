// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Router Kubernetes resource builders
//!
//! This module builds the resources owned by an `IngressController` (`Deployment`,
//! `Service`s, `DNSRecord`, `ServiceMonitor`, `ConfigMap`, `PodDisruptionBudget`)
//! and decides whether an existing resource has drifted from its desired shape.
//! All functions are pure and easily testable.

use crate::client::{ObjectKey, OwnedResource};
use crate::constants::{
    APPS_API_GROUP_VERSION, DEFAULT_ROUTER_REPLICAS, KIND_DEPLOYMENT, KIND_INGRESS_CONTROLLER,
    OPERATOR_API_GROUP_VERSION, ROUTER_CONTAINER_NAME, ROUTER_HTTPS_PORT, ROUTER_HTTP_PORT,
    ROUTER_MAX_UNAVAILABLE, ROUTER_METRICS_PORT, ROUTER_SERVICE_ACCOUNT, SYSLOG_CONTAINER_NAME,
    WILDCARD_RECORD_TTL_SECS,
};
use crate::crd::{
    AccessLogging, DNSRecord, DNSRecordSpec, DNSRecordType, EndpointPublishingStrategy,
    EndpointPublishingStrategyType, EndpointTlsConfig, IngressController, LoadBalancerScope,
    LoggingDestinationType, MonitorEndpoint, NamespaceSelector, PlatformType, ServiceMonitor,
    ServiceMonitorSpec,
};
use crate::labels::{
    APP_NAME_ROUTER, AWS_INTERNAL_LB_ANNOTATION, AWS_LB_PROXY_PROTOCOL_ANNOTATION,
    AZURE_INTERNAL_LB_ANNOTATION, COMPONENT_ROUTER, DEPLOYMENT_POD_LABEL,
    GCP_INTERNAL_LB_ANNOTATION, K8S_COMPONENT, K8S_MANAGED_BY, K8S_NAME,
    MANAGED_BY_INGRESS_OPERATOR, OWNING_INGRESS_CONTROLLER_LABEL, SERVING_CERT_SECRET_ANNOTATION,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, ContainerPort, EmptyDirVolumeSource, EnvVar,
    HTTPGetAction, PodSpec, PodTemplateSpec, Probe, SecretVolumeSource, Service, ServicePort,
    ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::api::policy::v1::{PodDisruptionBudget, PodDisruptionBudgetSpec};
use k8s_openapi::apimachinery::pkg::{
    apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference},
    util::intstr::IntOrString,
};
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::debug;

const METRICS_CERTS_MOUNT_PATH: &str = "/etc/pki/tls/metrics-certs";
const RSYSLOG_CONFIG_MOUNT_PATH: &str = "/etc/rsyslog";
const RSYSLOG_SOCKET_MOUNT_PATH: &str = "/var/lib/rsyslog";
const RSYSLOG_CONF_KEY: &str = "rsyslog.conf";
const DEFAULT_SYSLOG_FACILITY: &str = "local1";
const VOLUME_METRICS_CERTS: &str = "metrics-certs";
const VOLUME_RSYSLOG_CONFIG: &str = "rsyslog-config";
const VOLUME_RSYSLOG_SOCKET: &str = "rsyslog-socket";
const SERVICE_CA_FILE: &str = "/etc/prometheus/configmaps/serving-certs-ca-bundle/service-ca.crt";
const SERVICE_ACCOUNT_TOKEN_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

// ============================================================================
// Names
// ============================================================================

/// Key of the router `Deployment`: `router-<ic>` in the operand namespace.
#[must_use]
pub fn router_deployment_key(ic: &IngressController, operand_namespace: &str) -> ObjectKey {
    ObjectKey::new(operand_namespace, format!("router-{}", ic.name_any()))
}

/// Key of the load balancer `Service`: `router-<ic>` in the operand namespace.
#[must_use]
pub fn load_balancer_service_key(ic: &IngressController, operand_namespace: &str) -> ObjectKey {
    ObjectKey::new(operand_namespace, format!("router-{}", ic.name_any()))
}

/// Key of the internal `Service`: `router-internal-<ic>` in the operand namespace.
#[must_use]
pub fn internal_service_key(ic: &IngressController, operand_namespace: &str) -> ObjectKey {
    ObjectKey::new(operand_namespace, format!("router-internal-{}", ic.name_any()))
}

/// Key of the wildcard `DNSRecord`: `<ic>-wildcard` next to the `IngressController`.
#[must_use]
pub fn wildcard_record_key(ic: &IngressController) -> ObjectKey {
    ObjectKey::new(
        ic.namespace().unwrap_or_default(),
        format!("{}-wildcard", ic.name_any()),
    )
}

#[must_use]
pub fn service_monitor_key(ic: &IngressController, operand_namespace: &str) -> ObjectKey {
    ObjectKey::new(operand_namespace, format!("router-{}", ic.name_any()))
}

#[must_use]
pub fn rsyslog_configmap_key(ic: &IngressController, operand_namespace: &str) -> ObjectKey {
    ObjectKey::new(operand_namespace, format!("rsyslog-conf-{}", ic.name_any()))
}

#[must_use]
pub fn pod_disruption_budget_key(ic: &IngressController, operand_namespace: &str) -> ObjectKey {
    ObjectKey::new(operand_namespace, format!("router-{}", ic.name_any()))
}

fn metrics_certs_secret_name(ic: &IngressController) -> String {
    format!("router-metrics-certs-{}", ic.name_any())
}

// ============================================================================
// Effective values
// ============================================================================

/// Effective domain from status, if admission has set one.
#[must_use]
pub fn effective_domain(ic: &IngressController) -> Option<&str> {
    ic.status
        .as_ref()
        .and_then(|s| s.domain.as_deref())
        .filter(|d| !d.is_empty())
}

/// Effective publishing strategy from status, if admission has set one.
#[must_use]
pub fn effective_strategy(ic: &IngressController) -> Option<&EndpointPublishingStrategy> {
    ic.status
        .as_ref()
        .and_then(|s| s.endpoint_publishing_strategy.as_ref())
}

/// Returns `true` when the effective strategy publishes through a managed load balancer.
#[must_use]
pub fn wants_load_balancer(ic: &IngressController) -> bool {
    effective_strategy(ic).is_some_and(EndpointPublishingStrategy::wants_load_balancer)
}

fn access_logging(ic: &IngressController) -> Option<&AccessLogging> {
    ic.spec.logging.as_ref().and_then(|l| l.access.as_ref())
}

/// Returns `true` when access logs go to an rsyslog sidecar container.
#[must_use]
pub fn logs_to_container(ic: &IngressController) -> bool {
    access_logging(ic)
        .is_some_and(|a| a.destination.r#type == LoggingDestinationType::Container)
}

// ============================================================================
// Labels and ownership
// ============================================================================

/// Labels carried by every operand resource.
///
/// The owning label is how a watched child is mapped back to its `IngressController`.
#[must_use]
pub fn build_owning_labels(ic: &IngressController) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(K8S_NAME.into(), APP_NAME_ROUTER.into());
    labels.insert(K8S_COMPONENT.into(), COMPONENT_ROUTER.into());
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_INGRESS_OPERATOR.into());
    labels.insert(OWNING_INGRESS_CONTROLLER_LABEL.into(), ic.name_any());
    labels
}

/// Labels selecting the router pods of one `IngressController`.
#[must_use]
pub fn build_pod_selector_labels(ic: &IngressController) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(DEPLOYMENT_POD_LABEL.into(), ic.name_any());
    labels
}

/// String form of the router pod selector, as reported in status.
#[must_use]
pub fn pod_selector_string(ic: &IngressController) -> String {
    build_pod_selector_labels(ic)
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Owner reference pointing at the router `Deployment`.
///
/// Operand resources hang off the deployment so they are garbage-collected with it.
#[must_use]
pub fn build_deployment_owner_reference(deployment: &Deployment) -> OwnerReference {
    OwnerReference {
        api_version: APPS_API_GROUP_VERSION.to_string(),
        kind: KIND_DEPLOYMENT.to_string(),
        name: deployment.name_any(),
        uid: deployment.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: None,
    }
}

/// Owner reference pointing at the `IngressController` itself.
#[must_use]
pub fn build_ingress_controller_owner_reference(ic: &IngressController) -> OwnerReference {
    OwnerReference {
        api_version: OPERATOR_API_GROUP_VERSION.to_string(),
        kind: KIND_INGRESS_CONTROLLER.to_string(),
        name: ic.name_any(),
        uid: ic.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

fn operand_metadata(
    key: &ObjectKey,
    ic: &IngressController,
    owner: Option<&OwnerReference>,
) -> ObjectMeta {
    ObjectMeta {
        name: Some(key.name.clone()),
        namespace: Some(key.namespace.clone()),
        labels: Some(build_owning_labels(ic)),
        owner_references: owner.map(|o| vec![o.clone()]),
        ..Default::default()
    }
}

// ============================================================================
// Deployment
// ============================================================================

/// Builds the router `Deployment` for an admitted `IngressController`.
///
/// The deployment lives in the operand namespace, so it carries the owning
/// label instead of an owner reference.
#[must_use]
pub fn build_router_deployment(
    ic: &IngressController,
    image: &str,
    operand_namespace: &str,
) -> Deployment {
    let key = router_deployment_key(ic, operand_namespace);
    let replicas = ic.spec.replicas.unwrap_or(DEFAULT_ROUTER_REPLICAS);
    let host_network = effective_strategy(ic)
        .is_some_and(|s| s.r#type == EndpointPublishingStrategyType::HostNetwork);

    debug!(
        name = %key.name,
        namespace = %key.namespace,
        replicas,
        host_network,
        "Building router Deployment"
    );

    let selector = build_pod_selector_labels(ic);
    let mut pod_labels = build_owning_labels(ic);
    pod_labels.extend(selector.clone());

    Deployment {
        metadata: operand_metadata(&key, ic, None),
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    ..Default::default()
                }),
                spec: Some(build_router_pod_spec(ic, image, operand_namespace, host_network)),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.into(),
        value: Some(value.into()),
        ..Default::default()
    }
}

fn build_router_env(ic: &IngressController, operand_namespace: &str) -> Vec<EnvVar> {
    let mut vars = vec![
        env("ROUTER_SERVICE_NAME", ic.name_any()),
        env("ROUTER_SERVICE_NAMESPACE", operand_namespace),
        env("STATS_PORT", ROUTER_METRICS_PORT.to_string()),
        env("ROUTER_METRICS_TYPE", "haproxy"),
        env(
            "ROUTER_METRICS_TLS_CERT_FILE",
            format!("{METRICS_CERTS_MOUNT_PATH}/tls.crt"),
        ),
        env(
            "ROUTER_METRICS_TLS_KEY_FILE",
            format!("{METRICS_CERTS_MOUNT_PATH}/tls.key"),
        ),
    ];

    if let Some(domain) = effective_domain(ic) {
        vars.push(env(
            "ROUTER_CANONICAL_HOSTNAME",
            format!("router-{}.{domain}", ic.name_any()),
        ));
    }

    if let Some(access) = access_logging(ic) {
        match access.destination.r#type {
            LoggingDestinationType::Container => {
                vars.push(env(
                    "ROUTER_SYSLOG_ADDRESS",
                    format!("{RSYSLOG_SOCKET_MOUNT_PATH}/rsyslog.sock"),
                ));
            }
            LoggingDestinationType::Syslog => {
                if let Some(syslog) = access.destination.syslog.as_ref() {
                    vars.push(env(
                        "ROUTER_SYSLOG_ADDRESS",
                        format!("{}:{}", syslog.address, syslog.port),
                    ));
                    vars.push(env(
                        "ROUTER_LOG_FACILITY",
                        syslog
                            .facility
                            .clone()
                            .unwrap_or_else(|| DEFAULT_SYSLOG_FACILITY.to_string()),
                    ));
                }
            }
        }
        if let Some(format) = access.http_log_format.as_ref() {
            vars.push(env("ROUTER_SYSLOG_FORMAT", format.clone()));
        }
    }

    vars
}

fn health_probe(path: &str) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.into()),
            port: IntOrString::Int(ROUTER_METRICS_PORT),
            ..Default::default()
        }),
        initial_delay_seconds: Some(10),
        period_seconds: Some(10),
        ..Default::default()
    }
}

fn build_router_pod_spec(
    ic: &IngressController,
    image: &str,
    operand_namespace: &str,
    host_network: bool,
) -> PodSpec {
    let mut volume_mounts = vec![VolumeMount {
        name: VOLUME_METRICS_CERTS.into(),
        mount_path: METRICS_CERTS_MOUNT_PATH.into(),
        read_only: Some(true),
        ..Default::default()
    }];
    let mut volumes = vec![Volume {
        name: VOLUME_METRICS_CERTS.into(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(metrics_certs_secret_name(ic)),
            ..Default::default()
        }),
        ..Default::default()
    }];

    let to_container = logs_to_container(ic);
    if to_container {
        volume_mounts.push(VolumeMount {
            name: VOLUME_RSYSLOG_SOCKET.into(),
            mount_path: RSYSLOG_SOCKET_MOUNT_PATH.into(),
            ..Default::default()
        });
        volumes.push(Volume {
            name: VOLUME_RSYSLOG_SOCKET.into(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        });
        volumes.push(Volume {
            name: VOLUME_RSYSLOG_CONFIG.into(),
            config_map: Some(ConfigMapVolumeSource {
                name: rsyslog_configmap_key(ic, operand_namespace).name,
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    let router = Container {
        name: ROUTER_CONTAINER_NAME.into(),
        image: Some(image.into()),
        image_pull_policy: Some("IfNotPresent".into()),
        env: Some(build_router_env(ic, operand_namespace)),
        ports: Some(vec![
            ContainerPort {
                name: Some("http".into()),
                container_port: ROUTER_HTTP_PORT,
                protocol: Some("TCP".into()),
                ..Default::default()
            },
            ContainerPort {
                name: Some("https".into()),
                container_port: ROUTER_HTTPS_PORT,
                protocol: Some("TCP".into()),
                ..Default::default()
            },
            ContainerPort {
                name: Some("metrics".into()),
                container_port: ROUTER_METRICS_PORT,
                protocol: Some("TCP".into()),
                ..Default::default()
            },
        ]),
        liveness_probe: Some(health_probe("/healthz")),
        readiness_probe: Some(health_probe("/healthz/ready")),
        volume_mounts: Some(volume_mounts),
        ..Default::default()
    };

    let mut containers = vec![router];
    if to_container {
        containers.push(Container {
            name: SYSLOG_CONTAINER_NAME.into(),
            image: Some(image.into()),
            image_pull_policy: Some("IfNotPresent".into()),
            command: Some(vec![
                "/sbin/rsyslogd".into(),
                "-n".into(),
                "-i".into(),
                "/tmp/rsyslog.pid".into(),
                "-f".into(),
                format!("{RSYSLOG_CONFIG_MOUNT_PATH}/{RSYSLOG_CONF_KEY}"),
            ]),
            volume_mounts: Some(vec![
                VolumeMount {
                    name: VOLUME_RSYSLOG_CONFIG.into(),
                    mount_path: RSYSLOG_CONFIG_MOUNT_PATH.into(),
                    ..Default::default()
                },
                VolumeMount {
                    name: VOLUME_RSYSLOG_SOCKET.into(),
                    mount_path: RSYSLOG_SOCKET_MOUNT_PATH.into(),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        });
    }

    PodSpec {
        containers,
        volumes: Some(volumes),
        service_account_name: Some(ROUTER_SERVICE_ACCOUNT.into()),
        host_network: host_network.then_some(true),
        dns_policy: host_network.then(|| "ClusterFirstWithHostNet".to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Services
// ============================================================================

/// Internal load balancer annotation for a platform, if the platform has one.
#[must_use]
pub fn internal_load_balancer_annotation(
    platform: Option<PlatformType>,
) -> Option<(&'static str, &'static str)> {
    match platform? {
        PlatformType::AWS => Some((AWS_INTERNAL_LB_ANNOTATION, "0.0.0.0/0")),
        PlatformType::Azure => Some((AZURE_INTERNAL_LB_ANNOTATION, "true")),
        PlatformType::GCP => Some((GCP_INTERNAL_LB_ANNOTATION, "Internal")),
        _ => None,
    }
}

fn http_service_ports() -> Vec<ServicePort> {
    vec![
        ServicePort {
            name: Some("http".into()),
            port: ROUTER_HTTP_PORT,
            target_port: Some(IntOrString::String("http".into())),
            protocol: Some("TCP".into()),
            ..Default::default()
        },
        ServicePort {
            name: Some("https".into()),
            port: ROUTER_HTTPS_PORT,
            target_port: Some(IntOrString::String("https".into())),
            protocol: Some("TCP".into()),
            ..Default::default()
        },
    ]
}

/// Builds the `LoadBalancer` `Service` publishing the router.
///
/// Internal scope adds the platform's internal load balancer annotation.
/// AWS load balancers additionally get the proxy protocol enabled.
#[must_use]
pub fn build_load_balancer_service(
    ic: &IngressController,
    deployment_ref: &OwnerReference,
    operand_namespace: &str,
    platform: Option<PlatformType>,
) -> Service {
    let key = load_balancer_service_key(ic, operand_namespace);
    let mut metadata = operand_metadata(&key, ic, Some(deployment_ref));

    let mut annotations = BTreeMap::new();
    let internal = effective_strategy(ic)
        .and_then(|s| s.load_balancer.as_ref())
        .is_some_and(|lb| lb.scope == LoadBalancerScope::Internal);
    if internal {
        if let Some((key, value)) = internal_load_balancer_annotation(platform) {
            annotations.insert(key.to_string(), value.to_string());
        }
    }
    if platform == Some(PlatformType::AWS) {
        annotations.insert(AWS_LB_PROXY_PROTOCOL_ANNOTATION.to_string(), "*".to_string());
    }
    if !annotations.is_empty() {
        metadata.annotations = Some(annotations);
    }

    Service {
        metadata,
        spec: Some(ServiceSpec {
            type_: Some("LoadBalancer".into()),
            external_traffic_policy: Some("Local".into()),
            selector: Some(build_pod_selector_labels(ic)),
            ports: Some(http_service_ports()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds the `ClusterIP` `Service` exposing router traffic and metrics inside the cluster.
#[must_use]
pub fn build_internal_service(
    ic: &IngressController,
    deployment_ref: &OwnerReference,
    operand_namespace: &str,
) -> Service {
    let key = internal_service_key(ic, operand_namespace);
    let mut metadata = operand_metadata(&key, ic, Some(deployment_ref));
    metadata.annotations = Some(BTreeMap::from([(
        SERVING_CERT_SECRET_ANNOTATION.to_string(),
        metrics_certs_secret_name(ic),
    )]));

    let mut ports = http_service_ports();
    ports.push(ServicePort {
        name: Some("metrics".into()),
        port: ROUTER_METRICS_PORT,
        target_port: Some(IntOrString::String("metrics".into())),
        protocol: Some("TCP".into()),
        ..Default::default()
    });

    Service {
        metadata,
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".into()),
            selector: Some(build_pod_selector_labels(ic)),
            ports: Some(ports),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// First ingress point of a load balancer service: `(target, record type)`.
///
/// A hostname yields a CNAME record, an IP an A record.
#[must_use]
pub fn load_balancer_target(service: &Service) -> Option<(String, DNSRecordType)> {
    let ingress = service
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .and_then(|i| i.first())?;

    if let Some(hostname) = ingress.hostname.as_ref().filter(|h| !h.is_empty()) {
        return Some((hostname.clone(), DNSRecordType::CNAME));
    }
    ingress
        .ip
        .as_ref()
        .filter(|ip| !ip.is_empty())
        .map(|ip| (ip.clone(), DNSRecordType::A))
}

// ============================================================================
// DNSRecord
// ============================================================================

/// Builds the wildcard `DNSRecord` (`*.<domain>.`) for a load balancer service.
///
/// Returns `None` until the load balancer has an ingress point or when the
/// `IngressController` has no effective domain.
#[must_use]
pub fn build_wildcard_dns_record(
    ic: &IngressController,
    lb_service: &Service,
) -> Option<DNSRecord> {
    let domain = effective_domain(ic)?;
    let (target, record_type) = load_balancer_target(lb_service)?;
    let key = wildcard_record_key(ic);

    let mut record = DNSRecord::new(
        &key.name,
        DNSRecordSpec {
            dns_name: format!("*.{domain}."),
            targets: vec![target],
            record_type,
            record_ttl: WILDCARD_RECORD_TTL_SECS,
        },
    );
    record.metadata = operand_metadata(
        &key,
        ic,
        Some(&build_ingress_controller_owner_reference(ic)),
    );
    Some(record)
}

// ============================================================================
// Auxiliary resources
// ============================================================================

/// Builds the `ServiceMonitor` that scrapes router metrics through the internal service.
#[must_use]
pub fn build_service_monitor(
    ic: &IngressController,
    internal_service: &Service,
    deployment_ref: &OwnerReference,
    operand_namespace: &str,
) -> ServiceMonitor {
    let key = service_monitor_key(ic, operand_namespace);
    let service_name = internal_service.name_any();

    let mut monitor = ServiceMonitor::new(
        &key.name,
        ServiceMonitorSpec {
            selector: LabelSelector {
                match_labels: internal_service.metadata.labels.clone(),
                ..Default::default()
            },
            namespace_selector: Some(NamespaceSelector {
                match_names: vec![operand_namespace.to_string()],
            }),
            endpoints: vec![MonitorEndpoint {
                port: "metrics".into(),
                scheme: Some("https".into()),
                interval: Some("30s".into()),
                bearer_token_file: Some(SERVICE_ACCOUNT_TOKEN_FILE.into()),
                tls_config: Some(EndpointTlsConfig {
                    ca_file: Some(SERVICE_CA_FILE.into()),
                    server_name: Some(format!("{service_name}.{operand_namespace}.svc")),
                }),
            }],
        },
    );
    monitor.metadata = operand_metadata(&key, ic, Some(deployment_ref));
    monitor
}

fn build_rsyslog_conf() -> String {
    format!(
        "$ModLoad imuxsock\n\
         $SystemLogSocketName {RSYSLOG_SOCKET_MOUNT_PATH}/rsyslog.sock\n\
         $ModLoad omstdout.so\n\
         *.* :omstdout:\n"
    )
}

/// Builds the rsyslog `ConfigMap` used by the access-log sidecar.
///
/// Returns `None` unless access logs go to a `Container` destination.
#[must_use]
pub fn build_rsyslog_configmap(
    ic: &IngressController,
    deployment_ref: &OwnerReference,
    operand_namespace: &str,
) -> Option<ConfigMap> {
    if !logs_to_container(ic) {
        return None;
    }
    let key = rsyslog_configmap_key(ic, operand_namespace);
    Some(ConfigMap {
        metadata: operand_metadata(&key, ic, Some(deployment_ref)),
        data: Some(BTreeMap::from([(
            RSYSLOG_CONF_KEY.to_string(),
            build_rsyslog_conf(),
        )])),
        ..Default::default()
    })
}

/// Builds the `PodDisruptionBudget` limiting voluntary disruption of router pods.
#[must_use]
pub fn build_pod_disruption_budget(
    ic: &IngressController,
    deployment_ref: &OwnerReference,
    operand_namespace: &str,
) -> PodDisruptionBudget {
    let key = pod_disruption_budget_key(ic, operand_namespace);
    PodDisruptionBudget {
        metadata: operand_metadata(&key, ic, Some(deployment_ref)),
        spec: Some(PodDisruptionBudgetSpec {
            selector: Some(LabelSelector {
                match_labels: Some(build_pod_selector_labels(ic)),
                ..Default::default()
            }),
            max_unavailable: Some(IntOrString::String(ROUTER_MAX_UNAVAILABLE.into())),
            ..Default::default()
        }),
        ..Default::default()
    }
}

// ============================================================================
// Drift detection
// ============================================================================

/// Returns `true` when every desired entry is present in `current` with the same value.
fn contains_all(
    current: Option<&BTreeMap<String, String>>,
    desired: Option<&BTreeMap<String, String>>,
) -> bool {
    let Some(desired) = desired else {
        return true;
    };
    let empty = BTreeMap::new();
    let current = current.unwrap_or(&empty);
    desired.iter().all(|(k, v)| current.get(k) == Some(v))
}

fn metadata_changed(current: &ObjectMeta, desired: &ObjectMeta) -> bool {
    if !contains_all(current.labels.as_ref(), desired.labels.as_ref())
        || !contains_all(current.annotations.as_ref(), desired.annotations.as_ref())
    {
        return true;
    }
    match desired.owner_references.as_ref() {
        None => false,
        Some(desired_refs) => desired_refs.iter().any(|d| {
            !current
                .owner_references
                .as_ref()
                .is_some_and(|refs| refs.iter().any(|c| c.uid == d.uid && c.kind == d.kind))
        }),
    }
}

fn container_changed(current: &Container, desired: &Container) -> bool {
    current.name != desired.name
        || current.image != desired.image
        || current.command != desired.command
        || current.env.clone().unwrap_or_default() != desired.env.clone().unwrap_or_default()
        || current.ports.clone().unwrap_or_default() != desired.ports.clone().unwrap_or_default()
        || current.volume_mounts.clone().unwrap_or_default()
            != desired.volume_mounts.clone().unwrap_or_default()
}

/// Returns `true` when the router deployment differs from its desired shape.
///
/// Only fields the operator manages are compared; server-defaulted fields are ignored.
#[must_use]
pub fn deployment_changed(current: &Deployment, desired: &Deployment) -> bool {
    if metadata_changed(&current.metadata, &desired.metadata) {
        return true;
    }
    let (Some(cur), Some(des)) = (current.spec.as_ref(), desired.spec.as_ref()) else {
        return current.spec.is_some() != desired.spec.is_some();
    };
    if cur.replicas != des.replicas || cur.selector != des.selector {
        return true;
    }

    let cur_labels = cur.template.metadata.as_ref().and_then(|m| m.labels.as_ref());
    let des_labels = des.template.metadata.as_ref().and_then(|m| m.labels.as_ref());
    if !contains_all(cur_labels, des_labels) {
        return true;
    }

    let (Some(cur_pod), Some(des_pod)) = (cur.template.spec.as_ref(), des.template.spec.as_ref())
    else {
        return cur.template.spec.is_some() != des.template.spec.is_some();
    };
    if cur_pod.host_network.unwrap_or(false) != des_pod.host_network.unwrap_or(false)
        || cur_pod.service_account_name != des_pod.service_account_name
        || cur_pod.containers.len() != des_pod.containers.len()
    {
        return true;
    }
    let volume_names = |p: &PodSpec| -> Vec<String> {
        p.volumes
            .as_ref()
            .map(|v| v.iter().map(|v| v.name.clone()).collect())
            .unwrap_or_default()
    };
    if volume_names(cur_pod) != volume_names(des_pod) {
        return true;
    }
    cur_pod
        .containers
        .iter()
        .zip(des_pod.containers.iter())
        .any(|(c, d)| container_changed(c, d))
}

fn service_ports_changed(current: &ServiceSpec, desired: &ServiceSpec) -> bool {
    let key = |p: &ServicePort| (p.name.clone(), p.port, p.target_port.clone(), p.protocol.clone());
    let cur: Vec<_> = current.ports.iter().flatten().map(key).collect();
    let des: Vec<_> = desired.ports.iter().flatten().map(key).collect();
    cur != des
}

/// Returns `true` when a managed `Service` differs from its desired shape.
#[must_use]
pub fn service_changed(current: &Service, desired: &Service) -> bool {
    if metadata_changed(&current.metadata, &desired.metadata) {
        return true;
    }
    let (Some(cur), Some(des)) = (current.spec.as_ref(), desired.spec.as_ref()) else {
        return current.spec.is_some() != desired.spec.is_some();
    };
    cur.type_ != des.type_
        || cur.selector != des.selector
        || (des.external_traffic_policy.is_some()
            && cur.external_traffic_policy != des.external_traffic_policy)
        || service_ports_changed(cur, des)
}

#[must_use]
pub fn dns_record_changed(current: &DNSRecord, desired: &DNSRecord) -> bool {
    metadata_changed(&current.metadata, &desired.metadata) || current.spec != desired.spec
}

#[must_use]
pub fn service_monitor_changed(current: &ServiceMonitor, desired: &ServiceMonitor) -> bool {
    metadata_changed(&current.metadata, &desired.metadata) || current.spec != desired.spec
}

#[must_use]
pub fn configmap_changed(current: &ConfigMap, desired: &ConfigMap) -> bool {
    metadata_changed(&current.metadata, &desired.metadata) || current.data != desired.data
}

#[must_use]
pub fn pod_disruption_budget_changed(
    current: &PodDisruptionBudget,
    desired: &PodDisruptionBudget,
) -> bool {
    if metadata_changed(&current.metadata, &desired.metadata) {
        return true;
    }
    let selector = |p: &PodDisruptionBudget| p.spec.as_ref().and_then(|s| s.selector.clone());
    let max_unavailable =
        |p: &PodDisruptionBudget| p.spec.as_ref().and_then(|s| s.max_unavailable.clone());
    selector(current) != selector(desired) || max_unavailable(current) != max_unavailable(desired)
}

/// Returns `true` when `current` has drifted from `desired`.
///
/// Variants that do not match are always reported as changed.
#[must_use]
pub fn owned_changed(current: &OwnedResource, desired: &OwnedResource) -> bool {
    match (current, desired) {
        (OwnedResource::Workload(c), OwnedResource::Workload(d)) => deployment_changed(c, d),
        (OwnedResource::LoadBalancerService(c), OwnedResource::LoadBalancerService(d))
        | (OwnedResource::InternalService(c), OwnedResource::InternalService(d)) => {
            service_changed(c, d)
        }
        (OwnedResource::DnsRecord(c), OwnedResource::DnsRecord(d)) => dns_record_changed(c, d),
        (OwnedResource::MetricsMonitor(c), OwnedResource::MetricsMonitor(d)) => {
            service_monitor_changed(c, d)
        }
        (OwnedResource::LoggingConfig(c), OwnedResource::LoggingConfig(d)) => {
            configmap_changed(c, d)
        }
        (OwnedResource::DisruptionBudget(c), OwnedResource::DisruptionBudget(d)) => {
            pod_disruption_budget_changed(c, d)
        }
        _ => true,
    }
}

/// Keep references other controllers added; desired references win by uid.
fn merge_owner_references(
    current: Option<&Vec<OwnerReference>>,
    desired: Option<Vec<OwnerReference>>,
) -> Option<Vec<OwnerReference>> {
    let desired = desired.unwrap_or_default();
    let mut merged: Vec<OwnerReference> = current
        .into_iter()
        .flatten()
        .filter(|c| !desired.iter().any(|d| d.uid == c.uid))
        .cloned()
        .collect();
    merged.extend(desired);
    (!merged.is_empty()).then_some(merged)
}

/// Merge the desired shape onto the current object for an in-place update.
///
/// Identity (`uid`, `resourceVersion`), finalizers and foreign owner
/// references, and fields assigned by the API server (service cluster IPs and
/// node ports, status) are kept from `current`.
#[must_use]
pub fn merge_for_update(current: &OwnedResource, desired: OwnedResource) -> OwnedResource {
    let mut merged = desired;
    {
        let cur_meta = current.meta();
        let meta = merged.meta_mut();
        meta.uid.clone_from(&cur_meta.uid);
        meta.resource_version.clone_from(&cur_meta.resource_version);
        meta.creation_timestamp.clone_from(&cur_meta.creation_timestamp);
        meta.finalizers.clone_from(&cur_meta.finalizers);
        meta.owner_references = merge_owner_references(
            cur_meta.owner_references.as_ref(),
            meta.owner_references.take(),
        );

        let mut labels = cur_meta.labels.clone().unwrap_or_default();
        labels.extend(meta.labels.take().unwrap_or_default());
        meta.labels = Some(labels);

        if cur_meta.annotations.is_some() || meta.annotations.is_some() {
            let mut annotations = cur_meta.annotations.clone().unwrap_or_default();
            annotations.extend(meta.annotations.take().unwrap_or_default());
            meta.annotations = Some(annotations);
        }
    }

    match (current, &mut merged) {
        (OwnedResource::LoadBalancerService(c), OwnedResource::LoadBalancerService(d))
        | (OwnedResource::InternalService(c), OwnedResource::InternalService(d)) => {
            if let (Some(cur), Some(des)) = (c.spec.as_ref(), d.spec.as_mut()) {
                des.cluster_ip.clone_from(&cur.cluster_ip);
                des.cluster_ips.clone_from(&cur.cluster_ips);
                des.health_check_node_port = cur.health_check_node_port;
                if let Some(ports) = des.ports.as_mut() {
                    for port in ports.iter_mut() {
                        port.node_port = cur
                            .ports
                            .iter()
                            .flatten()
                            .find(|p| p.name == port.name)
                            .and_then(|p| p.node_port);
                    }
                }
            }
            d.status.clone_from(&c.status);
        }
        (OwnedResource::Workload(c), OwnedResource::Workload(d)) => {
            d.status.clone_from(&c.status);
        }
        (OwnedResource::DnsRecord(c), OwnedResource::DnsRecord(d)) => {
            d.status.clone_from(&c.status);
        }
        _ => {}
    }
    merged
}

#[cfg(test)]
#[path = "ingress_resources_tests.rs"]
mod ingress_resources_tests;
