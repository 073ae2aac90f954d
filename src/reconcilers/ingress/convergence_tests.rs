// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `convergence.rs`

#[cfg(test)]
mod tests {
    use crate::client::{ObjectKey, OwnedKind, OwnedResource};
    use crate::config::OperatorConfig;
    use crate::constants::{DEFAULT_OPERAND_NAMESPACE, DEFAULT_OPERATOR_NAMESPACE};
    use crate::crd::{
        AccessLogging, DNSRecordType, IngressController, IngressControllerLogging,
        LoggingDestination, LoggingDestinationType, PlatformType,
    };
    use crate::ingress_resources::{
        build_deployment_owner_reference, build_load_balancer_service, build_rsyslog_configmap,
        build_router_deployment, internal_service_key, load_balancer_service_key,
        pod_disruption_budget_key, router_deployment_key, rsyslog_configmap_key,
        service_monitor_key, wildcard_record_key,
    };
    use crate::labels::FINALIZER_INGRESS_CONTROLLER;
    use crate::reconcilers::finalizers::has_finalizer;
    use crate::reconcilers::ingress::admission::admit;
    use crate::reconcilers::ingress::convergence::ensure_ingress_controller;
    use crate::reconcilers::ingress::ClusterSettings;
    use crate::reconcilers::status::find_condition;
    use crate::status_reasons::{CONDITION_TYPE_AVAILABLE, CONDITION_TYPE_LOAD_BALANCER_READY};
    use crate::testing::{
        dns_config, infrastructure, ingress_config, ingress_controller, FakeClusterClient,
    };

    const IMAGE: &str = "quay.io/openshift/router:test";
    const NS: &str = DEFAULT_OPERAND_NAMESPACE;

    fn settings(platform: Option<PlatformType>) -> ClusterSettings {
        ClusterSettings {
            dns: dns_config(true),
            infrastructure: infrastructure(platform),
            ingress: ingress_config("apps.example.com"),
        }
    }

    /// Insert and admit an `IngressController`, returning the stored object.
    async fn admitted(
        client: &FakeClusterClient,
        ic: IngressController,
        platform: Option<PlatformType>,
    ) -> IngressController {
        let ic = client.insert_ingress_controller(ic);
        let s = settings(platform);
        admit(
            client,
            DEFAULT_OPERATOR_NAMESPACE,
            &ic,
            &s.ingress,
            &s.infrastructure,
        )
        .await
        .unwrap()
    }

    async fn admitted_default(
        client: &FakeClusterClient,
        platform: Option<PlatformType>,
    ) -> IngressController {
        admitted(client, ingress_controller("default", None), platform).await
    }

    async fn converge(
        client: &FakeClusterClient,
        key: &ObjectKey,
        platform: Option<PlatformType>,
    ) -> Result<(), Vec<String>> {
        let ic = client.ingress_controller(key).unwrap();
        ensure_ingress_controller(
            client,
            &OperatorConfig::with_image(IMAGE),
            &ic,
            &settings(platform),
        )
        .await
        .map_err(|e| e.messages())
    }

    fn container_logging(mut ic: IngressController) -> IngressController {
        ic.spec.logging = Some(IngressControllerLogging {
            access: Some(AccessLogging {
                destination: LoggingDestination {
                    r#type: LoggingDestinationType::Container,
                    syslog: None,
                },
                http_log_format: None,
            }),
        });
        ic
    }

    #[tokio::test]
    async fn test_converges_load_balancer_controller() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::AWS)).await;
        let key = ObjectKey::of(&ic);

        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();

        let stored = client.ingress_controller(&key).unwrap();
        assert!(has_finalizer(&stored, FINALIZER_INGRESS_CONTROLLER));
        assert!(client
            .owned(OwnedKind::Workload, &router_deployment_key(&ic, NS))
            .is_some());
        assert!(client
            .owned(OwnedKind::LoadBalancerService, &load_balancer_service_key(&ic, NS))
            .is_some());
        assert!(client
            .owned(OwnedKind::InternalService, &internal_service_key(&ic, NS))
            .is_some());
        assert!(client
            .owned(OwnedKind::MetricsMonitor, &service_monitor_key(&ic, NS))
            .is_some());
        assert!(client
            .owned(OwnedKind::DisruptionBudget, &pod_disruption_budget_key(&ic, NS))
            .is_some());
        // No ingress point on the load balancer yet.
        assert!(client
            .owned(OwnedKind::DnsRecord, &wildcard_record_key(&ic))
            .is_none());
        assert!(client
            .owned(OwnedKind::LoggingConfig, &rsyslog_configmap_key(&ic, NS))
            .is_none());

        let conditions = &stored.status.as_ref().unwrap().conditions;
        assert_eq!(
            find_condition(conditions, CONDITION_TYPE_LOAD_BALANCER_READY)
                .unwrap()
                .reason
                .as_deref(),
            Some("LoadBalancerPending")
        );
    }

    #[tokio::test]
    async fn test_wildcard_record_follows_load_balancer_hostname() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::AWS)).await;
        let key = ObjectKey::of(&ic);
        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();

        client.set_load_balancer_ingress(
            &load_balancer_service_key(&ic, NS),
            Some("lb.example.net"),
            None,
        );
        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();

        let record = client
            .owned(OwnedKind::DnsRecord, &wildcard_record_key(&ic))
            .and_then(OwnedResource::into_dns_record)
            .unwrap();
        assert_eq!(record.spec.dns_name, "*.apps.example.com.");
        assert_eq!(record.spec.record_type, DNSRecordType::CNAME);
        assert_eq!(record.spec.targets, vec!["lb.example.net".to_string()]);
    }

    #[tokio::test]
    async fn test_wildcard_record_follows_load_balancer_ip() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::GCP)).await;
        let key = ObjectKey::of(&ic);
        converge(&client, &key, Some(PlatformType::GCP)).await.unwrap();

        client.set_load_balancer_ingress(
            &load_balancer_service_key(&ic, NS),
            None,
            Some("192.0.2.10"),
        );
        converge(&client, &key, Some(PlatformType::GCP)).await.unwrap();

        let record = client
            .owned(OwnedKind::DnsRecord, &wildcard_record_key(&ic))
            .and_then(OwnedResource::into_dns_record)
            .unwrap();
        assert_eq!(record.spec.record_type, DNSRecordType::A);
        assert_eq!(record.spec.targets, vec!["192.0.2.10".to_string()]);
    }

    #[tokio::test]
    async fn test_converged_controller_is_not_rewritten() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::AWS)).await;
        let key = ObjectKey::of(&ic);
        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();
        client.set_load_balancer_ingress(
            &load_balancer_service_key(&ic, NS),
            Some("lb.example.net"),
            None,
        );
        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();

        let writes = client.total_writes();
        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();

        assert_eq!(client.total_writes(), writes);
    }

    #[tokio::test]
    async fn test_sibling_failures_are_independent() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::AWS)).await;
        let key = ObjectKey::of(&ic);
        client.fail_writes(OwnedKind::LoadBalancerService);

        let errors = converge(&client, &key, Some(PlatformType::AWS))
            .await
            .unwrap_err();

        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].starts_with("failed to ensure load balancer service for default"));
        assert!(client
            .owned(OwnedKind::InternalService, &internal_service_key(&ic, NS))
            .is_some());
        assert!(client
            .owned(OwnedKind::DisruptionBudget, &pod_disruption_budget_key(&ic, NS))
            .is_some());
        assert!(client
            .owned(OwnedKind::DnsRecord, &wildcard_record_key(&ic))
            .is_none());
    }

    #[tokio::test]
    async fn test_deployment_failure_skips_dependents() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::AWS)).await;
        let key = ObjectKey::of(&ic);
        client.fail_writes(OwnedKind::Workload);

        let errors = converge(&client, &key, Some(PlatformType::AWS))
            .await
            .unwrap_err();

        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors[0].starts_with("failed to ensure deployment for default"));
        assert_eq!(
            errors[1..],
            [
                "failed to ensure load balancer service for default: router deployment is unavailable",
                "failed to ensure internal service for default: router deployment is unavailable",
                "failed to ensure poddisruptionbudget for default: router deployment is unavailable",
            ]
        );
        assert_eq!(client.owned_creates(), 0);

        // Status is still synced.
        let stored = client.ingress_controller(&key).unwrap();
        let available =
            find_condition(&stored.status.as_ref().unwrap().conditions, CONDITION_TYPE_AVAILABLE)
                .unwrap();
        assert_eq!(available.reason.as_deref(), Some("DeploymentNotFound"));
    }

    #[tokio::test]
    async fn test_finalizer_failure_aborts_pass() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::AWS)).await;
        let key = ObjectKey::of(&ic);
        client.fail_ingress_controller_updates();
        let status_writes = client.status_writes();

        let errors = converge(&client, &key, Some(PlatformType::AWS))
            .await
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("failed to update finalizers"));
        assert_eq!(client.owned_creates(), 0);
        assert_eq!(client.status_writes(), status_writes);
    }

    #[tokio::test]
    async fn test_status_sync_failure_joins_aggregate() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::AWS)).await;
        let key = ObjectKey::of(&ic);
        client.fail_status_updates();

        let errors = converge(&client, &key, Some(PlatformType::AWS))
            .await
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("failed to sync ingresscontroller status"));
        assert!(client
            .owned(OwnedKind::Workload, &router_deployment_key(&ic, NS))
            .is_some());
    }

    #[tokio::test]
    async fn test_host_network_removes_stale_load_balancer() {
        let client = FakeClusterClient::new();
        let ic = admitted(
            &client,
            ingress_controller("default", None),
            Some(PlatformType::Libvirt),
        )
        .await;
        let key = ObjectKey::of(&ic);

        let deployment = build_router_deployment(&ic, IMAGE, NS);
        let stored = client.insert_owned(OwnedResource::Workload(deployment));
        let deployment_ref =
            build_deployment_owner_reference(&stored.into_deployment().unwrap());
        client.insert_owned(OwnedResource::LoadBalancerService(build_load_balancer_service(
            &ic,
            &deployment_ref,
            NS,
            Some(PlatformType::AWS),
        )));

        converge(&client, &key, Some(PlatformType::Libvirt))
            .await
            .unwrap();

        assert!(client
            .owned(OwnedKind::LoadBalancerService, &load_balancer_service_key(&ic, NS))
            .is_none());
        assert!(client
            .owned(OwnedKind::InternalService, &internal_service_key(&ic, NS))
            .is_some());
    }

    #[tokio::test]
    async fn test_rsyslog_configmap_follows_logging_destination() {
        let client = FakeClusterClient::new();
        let ic = admitted(
            &client,
            container_logging(ingress_controller("default", None)),
            Some(PlatformType::AWS),
        )
        .await;
        let key = ObjectKey::of(&ic);
        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();

        let cm_key = rsyslog_configmap_key(&ic, NS);
        assert!(client.owned(OwnedKind::LoggingConfig, &cm_key).is_some());

        let mut stored = client.ingress_controller(&key).unwrap();
        stored.spec.logging = None;
        client.insert_ingress_controller(stored);
        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();

        assert!(client.owned(OwnedKind::LoggingConfig, &cm_key).is_none());
    }

    #[tokio::test]
    async fn test_deployment_failure_reports_skipped_logging_config() {
        let client = FakeClusterClient::new();
        let ic = admitted(
            &client,
            container_logging(ingress_controller("default", None)),
            Some(PlatformType::Libvirt),
        )
        .await;
        let key = ObjectKey::of(&ic);
        client.fail_writes(OwnedKind::Workload);

        let errors = converge(&client, &key, Some(PlatformType::Libvirt))
            .await
            .unwrap_err();

        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e
            == "failed to ensure rsyslog configmap for default: router deployment is unavailable"));
        assert!(!errors.iter().any(|e| e.contains("load balancer service")));
    }

    #[tokio::test]
    async fn test_stale_configmap_is_removed_when_rsyslog_not_wanted() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::AWS)).await;
        let key = ObjectKey::of(&ic);

        let logging_ic = container_logging(ic.clone());
        let deployment = build_router_deployment(&ic, IMAGE, NS);
        let deployment_ref = build_deployment_owner_reference(&deployment);
        let cm = build_rsyslog_configmap(&logging_ic, &deployment_ref, NS).unwrap();
        client.insert_owned(OwnedResource::LoggingConfig(cm));

        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();

        assert!(client
            .owned(OwnedKind::LoggingConfig, &rsyslog_configmap_key(&ic, NS))
            .is_none());
    }

    #[tokio::test]
    async fn test_sync_load_balancer_failure_event_reaches_status() {
        let client = FakeClusterClient::new();
        let ic = admitted_default(&client, Some(PlatformType::AWS)).await;
        let key = ObjectKey::of(&ic);
        client.add_event(
            NS,
            "Service",
            "router-default",
            "Warning",
            "SyncLoadBalancerFailed",
            "quota exceeded",
            5,
        );

        converge(&client, &key, Some(PlatformType::AWS)).await.unwrap();

        let stored = client.ingress_controller(&key).unwrap();
        let ready = find_condition(
            &stored.status.as_ref().unwrap().conditions,
            CONDITION_TYPE_LOAD_BALANCER_READY,
        )
        .unwrap();
        assert_eq!(ready.reason.as_deref(), Some("SyncLoadBalancerFailed"));
        assert!(ready.message.as_deref().unwrap().ends_with("quota exceeded"));
    }
}
