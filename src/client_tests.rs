// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `client.rs`

#[cfg(test)]
mod tests {
    use crate::client::{ObjectKey, OwnedKind, OwnedResource};
    use crate::crd::{IngressController, IngressControllerSpec};
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::{ConfigMap, Service};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeSet;

    fn meta(namespace: &str, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_object_key_display() {
        let key = ObjectKey::new("openshift-ingress", "router-default");
        assert_eq!(key.to_string(), "openshift-ingress/router-default");
    }

    #[test]
    fn test_object_key_of_resource() {
        let mut ic = IngressController::new("default", IngressControllerSpec::default());
        ic.metadata.namespace = Some("openshift-ingress-operator".to_string());

        assert_eq!(
            ObjectKey::of(&ic),
            ObjectKey::new("openshift-ingress-operator", "default")
        );
    }

    #[test]
    fn test_owned_kind_labels_are_unique() {
        let labels: BTreeSet<&str> = OwnedKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(labels.len(), OwnedKind::ALL.len());
        assert_eq!(OwnedKind::Workload.to_string(), "deployment");
        assert_eq!(OwnedKind::DnsRecord.to_string(), "dnsrecord");
    }

    #[test]
    fn test_owned_resource_kind_and_key() {
        let svc = Service {
            metadata: meta("openshift-ingress", "router-internal-default"),
            ..Default::default()
        };
        let resource = OwnedResource::InternalService(svc);

        assert_eq!(resource.kind(), OwnedKind::InternalService);
        assert_eq!(
            resource.key(),
            ObjectKey::new("openshift-ingress", "router-internal-default")
        );
    }

    #[test]
    fn test_owned_resource_key_defaults_to_empty() {
        let resource = OwnedResource::LoggingConfig(ConfigMap::default());
        assert_eq!(resource.key(), ObjectKey::new("", ""));
    }

    #[test]
    fn test_owned_resource_meta_mut() {
        let mut resource = OwnedResource::Workload(Deployment::default());
        resource.meta_mut().uid = Some("uid-1".to_string());
        assert_eq!(resource.meta().uid.as_deref(), Some("uid-1"));
    }

    #[test]
    fn test_into_accessors_match_variant() {
        let deployment = OwnedResource::Workload(Deployment {
            metadata: meta("openshift-ingress", "router-default"),
            ..Default::default()
        });
        assert!(deployment.clone().into_service().is_none());
        assert!(deployment.into_deployment().is_some());

        let lb = OwnedResource::LoadBalancerService(Service::default());
        assert!(lb.clone().into_service().is_some());
        assert!(lb.into_dns_record().is_none());

        let cm = OwnedResource::LoggingConfig(ConfigMap::default());
        assert!(cm.clone().into_pod_disruption_budget().is_none());
        assert!(cm.into_config_map().is_some());
    }
}
