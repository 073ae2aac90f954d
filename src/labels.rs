// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label, annotation and finalizer constants.
//!
//! Labels on operand resources are how a child names its parent `IngressController`:
//! the router deployment lives in a different namespace from its owner, so an owner
//! reference is not possible and the owning label is the only link.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of the application
pub const K8S_NAME: &str = "app.kubernetes.io/name";

// ============================================================================
// Label Values
// ============================================================================

/// Application name for router pods
pub const APP_NAME_ROUTER: &str = "router";

/// Component value for router resources
pub const COMPONENT_ROUTER: &str = "router";

/// Value for `app.kubernetes.io/managed-by`
pub const MANAGED_BY_INGRESS_OPERATOR: &str = "ingress-operator";

// ============================================================================
// Ingress Operator Labels
// ============================================================================

/// Label naming the `IngressController` that owns an operand resource
pub const OWNING_INGRESS_CONTROLLER_LABEL: &str =
    "ingresscontroller.operator.openshift.io/owning-ingresscontroller";

/// Label selecting the router pods of one `IngressController` deployment
pub const DEPLOYMENT_POD_LABEL: &str =
    "ingresscontroller.operator.openshift.io/deployment-ingresscontroller";

// ============================================================================
// Annotations
// ============================================================================

/// Annotation asking the service CA operator to mint a serving certificate secret
pub const SERVING_CERT_SECRET_ANNOTATION: &str =
    "service.alpha.openshift.io/serving-cert-secret-name";

/// Annotation making an AWS load balancer internal-only
pub const AWS_INTERNAL_LB_ANNOTATION: &str =
    "service.beta.kubernetes.io/aws-load-balancer-internal";

/// Annotation making an Azure load balancer internal-only
pub const AZURE_INTERNAL_LB_ANNOTATION: &str =
    "service.beta.kubernetes.io/azure-load-balancer-internal";

/// Annotation making a GCP load balancer internal-only
pub const GCP_INTERNAL_LB_ANNOTATION: &str = "cloud.google.com/load-balancer-type";

/// Annotation selecting the proxy protocol on AWS load balancers
pub const AWS_LB_PROXY_PROTOCOL_ANNOTATION: &str =
    "service.beta.kubernetes.io/aws-load-balancer-proxy-protocol";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer that blocks deletion of an `IngressController` until its operand is torn down
pub const FINALIZER_INGRESS_CONTROLLER: &str =
    "ingresscontroller.operator.openshift.io/finalizer-ingresscontroller";
