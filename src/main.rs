// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{http::StatusCode, routing::get, Router};
use clap::Parser;
use futures::StreamExt;
use ingress_operator::{
    client::{KubeClusterClient, ObjectKey},
    config::OperatorConfig,
    constants::KIND_INGRESS_CONTROLLER,
    crd::{DNSRecord, IngressController},
    errors::ReconcileError,
    events::KubeEventRecorder,
    metrics,
    reconcilers::ingress::{IngressReconciler, ReconcileOutcome},
    watches::owning_ingress_controller,
};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service};
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("ingress-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Respects RUST_LOG (default INFO) and RUST_LOG_FORMAT=json|text
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    let config = OperatorConfig::parse();
    info!(
        namespace = %config.namespace,
        operand_namespace = %config.operand_namespace,
        image = %config.ingress_controller_image,
        "Starting ingress operator"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    // Controllers should never exit - if one fails, we log it and exit the main process
    tokio::select! {
        result = run_metrics_server(config.clone()) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
        result = run_ingress_controller(client, config) => {
            error!("CRITICAL: IngressController controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("IngressController controller exited unexpectedly without error")
        }
    }
}

/// Serve the Prometheus registry on `/metrics`.
async fn run_metrics_server(config: OperatorConfig) -> Result<()> {
    let app = Router::new().route("/metrics", get(serve_metrics));

    let listener = tokio::net::TcpListener::bind(config.metrics_addr).await?;
    info!("Metrics server listening on {}", config.metrics_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_metrics() -> (StatusCode, String) {
    match metrics::gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            warn!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Run the `IngressController` controller.
///
/// Besides the `IngressController`s themselves, the controller is triggered by
/// the wildcard `DNSRecord`s they own and by the router deployments and
/// services in the operand namespace, mapped back through their owning label.
async fn run_ingress_controller(client: Client, config: OperatorConfig) -> Result<()> {
    info!("Starting IngressController controller");

    let api = Api::<IngressController>::namespaced(client.clone(), &config.namespace);
    let records = Api::<DNSRecord>::namespaced(client.clone(), &config.namespace);
    let deployments = Api::<Deployment>::namespaced(client.clone(), &config.operand_namespace);
    let services = Api::<Service>::namespaced(client.clone(), &config.operand_namespace);

    let reconciler = Arc::new(IngressReconciler::new(
        Arc::new(KubeClusterClient::new(client.clone())),
        Arc::new(KubeEventRecorder::new(client)),
        config.clone(),
    ));

    let deployment_ns = config.namespace.clone();
    let service_ns = config.namespace.clone();

    Controller::new(api, Config::default())
        .owns(records, Config::default())
        .watches(deployments, Config::default(), move |deployment| {
            owning_ingress_controller(&deployment, &deployment_ns)
        })
        .watches(services, Config::default(), move |service| {
            owning_ingress_controller(&service, &service_ns)
        })
        .run(reconcile_wrapper, error_policy, reconciler)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `IngressController`
async fn reconcile_wrapper(
    ic: Arc<IngressController>,
    reconciler: Arc<IngressReconciler>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let key = ObjectKey::of(ic.as_ref());
    debug!(
        name = %ic.name_any(),
        namespace = ?ic.namespace(),
        "Reconcile wrapper called for IngressController"
    );

    let result = reconciler.reconcile(&key).await;
    let duration = start.elapsed();

    match result {
        Ok(ReconcileOutcome::Done) => {
            metrics::record_reconciliation_success(KIND_INGRESS_CONTROLLER, duration);
            Ok(Action::await_change())
        }
        Ok(ReconcileOutcome::RequeueImmediately) => {
            metrics::record_reconciliation_success(KIND_INGRESS_CONTROLLER, duration);
            metrics::record_reconciliation_requeue(KIND_INGRESS_CONTROLLER, "admitted");
            Ok(Action::requeue(Duration::ZERO))
        }
        Err(e) => {
            error!("Failed to reconcile IngressController {}: {}", key, e);
            metrics::record_reconciliation_error(KIND_INGRESS_CONTROLLER, duration);
            metrics::record_error(KIND_INGRESS_CONTROLLER, e.metric_label());
            Err(e)
        }
    }
}

/// Error policy for controller
fn error_policy(
    _ic: Arc<IngressController>,
    _err: &ReconcileError,
    reconciler: Arc<IngressReconciler>,
) -> Action {
    metrics::record_reconciliation_requeue(KIND_INGRESS_CONTROLLER, "error");
    Action::requeue(reconciler.config().error_requeue())
}
